// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/task.rs - 任务循环
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{thread, time::Duration};

use anyhow::Context;
use image::{RgbImage, RgbaImage};
use tracing::{error, info, warn};

use crate::{
  input::Upload,
  model::{Model, Prediction, SignFrame},
  output::Render,
  pipeline::SignContext,
  speech::SpeechSynthesizer,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 处理一次上传；失败时渲染提示与错误链，成功时渲染结果
///
/// 返回该次上传是否成功。输出失败也只算该次上传失败，不影响后续上传。
fn handle_upload<M, O>(upload: &Upload, model: &M, output: &O) -> bool
where
  M: Model<Input = Upload>,
  M::Error: std::error::Error + Send + Sync + 'static,
  O: Render<Upload, M::Output>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  let now = std::time::Instant::now();
  let error = match model
    .infer(upload)
    .with_context(|| format!("处理上传图像 {} 失败", upload.name))
  {
    Ok(result) => {
      info!("处理完成，耗时: {:.2?}", now.elapsed());
      match output.render_result(upload, &result) {
        Ok(()) => return true,
        Err(e) => {
          anyhow::Error::new(e).context(format!("输出上传图像 {} 的结果失败", upload.name))
        }
      }
    }
    Err(e) => e,
  };

  error!("{:?}", error);
  if let Err(e) = output.render_failure(upload, &error) {
    error!("无法输出失败信息: {}", e);
  }
  false
}

pub struct OneShotTask;

impl<I, M, O> Task<I, M, O> for OneShotTask
where
  I: Iterator<Item = Upload>,
  M: Model<Input = Upload>,
  M::Error: std::error::Error + Send + Sync + 'static,
  O: Render<Upload, M::Output>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let upload = input.next().ok_or_else(|| anyhow::anyhow!("没有上传图像"))?;
    info!("上传图像读取成功，开始处理...");
    if !handle_upload(&upload, &model, &output) {
      anyhow::bail!("上传图像 {} 处理失败", upload.name);
    }
    Ok(())
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<I, M, O> Task<I, M, O> for ContinuousTask
where
  I: Iterator<Item = Upload>,
  M: Model<Input = Upload>,
  M::Error: std::error::Error + Send + Sync + 'static,
  O: Render<Upload, M::Output>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
    .context("无法设置 Ctrl-C 处理函数")?;

    let mut upload_index = 0;
    let mut failed = 0;
    for upload in input {
      upload_index += 1;
      info!("处理第 {} 张上传图像: {}", upload_index, upload.name);
      if !handle_upload(&upload, &model, &output) {
        failed += 1;
      }
      if self.frame_number.is_some_and(|n| upload_index >= n) {
        info!("达到指定数量 {}, 退出任务循环", upload_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    if failed > 0 {
      warn!("共 {} 张上传图像，{} 张处理失败", upload_index, failed);
    }
    info!("任务完成，退出");
    Ok(())
  }
}

/// 对同一张上传图像重复分类，统计平均耗时
pub struct RepeatShotTask {
  repeat_times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    RepeatShotTask { repeat_times: 100 }
  }
}

impl RepeatShotTask {
  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times.max(3);
    self
  }
}

impl<I, C, B, S> Task<I, &SignContext<C, B, S>, ()> for RepeatShotTask
where
  I: Iterator<Item = Upload>,
  C: Model<Input = SignFrame, Output = Prediction>,
  C::Error: std::error::Error + Send + Sync + 'static,
  B: Model<Input = RgbImage, Output = RgbaImage>,
  B::Error: std::error::Error + Send + Sync + 'static,
  S: SpeechSynthesizer,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    context: &SignContext<C, B, S>,
    _output: (),
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    let upload = input.next().ok_or_else(|| anyhow::anyhow!("没有上传图像"))?;
    let image = image::load_from_memory(&upload.bytes)
      .with_context(|| format!("无法解码上传图像 {}", upload.name))?
      .to_rgb8();
    info!("上传图像读取成功，开始推理...");

    let mut times = Vec::with_capacity(self.repeat_times);
    for i in 0..self.repeat_times {
      let now = std::time::Instant::now();
      let classification = context.classify(&image)?;
      let elapsed = now.elapsed();
      info!(
        "({})推理完成: {} ({:.4}), 耗时: {:.2?}",
        i, classification.label, classification.prediction.confidence, elapsed
      );
      times.push(elapsed);
    }

    // 前两次包含会话预热
    warn!(
      "平均推理时间: {:.2?}",
      times.iter().skip(2).sum::<Duration>() / (times.len() - 2) as u32
    );

    Ok(())
  }
}
