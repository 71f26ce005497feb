// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 分类推理耗时测试
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use kaimozhi::{
  FromUrl,
  catalog::{ClassLabels, SignCatalog},
  input::InputWrapper,
  model::{BackgroundRemover, OnnxClassifierBuilder, SignClassifier},
  pipeline::SignContext,
  speech::{DEFAULT_TTS_ENDPOINT, GoogleTts},
  task::{RepeatShotTask, Task},
};

/// 对同一张上传图像重复执行背景去除与分类
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分类模型
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 背景分割模型
  #[arg(long, value_name = "MODEL")]
  pub background: Option<Url>,
  /// 类别标签文件
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,
  /// 上传来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 重复次数
  #[arg(long, default_value = "100", value_name = "COUNT")]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("分类模型: {}", args.model);
  info!("上传来源: {}", args.input);
  info!("重复次数: {}", args.repeat);

  let labels = ClassLabels::from_file(&args.labels)?;
  let catalog = SignCatalog::builtin(".")?;
  let classifier: SignClassifier = OnnxClassifierBuilder::from_url(&args.model)?
    .num_classes(labels.len())
    .build()?;
  let remover = BackgroundRemover::from_optional_url(args.background.as_ref())?;
  // 只测分类，不会请求语音服务
  let speech = GoogleTts::new(DEFAULT_TTS_ENDPOINT)?;

  let context = SignContext::new(classifier, remover, speech, labels, &catalog, "output.mp3");
  let input = InputWrapper::from_url(&args.input)?;

  RepeatShotTask::default()
    .with_repeat_times(args.repeat)
    .run_task(input, &context, ())?;

  Ok(())
}
