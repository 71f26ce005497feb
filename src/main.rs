// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use kaimozhi::{
  FromUrl,
  catalog::{ClassLabels, SignCatalog},
  input::InputWrapper,
  model::{BackgroundRemover, OnnxClassifierBuilder, SignClassifier},
  output::OutputSet,
  pipeline::SignContext,
  speech::GoogleTts,
  task::{ContinuousTask, OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("分类模型: {}", args.model);
  info!(
    "背景分割模型: {}",
    args
      .background
      .as_ref()
      .map(|url| url.to_string())
      .unwrap_or_else(|| "无".to_string())
  );
  info!("上传来源: {}", args.input);
  info!("音频文件: {}", args.audio.display());

  let labels = ClassLabels::from_file(&args.labels)?;
  info!("类别数量: {}", labels.len());

  let catalog = match &args.signs {
    Some(path) => SignCatalog::from_file(path)?,
    None => SignCatalog::builtin(&args.assets)?,
  };

  let classifier: SignClassifier = OnnxClassifierBuilder::from_url(&args.model)?
    .num_classes(labels.len())
    .build()?;
  let remover = BackgroundRemover::from_optional_url(args.background.as_ref())?;
  let speech = GoogleTts::new(args.speech_endpoint.as_str())?;

  let references = catalog.reference_index(args.placeholder.clone());
  let context = SignContext::new(
    classifier,
    remover,
    speech,
    labels,
    &catalog,
    args.audio.clone(),
  )
  .with_references(references);

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputSet::from_urls(&args.output)?;

  if args.continuous {
    ContinuousTask::default()
      .with_frame_number(args.frame_number)
      .run_task(input, context, output)?;
  } else {
    OneShotTask.run_task(input, context, output)?;
  }

  Ok(())
}
