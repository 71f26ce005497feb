// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/output/console.rs - 终端结果报告
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

use std::io::Write;

use crate::{
  input::Upload,
  output::{FAILURE_MESSAGE, Render},
  pipeline::Outcome,
};

/// 总是启用的终端输出
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOutput;

impl ConsoleOutput {
  pub fn report(upload: &Upload, outcome: &Outcome) -> String {
    let reference = if outcome.reference.is_placeholder() {
      format!("{} (占位图像)", outcome.reference.path().display())
    } else {
      outcome.reference.path().display().to_string()
    };
    let audio = match &outcome.audio {
      Some(clip) => format!("{} ({})", clip.path.display(), clip.voice),
      None => "无".to_string(),
    };

    format!(
      "上传图像: {}\n预测结果: {}\n翻译: {}\n参考图像: {}\n语音: {}\n",
      upload.name,
      outcome.prediction_json(),
      outcome.translation,
      reference,
      audio
    )
  }

  pub fn failure_report(upload: &Upload, error: &anyhow::Error) -> String {
    format!("{} ({})\n{:?}\n", FAILURE_MESSAGE, upload.name, error)
  }
}

impl Render<Upload, Outcome> for ConsoleOutput {
  type Error = std::io::Error;

  fn render_result(&self, upload: &Upload, outcome: &Outcome) -> Result<(), Self::Error> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", Self::report(upload, outcome))?;
    stdout.flush()
  }

  fn render_failure(&self, upload: &Upload, error: &anyhow::Error) -> Result<(), Self::Error> {
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{}", Self::failure_report(upload, error))?;
    stderr.flush()
  }
}
