// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/output/save_image_file.rs - 保存结果面板
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::Upload,
  output::{
    Render,
    draw::{Panel, PanelError},
  },
  pipeline::Outcome,
  url_file_path,
};

/// 每次上传覆盖写入同一个面板图像文件
///
/// `image:///tmp/panel.png?font=/usr/share/fonts/NotoSans.ttf`
pub struct SaveImageFileOutput {
  path: PathBuf,
  panel: Panel,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("面板字体错误: {0}")]
  PanelError(#[from] PanelError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let font = uri
      .query_pairs()
      .find(|(k, _)| k == "font")
      .map(|(_, v)| PathBuf::from(v.into_owned()));

    Ok(SaveImageFileOutput {
      path: url_file_path(uri),
      panel: Panel::load(font.as_deref())?,
    })
  }
}

impl SaveImageFileOutput {
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    warn!("保存图像到文件: {}", self.path.display());

    Ok(())
  }
}

impl Render<Upload, Outcome> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, _upload: &Upload, outcome: &Outcome) -> Result<(), Self::Error> {
    self.save_image(self.panel.draw_outcome(outcome))
  }

  fn render_failure(&self, upload: &Upload, error: &anyhow::Error) -> Result<(), Self::Error> {
    self.save_image(self.panel.draw_failure(upload, error))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("folder:///tmp/records").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn missing_font_fails_at_startup() {
    let url = Url::parse("image:///tmp/panel.png?font=/nonexistent/font.ttf").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::PanelError(_))
    ));
  }

  #[test]
  fn failure_panel_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested/panel.png");
    let url = Url::parse(&format!("image://{}", target.display())).unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();
    assert_eq!(output.path(), target.as_path());

    let upload = Upload::new("broken.jpg", b"garbage".to_vec());
    output
      .render_failure(&upload, &anyhow::anyhow!("无法解码"))
      .unwrap();
    assert!(image::open(&target).is_ok());
  }
}
