// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use chrono::{Datelike, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme, input::Upload, output::Render, pipeline::Outcome, url_file_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("记录计数器锁已损坏")]
  Poisoned,
}

/// 每次上传一个按日期分组的记录目录
///
/// `folder:///var/lib/kaimozhi/records?failures` 同时记录失败的上传。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  counter: Mutex<u16>,
  failures: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let failures = uri.query_pairs().any(|(k, _)| k == "failures");

    Ok(DirectoryRecordOutput {
      directory: url_file_path(uri),
      counter: Mutex::new(0),
      failures,
    })
  }
}

impl DirectoryRecordOutput {
  fn record_id(&self) -> Result<u16, DirectoryRecordOutputError> {
    let mut counter = self
      .counter
      .lock()
      .map_err(|_| DirectoryRecordOutputError::Poisoned)?;
    *counter = counter.wrapping_add(1);
    Ok(*counter)
  }

  /// `YYYY/MM/DD/HH-MM-SS-XXXX/`
  fn record_directory(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()))
      .join(format!(
        "{}-{:04X}",
        now.format("%H-%M-%S"),
        self.record_id()?
      ));
    std::fs::create_dir_all(&directory)?;
    debug!("记录目录: {}", directory.display());
    Ok(directory)
  }
}

fn upload_file_name(upload: &Upload) -> String {
  Path::new(&upload.name)
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .filter(|name| !name.is_empty())
    .unwrap_or_else(|| "upload".to_string())
}

impl Render<Upload, Outcome> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, upload: &Upload, outcome: &Outcome) -> Result<(), Self::Error> {
    let directory = self.record_directory()?;

    outcome.uploaded.save(directory.join("uploaded.png"))?;
    outcome.cleaned.save(directory.join("cleaned.png"))?;
    outcome.reference_image.save(directory.join("reference.png"))?;

    let record = serde_json::json!({
      "upload": upload.name,
      "prediction": outcome.prediction_json(),
      "class_id": outcome.class_id,
      "translation": outcome.translation.text(),
      "reference": outcome.reference.path().display().to_string(),
      "placeholder": outcome.reference.is_placeholder(),
      "voice": outcome.audio.as_ref().map(|clip| clip.voice.language_code()),
    });
    std::fs::write(
      directory.join("prediction.json"),
      serde_json::to_string_pretty(&record)?,
    )?;

    if let Some(clip) = &outcome.audio {
      let target = directory.join(
        clip
          .path
          .file_name()
          .map(PathBuf::from)
          .unwrap_or_else(|| PathBuf::from("output.mp3")),
      );
      std::fs::copy(&clip.path, target)?;
    }

    info!("结果已记录到: {}", directory.display());
    Ok(())
  }

  fn render_failure(&self, upload: &Upload, error: &anyhow::Error) -> Result<(), Self::Error> {
    if !self.failures {
      return Ok(());
    }

    let directory = self.record_directory()?;
    std::fs::write(directory.join(upload_file_name(upload)), &upload.bytes)?;
    std::fs::write(directory.join("error.txt"), format!("{:?}\n", error))?;
    info!("失败记录到: {}", directory.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{ReferenceSource, Translation};
  use image::RgbImage;

  fn record_dirs(root: &Path) -> Vec<PathBuf> {
    // root/YYYY/MM/DD/record
    let mut found = Vec::new();
    let mut stack = vec![(root.to_path_buf(), 0)];
    while let Some((dir, depth)) = stack.pop() {
      for entry in std::fs::read_dir(&dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
          if depth == 3 {
            found.push(path);
          } else {
            stack.push((path, depth + 1));
          }
        }
      }
    }
    found
  }

  fn output(root: &Path, query: &str) -> DirectoryRecordOutput {
    let url = url::Url::parse(&format!("folder://{}{}", root.display(), query)).unwrap();
    DirectoryRecordOutput::from_url(&url).unwrap()
  }

  #[test]
  fn result_is_recorded_with_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = output(dir.path(), "");
    let outcome = Outcome {
      uploaded: RgbImage::new(2, 2),
      cleaned: RgbImage::new(2, 2),
      predicted_label: "class_7  ഋ - RU".to_string(),
      class_id: 6,
      confidence: 0.75,
      translation: Translation::NoEquivalent {
        source: crate::catalog::Script::Malayalam,
      },
      reference: ReferenceSource::Placeholder(PathBuf::from("not sign.png")),
      reference_image: RgbImage::new(2, 2),
      audio: None,
    };

    output
      .render_result(&Upload::new("sign.jpg", Vec::new()), &outcome)
      .unwrap();

    let records = record_dirs(dir.path());
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record.join("uploaded.png").exists());
    assert!(record.join("reference.png").exists());

    let json: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(record.join("prediction.json")).unwrap())
        .unwrap();
    assert_eq!(json["translation"], "Can't find");
    assert_eq!(json["placeholder"], true);
    assert_eq!(json["prediction"]["class_7  ഋ - RU"], 0.75);
    assert!(json["voice"].is_null());
  }

  #[test]
  fn failures_are_skipped_unless_requested() {
    let dir = tempfile::tempdir().unwrap();
    let upload = Upload::new("/inbox/broken.jpg", b"garbage".to_vec());
    let error = anyhow::anyhow!("无法解码");

    output(dir.path(), "").render_failure(&upload, &error).unwrap();
    assert!(record_dirs(dir.path()).is_empty());

    output(dir.path(), "?failures")
      .render_failure(&upload, &error)
      .unwrap();
    let records = record_dirs(dir.path());
    assert_eq!(records.len(), 1);
    assert_eq!(
      std::fs::read(records[0].join("broken.jpg")).unwrap(),
      b"garbage"
    );
    let text = std::fs::read_to_string(records[0].join("error.txt")).unwrap();
    assert!(text.contains("无法解码"));
  }
}
