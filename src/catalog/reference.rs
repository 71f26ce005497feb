// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/catalog/reference.rs - 参考图像索引
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

use tracing::debug;

use super::normalize_label;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSource {
  Matched(PathBuf),
  Placeholder(PathBuf),
}

impl ReferenceSource {
  pub fn path(&self) -> &Path {
    match self {
      ReferenceSource::Matched(path) | ReferenceSource::Placeholder(path) => path,
    }
  }

  pub fn is_placeholder(&self) -> bool {
    matches!(self, ReferenceSource::Placeholder(_))
  }
}

/// 规范化标签到参考图像路径的索引
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
  entries: Vec<(String, PathBuf)>,
  placeholder: PathBuf,
}

impl ReferenceIndex {
  pub fn new<'a>(
    references: impl IntoIterator<Item = (&'a str, PathBuf)>,
    placeholder: PathBuf,
  ) -> Self {
    let entries = references
      .into_iter()
      .map(|(label, path)| (normalize_label(label), path))
      .collect();
    ReferenceIndex {
      entries,
      placeholder,
    }
  }

  pub fn placeholder(&self) -> &Path {
    &self.placeholder
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// 找不到匹配项或文件不存在时返回占位图像
  pub fn resolve(&self, predicted_label: &str) -> ReferenceSource {
    let key = normalize_label(predicted_label);
    for (label, path) in &self.entries {
      if *label == key && path.exists() {
        debug!("参考图像: {} -> {}", predicted_label, path.display());
        return ReferenceSource::Matched(path.clone());
      }
    }
    debug!("类别 {:?} 没有可用的参考图像，使用占位图像", predicted_label);
    ReferenceSource::Placeholder(self.placeholder.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn matches_after_normalization_when_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("frame_0001.jpg");
    std::fs::write(&reference, b"jpg").unwrap();
    let placeholder = dir.path().join("not sign.png");

    let index = ReferenceIndex::new(
      [("class_1 அ - A", reference.clone())],
      placeholder.clone(),
    );
    assert_eq!(
      index.resolve("Class_1    அ - a"),
      ReferenceSource::Matched(reference)
    );
  }

  #[test]
  fn falls_back_when_no_key_matches() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("frame_0001.jpg");
    std::fs::write(&reference, b"jpg").unwrap();
    let placeholder = dir.path().join("not sign.png");

    let index = ReferenceIndex::new([("class_1 அ", reference)], placeholder.clone());
    let source = index.resolve("class_2 ஆ");
    assert!(source.is_placeholder());
    assert_eq!(source.path(), placeholder.as_path());
  }

  #[test]
  fn falls_back_when_matched_file_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let placeholder = dir.path().join("not sign.png");
    let index = ReferenceIndex::new(
      [("class_1  அ", dir.path().join("missing.jpg"))],
      placeholder.clone(),
    );
    assert_eq!(
      index.resolve("class_1  அ"),
      ReferenceSource::Placeholder(placeholder)
    );
  }
}
