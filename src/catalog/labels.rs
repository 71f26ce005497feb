// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/catalog/labels.rs - 分类器标签文件
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

use std::{collections::BTreeMap, path::Path};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ClassLabelsError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签文件解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("标签键不是整数: {0:?}")]
  InvalidIndex(String),
  #[error("标签文件为空")]
  Empty,
}

/// 分类器输出下标到类别标签的映射，值在加载时去除首尾空白
#[derive(Debug, Clone)]
pub struct ClassLabels {
  labels: BTreeMap<usize, String>,
}

impl ClassLabels {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassLabelsError> {
    let path = path.as_ref();
    info!("加载类别标签: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Self::from_json_str(&text)
  }

  pub fn from_json_str(text: &str) -> Result<Self, ClassLabelsError> {
    let raw: BTreeMap<String, String> = serde_json::from_str(text)?;
    if raw.is_empty() {
      return Err(ClassLabelsError::Empty);
    }

    let mut labels = BTreeMap::new();
    for (key, value) in raw {
      let index = key
        .trim()
        .parse::<usize>()
        .map_err(|_| ClassLabelsError::InvalidIndex(key.clone()))?;
      labels.insert(index, value.trim().to_string());
    }
    Ok(ClassLabels { labels })
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.labels.get(&index).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
    self.labels.iter().map(|(index, label)| (*index, label.as_str()))
  }
}
