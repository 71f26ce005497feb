// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/input/directory_scan.rs - 目录批量上传输入
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

use std::{collections::VecDeque, path::PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{Upload, has_upload_extension},
  url_file_path,
};

#[derive(Error, Debug)]
pub enum DirectoryScanInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("不是目录: {0}")]
  NotADirectory(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 按文件名顺序逐个读取目录中的上传图像
pub struct DirectoryScanInput {
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for DirectoryScanInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryScanInput {
  type Error = DirectoryScanInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DirectoryScanInputError::SchemeMismatch);
    }

    let directory = url_file_path(url);
    if !directory.is_dir() {
      return Err(DirectoryScanInputError::NotADirectory(
        directory.display().to_string(),
      ));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let path = entry?.path();
      if path.is_file() && has_upload_extension(&path) {
        files.push(path);
      }
    }
    files.sort();

    info!(
      "目录 {} 中共有 {} 个待处理的上传图像",
      directory.display(),
      files.len()
    );

    Ok(DirectoryScanInput {
      pending: files.into(),
    })
  }
}

impl DirectoryScanInput {
  pub fn remaining(&self) -> usize {
    self.pending.len()
  }
}

impl Iterator for DirectoryScanInput {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(path) = self.pending.pop_front() {
      match std::fs::read(&path) {
        Ok(bytes) => {
          let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
          return Some(Upload::new(name, bytes));
        }
        Err(e) => {
          warn!("无法读取文件 {}, 跳过: {}", path.display(), e);
        }
      }
    }
    None
  }
}
