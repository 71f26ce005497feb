// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/catalog.rs - 手语类别表
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

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

mod labels;
mod reference;
mod script;
mod translate;

pub use self::labels::{ClassLabels, ClassLabelsError};
pub use self::reference::{ReferenceIndex, ReferenceSource};
pub use self::script::Script;
pub use self::translate::{Translation, Translator, normalize_label, strip_class_prefix};

pub const CATALOG_VERSION: u32 = 1;

const BUILTIN_CATALOG: &str = include_str!("../assets/signs.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("类别表解析错误: {0}")]
  ParseError(#[from] toml::de::Error),
  #[error("不支持的类别表版本: {0}, 期望 {expected}", expected = CATALOG_VERSION)]
  UnsupportedVersion(u32),
  #[error("类别标签包含首尾空白: {0:?}")]
  UntrimmedLabel(String),
  #[error("类别标签重复: {0:?}")]
  DuplicateLabel(String),
  #[error("类别标签 {0:?} 与 {1:?} 规范化后相同")]
  AmbiguousLabel(String, String),
  #[error("类别 {label:?} 的字符 {text:?} 不属于 {script}")]
  ScriptMismatch {
    label: String,
    text: String,
    script: Script,
  },
}

/// 类别表中的一项
#[derive(Debug, Clone, Deserialize)]
pub struct SignEntry {
  /// 与标签文件中完全一致的类别标签
  pub label: String,
  pub script: Script,
  pub character: String,
  /// 另一种文字中的对应字母，缺省表示不存在对应字母
  #[serde(default)]
  pub counterpart: Option<String>,
  #[serde(default)]
  pub reference: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
  version: u32,
  #[serde(default)]
  placeholder: Option<PathBuf>,
  #[serde(rename = "sign", default)]
  signs: Vec<SignEntry>,
}

/// 翻译表与参考图像索引的唯一数据源
#[derive(Debug, Clone)]
pub struct SignCatalog {
  entries: Vec<SignEntry>,
  placeholder: Option<PathBuf>,
  root: PathBuf,
}

impl SignCatalog {
  /// 内置类别表，相对路径以 `asset_root` 为基准
  pub fn builtin(asset_root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
    Self::from_toml_str(BUILTIN_CATALOG, asset_root)
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
    let path = path.as_ref();
    info!("加载类别表: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let root = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_default();
    Self::from_toml_str(&text, root)
  }

  pub fn from_toml_str(text: &str, root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
    let file: CatalogFile = toml::from_str(text)?;
    if file.version != CATALOG_VERSION {
      return Err(CatalogError::UnsupportedVersion(file.version));
    }

    let catalog = SignCatalog {
      entries: file.signs,
      placeholder: file.placeholder,
      root: root.into(),
    };
    catalog.validate()?;
    debug!("类别表共有 {} 个类别", catalog.entries.len());
    Ok(catalog)
  }

  fn validate(&self) -> Result<(), CatalogError> {
    let mut labels = HashSet::new();
    let mut normalized: Vec<(String, &str)> = Vec::with_capacity(self.entries.len());

    for entry in &self.entries {
      if entry.label.trim() != entry.label {
        return Err(CatalogError::UntrimmedLabel(entry.label.clone()));
      }
      // 同一个标签只能属于一张翻译表
      if !labels.insert(entry.label.as_str()) {
        return Err(CatalogError::DuplicateLabel(entry.label.clone()));
      }

      let key = normalize_label(&entry.label);
      if let Some((_, other)) = normalized.iter().find(|(k, _)| *k == key) {
        return Err(CatalogError::AmbiguousLabel(
          other.to_string(),
          entry.label.clone(),
        ));
      }
      normalized.push((key, &entry.label));

      if !entry.script.owns_text(&entry.character) {
        return Err(CatalogError::ScriptMismatch {
          label: entry.label.clone(),
          text: entry.character.clone(),
          script: entry.script,
        });
      }
      if let Some(counterpart) = &entry.counterpart
        && !entry.script.other().owns_text(counterpart)
      {
        return Err(CatalogError::ScriptMismatch {
          label: entry.label.clone(),
          text: counterpart.clone(),
          script: entry.script.other(),
        });
      }
    }
    Ok(())
  }

  pub fn entries(&self) -> &[SignEntry] {
    &self.entries
  }

  pub fn get(&self, label: &str) -> Option<&SignEntry> {
    self.entries.iter().find(|entry| entry.label == label)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn resolve_path(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.root.join(path)
    }
  }

  pub fn placeholder(&self) -> Option<PathBuf> {
    self.placeholder.as_deref().map(|path| self.resolve_path(path))
  }

  pub fn translator(&self) -> Translator {
    Translator::from_entries(&self.entries)
  }

  /// `placeholder` 优先于类别表中的占位图像
  pub fn reference_index(&self, placeholder: Option<PathBuf>) -> ReferenceIndex {
    let placeholder = placeholder
      .or_else(|| self.placeholder())
      .unwrap_or_else(|| self.root.join("not sign.png"));

    let references = self.entries.iter().filter_map(|entry| {
      entry
        .reference
        .as_deref()
        .map(|path| (entry.label.as_str(), self.resolve_path(path)))
    });
    ReferenceIndex::new(references, placeholder)
  }

  /// 报告标签文件中没有对应类别的标签，这些标签只能走回退翻译
  pub fn report_uncovered(&self, labels: &ClassLabels) -> usize {
    let mut uncovered = 0;
    for (index, label) in labels.iter() {
      if self.get(label).is_none() {
        warn!("类别 {} ({:?}) 不在类别表中", index, label);
        uncovered += 1;
      }
    }
    uncovered
  }
}
