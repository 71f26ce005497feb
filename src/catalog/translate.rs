// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/catalog/translate.rs - 类别标签翻译
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

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use super::{Script, SignEntry};

/// 没有对应字母时显示的文本
pub const NO_EQUIVALENT_TEXT: &str = "Can't find";

static CLASS_PREFIX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^class[_\s]*\d+\s*").expect("无效的类别前缀正则表达式"));

/// 去除首尾空白、转小写并把连续空白合并为一个空格
pub fn normalize_label(label: &str) -> String {
  label
    .trim()
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// 去掉开头的 `class_<数字>`
pub fn strip_class_prefix(label: &str) -> &str {
  let label = label.trim();
  match CLASS_PREFIX.find(label) {
    Some(m) => label[m.end()..].trim(),
    None => label,
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
  /// 在翻译表中找到对应字母
  Mapped { character: String, target: Script },
  /// 在翻译表中，但另一种文字中没有对应字母
  NoEquivalent { source: Script },
  /// 不在任何翻译表中，只去掉了类别前缀
  Unmapped(String),
}

impl Translation {
  /// 可以朗读的文本；没有对应字母时不朗读
  pub fn speakable(&self) -> Option<&str> {
    match self {
      Translation::Mapped { character, .. } => Some(character),
      Translation::NoEquivalent { .. } => None,
      Translation::Unmapped(text) if !text.is_empty() => Some(text),
      Translation::Unmapped(_) => None,
    }
  }

  pub fn text(&self) -> &str {
    match self {
      Translation::Mapped { character, .. } => character,
      Translation::NoEquivalent { .. } => NO_EQUIVALENT_TEXT,
      Translation::Unmapped(text) => text,
    }
  }
}

impl std::fmt::Display for Translation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.text())
  }
}

/// 马拉雅拉姆文 → 泰米尔文与泰米尔文 → 马拉雅拉姆文两张翻译表
#[derive(Debug, Clone, Default)]
pub struct Translator {
  malayalam_to_tamil: HashMap<String, Option<String>>,
  tamil_to_malayalam: HashMap<String, Option<String>>,
}

impl Translator {
  pub fn from_entries(entries: &[SignEntry]) -> Self {
    let mut translator = Translator::default();
    for entry in entries {
      let map = match entry.script {
        Script::Malayalam => &mut translator.malayalam_to_tamil,
        Script::Tamil => &mut translator.tamil_to_malayalam,
      };
      map.insert(entry.label.clone(), entry.counterpart.clone());
    }
    translator
  }

  /// 查找顺序：马拉雅拉姆文表、泰米尔文表，最后去掉类别前缀
  pub fn translate(&self, raw_label: &str) -> Translation {
    let label = raw_label.trim();

    for (source, map) in [
      (Script::Malayalam, &self.malayalam_to_tamil),
      (Script::Tamil, &self.tamil_to_malayalam),
    ] {
      if let Some(counterpart) = map.get(label) {
        return match counterpart {
          Some(character) => Translation::Mapped {
            character: character.clone(),
            target: source.other(),
          },
          None => Translation::NoEquivalent { source },
        };
      }
    }

    Translation::Unmapped(strip_class_prefix(label).to_string())
  }

  /// 拥有该标签的翻译表数量
  pub fn owners(&self, label: &str) -> usize {
    [&self.malayalam_to_tamil, &self.tamil_to_malayalam]
      .iter()
      .filter(|map| map.contains_key(label))
      .count()
  }

  pub fn keys(&self, source: Script) -> impl Iterator<Item = &str> {
    let map = match source {
      Script::Malayalam => &self.malayalam_to_tamil,
      Script::Tamil => &self.tamil_to_malayalam,
    };
    map.keys().map(String::as_str)
  }
}
