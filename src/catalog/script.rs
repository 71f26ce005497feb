// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/catalog/script.rs - 文字系统
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

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
  Tamil,
  Malayalam,
}

impl Script {
  /// Unicode 区块范围（闭区间）
  pub fn unicode_range(&self) -> (u32, u32) {
    match self {
      Self::Tamil => (0x0B80, 0x0BFF),
      Self::Malayalam => (0x0D00, 0x0D7F),
    }
  }

  pub fn other(&self) -> Self {
    match self {
      Self::Tamil => Self::Malayalam,
      Self::Malayalam => Self::Tamil,
    }
  }

  pub fn contains_char(&self, c: char) -> bool {
    let (start, end) = self.unicode_range();
    (start..=end).contains(&(c as u32))
  }

  /// 文本中是否出现该文字的字符
  pub fn appears_in(&self, text: &str) -> bool {
    text.chars().any(|c| self.contains_char(c))
  }

  /// 非空白字符全部属于该文字，且至少有一个
  pub fn owns_text(&self, text: &str) -> bool {
    let mut chars = text.chars().filter(|c| !c.is_whitespace()).peekable();
    chars.peek().is_some() && chars.all(|c| self.contains_char(c))
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::Tamil => "Tamil",
      Self::Malayalam => "Malayalam",
    }
  }
}

impl std::fmt::Display for Script {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}
