// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/speech.rs - 语音合成
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
use tracing::info;

use crate::catalog::Script;

mod google_tts;

pub use self::google_tts::{DEFAULT_TTS_ENDPOINT, GoogleTts};

#[derive(Error, Debug)]
pub enum SpeechError {
  #[error("HTTP 请求错误: {0}")]
  HttpError(#[from] reqwest::Error),
  #[error("语音服务返回状态 {0}")]
  BadStatus(u16),
  #[error("语音服务返回空音频")]
  EmptyAudio,
  #[error("没有可朗读的文本")]
  NothingToSay,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
  Tamil,
  Malayalam,
}

impl Voice {
  /// 含有马拉雅拉姆文字符时用马拉雅拉姆语，否则用泰米尔语
  pub fn for_text(text: &str) -> Self {
    if Script::Malayalam.appears_in(text) {
      Voice::Malayalam
    } else {
      Voice::Tamil
    }
  }

  pub fn language_code(&self) -> &'static str {
    match self {
      Voice::Tamil => "ta",
      Voice::Malayalam => "ml",
    }
  }
}

impl std::fmt::Display for Voice {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.language_code())
  }
}

pub trait SpeechSynthesizer {
  /// 返回 MP3 音频数据
  fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SpeechError>;
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<T> {
  fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SpeechError> {
    (**self).synthesize(text, voice)
  }
}

/// 写入磁盘的一段朗读音频
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechClip {
  pub path: PathBuf,
  pub voice: Voice,
  pub text: String,
}

/// 合成 `text` 并覆盖写入 `audio_path`
pub fn speak_to_file<S: SpeechSynthesizer + ?Sized>(
  synthesizer: &S,
  text: &str,
  audio_path: &Path,
) -> Result<SpeechClip, SpeechError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(SpeechError::NothingToSay);
  }

  let voice = Voice::for_text(text);
  let audio = synthesizer.synthesize(text, voice)?;
  if audio.is_empty() {
    return Err(SpeechError::EmptyAudio);
  }

  if let Some(parent) = audio_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(audio_path, &audio)?;
  info!(
    "朗读音频已写入: {} ({}, {} 字节)",
    audio_path.display(),
    voice,
    audio.len()
  );

  Ok(SpeechClip {
    path: audio_path.to_path_buf(),
    voice,
    text: text.to_string(),
  })
}

/// 删除上一次上传留下的音频，文件不存在时不算错误
pub fn clear_audio_file(audio_path: &Path) -> Result<(), SpeechError> {
  match std::fs::remove_file(audio_path) {
    Ok(()) => {
      info!("已删除上一次的朗读音频: {}", audio_path.display());
      Ok(())
    }
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;

  struct Recorder {
    calls: RefCell<Vec<(String, Voice)>>,
  }

  impl SpeechSynthesizer for Recorder {
    fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SpeechError> {
      self.calls.borrow_mut().push((text.to_string(), voice));
      Ok(b"ID3".to_vec())
    }
  }

  #[test]
  fn malayalam_text_selects_malayalam_voice() {
    assert_eq!(Voice::for_text("അ"), Voice::Malayalam);
    assert_eq!(Voice::for_text("അഃ"), Voice::Malayalam);
    assert_eq!(Voice::Malayalam.language_code(), "ml");
  }

  #[test]
  fn tamil_text_selects_tamil_voice() {
    assert_eq!(Voice::for_text("அ"), Voice::Tamil);
    assert_eq!(Voice::for_text("ஃ"), Voice::Tamil);
    assert_eq!(Voice::Tamil.language_code(), "ta");
  }

  #[test]
  fn clip_overwrites_the_audio_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audio/output.mp3");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"previous clip").unwrap();

    let recorder = Recorder {
      calls: RefCell::new(Vec::new()),
    };
    let clip = speak_to_file(&recorder, " ഒ ", &path).unwrap();

    assert_eq!(clip.voice, Voice::Malayalam);
    assert_eq!(clip.text, "ഒ");
    assert_eq!(std::fs::read(&path).unwrap(), b"ID3");
    assert_eq!(
      recorder.calls.borrow().as_slice(),
      &[("ഒ".to_string(), Voice::Malayalam)]
    );
  }

  #[test]
  fn empty_text_is_not_sent() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder {
      calls: RefCell::new(Vec::new()),
    };
    let result = speak_to_file(&recorder, "  ", &dir.path().join("output.mp3"));
    assert!(matches!(result, Err(SpeechError::NothingToSay)));
    assert!(recorder.calls.borrow().is_empty());
  }

  #[test]
  fn clearing_removes_previous_clip_and_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.mp3");
    std::fs::write(&path, b"previous clip").unwrap();

    clear_audio_file(&path).unwrap();
    assert!(!path.exists());
    clear_audio_file(&path).unwrap();
  }
}
