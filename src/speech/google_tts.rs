// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/speech/google_tts.rs - 在线语音合成服务
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

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, error};

use super::{SpeechError, SpeechSynthesizer, Voice};

pub const DEFAULT_TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 与 gTTS 相同的翻译朗读接口，返回 MP3
pub struct GoogleTts {
  client: Client,
  endpoint: String,
}

impl GoogleTts {
  pub fn new(endpoint: impl Into<String>) -> Result<Self, SpeechError> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(GoogleTts {
      client,
      endpoint: endpoint.into(),
    })
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  fn request_url(&self, text: &str, voice: Voice) -> String {
    format!(
      "{}?ie=UTF-8&client=tw-ob&tl={}&q={}&total=1&idx=0&textlen={}",
      self.endpoint,
      voice.language_code(),
      urlencoding::encode(text),
      text.chars().count()
    )
  }
}

impl SpeechSynthesizer for GoogleTts {
  fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SpeechError> {
    let url = self.request_url(text, voice);
    debug!("请求语音合成: {}", url);

    let response = self.client.get(&url).send()?;
    let status = response.status();
    if !status.is_success() {
      error!("语音服务返回错误状态: {}", status);
      return Err(SpeechError::BadStatus(status.as_u16()));
    }

    let audio = response.bytes()?;
    if audio.is_empty() {
      return Err(SpeechError::EmptyAudio);
    }
    Ok(audio.to_vec())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_carries_language_and_encoded_text() {
    let tts = GoogleTts::new(DEFAULT_TTS_ENDPOINT).unwrap();
    let url = tts.request_url("അ", Voice::Malayalam);
    assert_eq!(
      url,
      "https://translate.google.com/translate_tts?ie=UTF-8&client=tw-ob&tl=ml&q=%E0%B4%85&total=1&idx=0&textlen=1"
    );
  }

  #[test]
  fn tamil_request_uses_tamil_code() {
    let tts = GoogleTts::new("http://localhost:9/tts").unwrap();
    let url = tts.request_url("ஐ", Voice::Tamil);
    assert!(url.starts_with("http://localhost:9/tts?"));
    assert!(url.contains("&tl=ta&"));
    assert!(url.ends_with("&textlen=1"));
  }

  #[test]
  fn unreachable_service_is_an_http_error() {
    // 端口 9 (discard) 在测试环境中不会响应 HTTP
    let tts = GoogleTts::new("http://127.0.0.1:9/tts").unwrap();
    let result = tts.synthesize("அ", Voice::Tamil);
    assert!(matches!(result, Err(SpeechError::HttpError(_))));
  }
}
