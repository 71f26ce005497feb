// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/pipeline.rs - 单次上传的处理流程
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

use image::{RgbImage, RgbaImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  catalog::{ClassLabels, ReferenceIndex, ReferenceSource, SignCatalog, Translation, Translator},
  input::Upload,
  model::{Model, Prediction, SignFrame, composite_on_black},
  speech::{SpeechClip, SpeechError, SpeechSynthesizer, clear_audio_file, speak_to_file},
};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("无法解码上传图像 {name}: {source}")]
  DecodeError {
    name: String,
    source: image::ImageError,
  },
  #[error("背景去除失败: {0}")]
  BackgroundError(#[source] BoxedError),
  #[error("分类失败: {0}")]
  ClassifierError(#[source] BoxedError),
  #[error("类别 {0} 没有对应的标签")]
  UnknownClass(usize),
  #[error("无法读取参考图像 {path}: {source}")]
  ReferenceError {
    path: PathBuf,
    source: image::ImageError,
  },
  #[error("语音合成失败: {0}")]
  SpeechError(#[from] SpeechError),
}

/// 分类阶段的结果
#[derive(Debug, Clone)]
pub struct Classification {
  /// 去除背景并合成到黑色画布上的图像
  pub cleaned: RgbImage,
  pub prediction: Prediction,
  pub label: String,
}

/// 一次上传的完整结果
#[derive(Debug, Clone)]
pub struct Outcome {
  pub uploaded: RgbImage,
  pub cleaned: RgbImage,
  pub predicted_label: String,
  pub class_id: usize,
  pub confidence: f32,
  pub translation: Translation,
  pub reference: ReferenceSource,
  pub reference_image: RgbImage,
  pub audio: Option<SpeechClip>,
}

impl Outcome {
  /// `{predicted_label: confidence}`
  pub fn prediction_json(&self) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert(
      self.predicted_label.clone(),
      serde_json::Value::from(f64::from(self.confidence)),
    );
    serde_json::Value::Object(map)
  }
}

/// 启动时构建一次、之后只读的上下文
///
/// `C` 为分类模型，`B` 为背景去除模型，`S` 为语音合成服务。
/// 每次上传的失败只影响该次上传，上下文可以继续处理下一次上传。
pub struct SignContext<C, B, S> {
  classifier: C,
  remover: B,
  speech: S,
  labels: ClassLabels,
  translator: Translator,
  references: ReferenceIndex,
  audio_path: PathBuf,
}

impl<C, B, S> SignContext<C, B, S>
where
  C: Model<Input = SignFrame, Output = Prediction>,
  C::Error: std::error::Error + Send + Sync + 'static,
  B: Model<Input = RgbImage, Output = RgbaImage>,
  B::Error: std::error::Error + Send + Sync + 'static,
  S: SpeechSynthesizer,
{
  pub fn new(
    classifier: C,
    remover: B,
    speech: S,
    labels: ClassLabels,
    catalog: &SignCatalog,
    audio_path: impl Into<PathBuf>,
  ) -> Self {
    let uncovered = catalog.report_uncovered(&labels);
    if uncovered > 0 {
      info!("{} 个类别不在类别表中，将使用回退翻译", uncovered);
    }

    SignContext {
      classifier,
      remover,
      speech,
      labels,
      translator: catalog.translator(),
      references: catalog.reference_index(None),
      audio_path: audio_path.into(),
    }
  }

  /// 替换参考图像索引，例如指定其他占位图像
  pub fn with_references(mut self, references: ReferenceIndex) -> Self {
    self.references = references;
    self
  }

  pub fn labels(&self) -> &ClassLabels {
    &self.labels
  }

  pub fn translator(&self) -> &Translator {
    &self.translator
  }

  pub fn audio_path(&self) -> &Path {
    &self.audio_path
  }

  fn clean(&self, image: &RgbImage) -> Result<RgbImage, PipelineError> {
    let cutout = self
      .remover
      .infer(image)
      .map_err(|e| PipelineError::BackgroundError(Box::new(e)))?;
    Ok(composite_on_black(&cutout))
  }

  /// 去除背景、缩放并分类，取概率最大的类别
  pub fn classify(&self, image: &RgbImage) -> Result<Classification, PipelineError> {
    let cleaned = self.clean(image)?;
    let frame = SignFrame::from(&cleaned);
    let prediction = self
      .classifier
      .infer(&frame)
      .map_err(|e| PipelineError::ClassifierError(Box::new(e)))?;
    let label = self
      .labels
      .get(prediction.class_id)
      .ok_or(PipelineError::UnknownClass(prediction.class_id))?
      .to_string();

    Ok(Classification {
      cleaned,
      prediction,
      label,
    })
  }

  fn reference_image(&self, label: &str) -> Result<(ReferenceSource, RgbImage), PipelineError> {
    let source = self.references.resolve(label);
    let image = image::open(source.path())
      .map_err(|source_error| PipelineError::ReferenceError {
        path: source.path().to_path_buf(),
        source: source_error,
      })?
      .to_rgb8();
    let cleaned = self.clean(&image)?;
    Ok((source, cleaned))
  }

  pub fn process(&self, upload: &Upload) -> Result<Outcome, PipelineError> {
    info!("处理上传图像: {}", upload.name);
    let uploaded = image::load_from_memory(&upload.bytes)
      .map_err(|source| PipelineError::DecodeError {
        name: upload.name.clone(),
        source,
      })?
      .to_rgb8();
    debug!("图像尺寸: {}x{}", uploaded.width(), uploaded.height());

    let now = std::time::Instant::now();
    let Classification {
      cleaned,
      prediction,
      label,
    } = self.classify(&uploaded)?;
    info!(
      "预测类别: {} ({:.4}), 耗时: {:.2?}",
      label,
      prediction.confidence,
      now.elapsed()
    );

    let translation = self.translator.translate(&label);
    info!("翻译结果: {}", translation);

    let (reference, reference_image) = self.reference_image(&label)?;

    let audio = match translation.speakable() {
      Some(text) => match speak_to_file(&self.speech, text, &self.audio_path) {
        Ok(clip) => Some(clip),
        Err(e) => {
          clear_audio_file(&self.audio_path)?;
          return Err(e.into());
        }
      },
      None => {
        info!("没有可朗读的对应字母，跳过语音合成");
        clear_audio_file(&self.audio_path)?;
        None
      }
    };

    Ok(Outcome {
      uploaded,
      cleaned,
      predicted_label: label,
      class_id: prediction.class_id,
      confidence: prediction.confidence,
      translation,
      reference,
      reference_image,
      audio,
    })
  }
}

impl<C, B, S> Model for SignContext<C, B, S>
where
  C: Model<Input = SignFrame, Output = Prediction>,
  C::Error: std::error::Error + Send + Sync + 'static,
  B: Model<Input = RgbImage, Output = RgbaImage>,
  B::Error: std::error::Error + Send + Sync + 'static,
  S: SpeechSynthesizer,
{
  type Input = Upload;
  type Output = Outcome;
  type Error = PipelineError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.process(input)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn outcome(label: &str, confidence: f32) -> Outcome {
    let blank = RgbImage::new(1, 1);
    Outcome {
      uploaded: blank.clone(),
      cleaned: blank.clone(),
      predicted_label: label.to_string(),
      class_id: 0,
      confidence,
      translation: Translation::Unmapped("x".to_string()),
      reference: ReferenceSource::Placeholder(PathBuf::from("not sign.png")),
      reference_image: blank,
      audio: None,
    }
  }

  #[test]
  fn prediction_json_maps_label_to_confidence() {
    let json = outcome("class_3  ഇ - I", 0.5).prediction_json();
    assert_eq!(json, serde_json::json!({ "class_3  ഇ - I": 0.5 }));
  }

  #[test]
  fn prediction_json_keeps_low_confidence() {
    let json = outcome("class_1  அ", 0.25).prediction_json();
    let value = json.get("class_1  அ").and_then(|v| v.as_f64()).unwrap();
    assert!((value - 0.25).abs() < 1e-6);
  }
}
