// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/model/classifier.rs - 手语分类模型
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

use std::{path::PathBuf, sync::Mutex};

use ort::{session::Session, value::Tensor};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::UnitNhwcFrame,
  model::{Model, Prediction, SessionError, build_session},
  url_file_path,
};

/// 分类器输入边长
pub const CLASSIFIER_INPUT_SIZE: u32 = 128;

pub type SignFrame = UnitNhwcFrame<CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE>;
pub type SignClassifier = OnnxClassifier<CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE>;

#[derive(Error, Debug)]
pub enum ClassifierError {
  #[error("模型会话错误: {0}")]
  SessionError(#[from] SessionError),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("推理错误: {0}")]
  InferenceError(String),
  #[error("模型输出为空")]
  EmptyOutput,
  #[error("模型输出 {actual} 个类别, 期望 {expected} 个")]
  ClassCountMismatch { expected: usize, actual: usize },
  #[error("推理会话锁已损坏")]
  Poisoned,
}

/// NHWC 输入、softmax 输出的 ONNX 图像分类模型
pub struct OnnxClassifier<const W: u32, const H: u32> {
  session: Mutex<Session>,
  num_classes: Option<usize>,
}

pub struct OnnxClassifierBuilder {
  model_path: PathBuf,
  num_classes: Option<usize>,
}

impl FromUrlWithScheme for OnnxClassifierBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxClassifierBuilder {
  type Error = ClassifierError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ClassifierError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    Ok(OnnxClassifierBuilder {
      model_path: url_file_path(url),
      num_classes: None,
    })
  }
}

impl OnnxClassifierBuilder {
  pub fn new(model_path: impl Into<PathBuf>) -> Self {
    OnnxClassifierBuilder {
      model_path: model_path.into(),
      num_classes: None,
    }
  }

  /// 期望的类别数量，一般等于标签文件的条目数
  pub fn num_classes(mut self, num_classes: usize) -> Self {
    self.num_classes = Some(num_classes);
    self
  }

  pub fn build<const W: u32, const H: u32>(self) -> Result<OnnxClassifier<W, H>, ClassifierError> {
    let session = build_session(&self.model_path, "分类")?;
    debug!("分类模型输入尺寸: {}x{}", W, H);

    Ok(OnnxClassifier {
      session: Mutex::new(session),
      num_classes: self.num_classes,
    })
  }
}

impl<const W: u32, const H: u32> OnnxClassifier<W, H> {
  fn run(&self, input: &UnitNhwcFrame<W, H>) -> Result<Vec<f32>, ClassifierError> {
    let tensor = Tensor::from_array(input.to_array())
      .map_err(|e| ClassifierError::InferenceError(e.to_string()))?;

    let mut session = self.session.lock().map_err(|_| ClassifierError::Poisoned)?;

    debug!("执行分类推理");
    let outputs = session
      .run(ort::inputs![tensor])
      .map_err(|e| ClassifierError::InferenceError(e.to_string()))?;

    let (shape, data) = outputs[0]
      .try_extract_tensor::<f32>()
      .map_err(|e| ClassifierError::InferenceError(e.to_string()))?;
    debug!("分类输出形状: {:?}", shape);

    Ok(data.to_vec())
  }
}

impl<const W: u32, const H: u32> Model for OnnxClassifier<W, H> {
  type Input = UnitNhwcFrame<W, H>;
  type Output = Prediction;
  type Error = ClassifierError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let probabilities = self.run(input)?;

    if let Some(expected) = self.num_classes
      && expected != probabilities.len()
    {
      error!(
        "预期模型输出类别数为 {}, 实际为 {}",
        expected,
        probabilities.len()
      );
      return Err(ClassifierError::ClassCountMismatch {
        expected,
        actual: probabilities.len(),
      });
    }

    let prediction =
      Prediction::from_probabilities(probabilities).ok_or(ClassifierError::EmptyOutput)?;
    debug!(
      "分类结果: 类别 {}, 置信度 {:.4}",
      prediction.class_id, prediction.confidence
    );
    Ok(prediction)
  }
}
