// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/model.rs - 模型
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

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 分类结果：概率最大的类别及其概率
#[derive(Debug, Clone)]
pub struct Prediction {
  pub class_id: usize,
  pub confidence: f32,
  pub probabilities: Box<[f32]>,
}

impl Prediction {
  /// 取第一个最大值的下标，概率为空时返回 `None`
  pub fn from_probabilities(probabilities: Vec<f32>) -> Option<Self> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &p) in probabilities.iter().enumerate() {
      match best {
        Some((_, max)) if p <= max => {}
        _ if p.is_nan() => {}
        _ => best = Some((index, p)),
      }
    }

    best.map(|(class_id, confidence)| Prediction {
      class_id,
      confidence,
      probabilities: probabilities.into_boxed_slice(),
    })
  }

  pub fn num_classes(&self) -> usize {
    self.probabilities.len()
  }
}

mod background;
mod classifier;
mod preprocess;
mod session;

pub use self::background::{
  BackgroundError, BackgroundRemover, PassthroughRemover, U2NetBuilder, U2NetRemover,
};
pub use self::classifier::{
  CLASSIFIER_INPUT_SIZE, ClassifierError, OnnxClassifier, OnnxClassifierBuilder, SignClassifier,
  SignFrame,
};
pub use self::preprocess::composite_on_black;
pub use self::session::{SessionError, build_session};
