// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/model/background.rs - 背景去除模型
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

use image::{GrayImage, Luma, RgbImage, RgbaImage, imageops::FilterType};
use ndarray::Array4;
use ort::{session::Session, value::Tensor};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Model, SessionError, build_session},
  url_file_path,
};

const U2NET_INPUT_SIZE: u32 = 320;
const U2NET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const U2NET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Error, Debug)]
pub enum BackgroundError {
  #[error("模型会话错误: {0}")]
  SessionError(#[from] SessionError),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("推理错误: {0}")]
  InferenceError(String),
  #[error("掩码输出过小: {actual} 个值, 期望至少 {expected} 个")]
  MaskTooSmall { expected: usize, actual: usize },
  #[error("推理会话锁已损坏")]
  Poisoned,
}

/// U²-Net 显著目标分割模型，输出前景掩码作为透明通道
pub struct U2NetRemover {
  session: Mutex<Session>,
}

pub struct U2NetBuilder {
  model_path: PathBuf,
}

impl FromUrlWithScheme for U2NetBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for U2NetBuilder {
  type Error = BackgroundError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(BackgroundError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }
    Ok(U2NetBuilder {
      model_path: url_file_path(url),
    })
  }
}

impl U2NetBuilder {
  pub fn build(self) -> Result<U2NetRemover, BackgroundError> {
    let session = build_session(&self.model_path, "背景分割")?;
    Ok(U2NetRemover {
      session: Mutex::new(session),
    })
  }
}

/// 缩放到 320x320，按图像最大值归一化后做均值方差标准化，NCHW 排列
fn u2net_input(image: &RgbImage) -> Array4<f32> {
  let side = U2NET_INPUT_SIZE;
  let resized = image::imageops::resize(image, side, side, FilterType::Lanczos3);

  let max = resized
    .as_raw()
    .iter()
    .copied()
    .max()
    .map(|v| (v as f32).max(1e-6))
    .unwrap_or(1e-6);

  let side = side as usize;
  let mut array = Array4::<f32>::zeros((1, 3, side, side));
  for (x, y, pixel) in resized.enumerate_pixels() {
    for c in 0..3 {
      let value = pixel[c] as f32 / max;
      array[[0, c, y as usize, x as usize]] = (value - U2NET_MEAN[c]) / U2NET_STD[c];
    }
  }
  array
}

/// 最小最大值归一化到 [0, 255] 并缩放回原始尺寸
fn mask_from_prediction(
  prediction: &[f32],
  width: u32,
  height: u32,
) -> Result<GrayImage, BackgroundError> {
  let side = U2NET_INPUT_SIZE as usize;
  let expected = side * side;
  if prediction.len() < expected {
    return Err(BackgroundError::MaskTooSmall {
      expected,
      actual: prediction.len(),
    });
  }

  // 第一张输出图的第 0 个通道
  let plane = &prediction[..expected];
  let (min, max) = plane
    .iter()
    .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
  let range = max - min;

  let mask = GrayImage::from_fn(U2NET_INPUT_SIZE, U2NET_INPUT_SIZE, |x, y| {
    let v = plane[y as usize * side + x as usize];
    let scaled = if range > f32::EPSILON {
      (v - min) / range
    } else {
      0.0
    };
    Luma([(scaled * 255.0).clamp(0.0, 255.0) as u8])
  });

  Ok(image::imageops::resize(
    &mask,
    width,
    height,
    FilterType::Lanczos3,
  ))
}

/// 按掩码把原图混合到透明黑色上，掩码同时作为透明通道
///
/// 颜色已乘过一次透明度，之后贴到黑色背景上边缘会再衰减一次。
fn apply_mask(image: &RgbImage, mask: &GrayImage) -> RgbaImage {
  RgbaImage::from_fn(image.width(), image.height(), |x, y| {
    let [r, g, b] = image.get_pixel(x, y).0;
    let alpha = mask.get_pixel(x, y)[0];
    let blend = |c: u8| ((c as u32 * alpha as u32 + 127) / 255) as u8;
    image::Rgba([blend(r), blend(g), blend(b), alpha])
  })
}

impl Model for U2NetRemover {
  type Input = RgbImage;
  type Output = RgbaImage;
  type Error = BackgroundError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let (width, height) = input.dimensions();
    debug!("背景去除: {}x{}", width, height);

    let tensor = Tensor::from_array(u2net_input(input))
      .map_err(|e| BackgroundError::InferenceError(e.to_string()))?;

    let prediction = {
      let mut session = self.session.lock().map_err(|_| BackgroundError::Poisoned)?;
      let outputs = session
        .run(ort::inputs![tensor])
        .map_err(|e| BackgroundError::InferenceError(e.to_string()))?;
      let (_, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| BackgroundError::InferenceError(e.to_string()))?;
      data.to_vec()
    };

    let mask = mask_from_prediction(&prediction, width, height)?;
    Ok(apply_mask(input, &mask))
  }
}

/// 不做背景去除，整张图像保持不透明
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRemover;

impl Model for PassthroughRemover {
  type Input = RgbImage;
  type Output = RgbaImage;
  type Error = BackgroundError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(image::DynamicImage::ImageRgb8(input.clone()).to_rgba8())
  }
}

pub enum BackgroundRemover {
  U2Net(U2NetRemover),
  Passthrough(PassthroughRemover),
}

impl BackgroundRemover {
  pub fn from_optional_url(url: Option<&Url>) -> Result<Self, BackgroundError> {
    match url {
      Some(url) => Ok(BackgroundRemover::U2Net(U2NetBuilder::from_url(url)?.build()?)),
      None => {
        warn!("未指定背景分割模型，跳过背景去除");
        Ok(BackgroundRemover::Passthrough(PassthroughRemover))
      }
    }
  }
}

impl Model for BackgroundRemover {
  type Input = RgbImage;
  type Output = RgbaImage;
  type Error = BackgroundError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    match self {
      BackgroundRemover::U2Net(model) => model.infer(input),
      BackgroundRemover::Passthrough(model) => model.infer(input),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn input_is_normalized_by_image_maximum() {
    let image = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
    let array = u2net_input(&image);
    assert_eq!(array.shape(), &[1, 3, 320, 320]);
    // 最大值为 128，归一化后为 1.0
    let expected = (1.0 - U2NET_MEAN[0]) / U2NET_STD[0];
    assert!((array[[0, 0, 5, 5]] - expected).abs() < 0.05);
  }

  #[test]
  fn mask_is_stretched_to_full_range() {
    let side = U2NET_INPUT_SIZE as usize;
    let mut prediction = vec![0.2f32; side * side];
    for v in prediction.iter_mut().take(side * side / 2) {
      *v = 0.9;
    }
    let mask = mask_from_prediction(&prediction, 32, 32).unwrap();
    assert_eq!(mask.dimensions(), (32, 32));
    assert!(mask.get_pixel(16, 2)[0] >= 250);
    assert!(mask.get_pixel(16, 30)[0] <= 5);
  }

  #[test]
  fn short_mask_output_is_an_error() {
    assert!(matches!(
      mask_from_prediction(&[0.0; 16], 4, 4),
      Err(BackgroundError::MaskTooSmall { .. })
    ));
  }

  #[test]
  fn passthrough_keeps_image_opaque() {
    let image = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
    let cutout = PassthroughRemover.infer(&image).unwrap();
    assert_eq!(cutout.dimensions(), (3, 2));
    assert!(cutout.pixels().all(|p| p.0 == [10, 20, 30, 255]));
  }

  #[test]
  fn mask_becomes_alpha_channel() {
    let image = RgbImage::from_pixel(3, 1, Rgb([200, 100, 50]));
    let mut mask = GrayImage::new(3, 1);
    mask.put_pixel(1, 0, Luma([255]));
    mask.put_pixel(2, 0, Luma([128]));
    let cutout = apply_mask(&image, &mask);
    assert_eq!(cutout.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(cutout.get_pixel(1, 0).0, [200, 100, 50, 255]);
    assert_eq!(cutout.get_pixel(2, 0).0, [100, 50, 25, 128]);
  }

  #[test]
  fn soft_edges_are_attenuated_twice_on_black() {
    let image = RgbImage::from_pixel(1, 1, Rgb([200, 100, 52]));
    let mask = GrayImage::from_pixel(1, 1, Luma([128]));
    let composed = crate::model::composite_on_black(&apply_mask(&image, &mask));
    // 200 * 0.502 * 0.502
    assert_eq!(composed.get_pixel(0, 0).0, [50, 25, 13]);
  }
}
