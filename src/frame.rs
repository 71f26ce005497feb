// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/frame.rs - NHWC 浮点帧定义
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

use image::{RgbImage, imageops::FilterType};
use ndarray::Array4;

const RGB_CHANNELS: usize = 3;

pub trait AsNhwcTensor<const W: u32, const H: u32> {
  fn as_nhwc(&self) -> &[f32];
}

/// 像素值缩放到 [0, 1] 的 NHWC 帧，批大小固定为 1
#[derive(Debug, Clone)]
pub struct UnitNhwcFrame<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> Default for UnitNhwcFrame<W, H> {
  fn default() -> Self {
    let size = RGB_CHANNELS * (W as usize) * (H as usize);
    let data = vec![0f32; size].into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> UnitNhwcFrame<W, H> {
  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 转换为 `[1, H, W, 3]` 形状的数组
  pub fn to_array(&self) -> Array4<f32> {
    let shape = (1, self.height(), self.width(), self.channels());
    Array4::from_shape_vec(shape, self.data.to_vec())
      .expect("帧数据长度由类型参数保证为 W * H * 3")
  }
}

impl<const W: u32, const H: u32> AsMut<[f32]> for UnitNhwcFrame<W, H> {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsNhwcTensor<W, H> for UnitNhwcFrame<W, H> {
  fn as_nhwc(&self) -> &[f32] {
    &self.data
  }
}

impl<const W: u32, const H: u32> From<&RgbImage> for UnitNhwcFrame<W, H> {
  fn from(image: &RgbImage) -> Self {
    let resized = if image.dimensions() == (W, H) {
      image.clone()
    } else {
      // 与 PIL 的默认 resize 一致，使用双三次插值
      image::imageops::resize(image, W, H, FilterType::CatmullRom)
    };

    let mut frame = Self::default();
    let width = frame.width();
    let channels = frame.channels();
    let slice = frame.as_mut();

    for (x, y, pixel) in resized.enumerate_pixels() {
      let base = (y as usize) * width * channels + (x as usize) * channels;
      for c in 0..channels {
        slice[base + c] = pixel[c] as f32 / 255.0;
      }
    }
    frame
  }
}
