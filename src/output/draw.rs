// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/output/draw.rs - 结果面板绘制
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

use std::path::Path;

use ab_glyph::{FontVec, InvalidFont, PxScale};
use image::{Rgb, RgbImage, imageops::FilterType};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use thiserror::Error;
use tracing::{debug, info};

use crate::{catalog::Translation, input::Upload, pipeline::Outcome};

// 面板布局常量
const TILE_SIZE: u32 = 256;
const TILE_GAP: u32 = 8;
const HEADER_HEIGHT: u32 = 40;
const FONT_SIZE: f32 = 24.0;
const TEXT_PADDING: i32 = 8;
const PANEL_BACKGROUND: [u8; 3] = [24, 24, 24];
const TEXT_COLOR: [u8; 3] = [255, 255, 255];

const MAPPED_COLOR: [u8; 3] = [0, 120, 60];
const NO_EQUIVALENT_COLOR: [u8; 3] = [190, 110, 0];
const UNMAPPED_COLOR: [u8; 3] = [70, 70, 70];
const FAILURE_COLOR: [u8; 3] = [170, 20, 20];

#[derive(Error, Debug)]
pub enum PanelError {
  #[error("无法读取字体文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无效的字体文件: {0}")]
  InvalidFont(#[from] InvalidFont),
}

/// 上传图像、去背景图像与参考图像并排的结果面板
///
/// 没有字体时只绘制标题栏颜色，不绘制文字。
pub struct Panel {
  font: Option<FontVec>,
  font_size: f32,
}

impl Default for Panel {
  fn default() -> Self {
    Panel::new(None)
  }
}

impl Panel {
  pub fn new(font: Option<FontVec>) -> Self {
    Panel {
      font,
      font_size: FONT_SIZE,
    }
  }

  pub fn load(font_path: Option<&Path>) -> Result<Self, PanelError> {
    let font = match font_path {
      Some(path) => {
        info!("加载面板字体: {}", path.display());
        let data = std::fs::read(path)?;
        Some(FontVec::try_from_vec(data)?)
      }
      None => None,
    };
    Ok(Panel::new(font))
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  pub fn draw_outcome(&self, outcome: &Outcome) -> RgbImage {
    let color = match outcome.translation {
      Translation::Mapped { .. } => MAPPED_COLOR,
      Translation::NoEquivalent { .. } => NO_EQUIVALENT_COLOR,
      Translation::Unmapped(_) => UNMAPPED_COLOR,
    };
    let title = format!(
      "{} ({:.2}) -> {}",
      outcome.predicted_label, outcome.confidence, outcome.translation
    );
    self.compose(
      &[
        &outcome.uploaded,
        &outcome.cleaned,
        &outcome.reference_image,
      ],
      color,
      &title,
    )
  }

  /// 失败时只绘制能解码的上传图像
  pub fn draw_failure(&self, upload: &Upload, error: &anyhow::Error) -> RgbImage {
    let title = format!("{}: {}", upload.name, error);
    match image::load_from_memory(&upload.bytes) {
      Ok(image) => self.compose(&[&image.to_rgb8()], FAILURE_COLOR, &title),
      Err(_) => self.compose(&[], FAILURE_COLOR, &title),
    }
  }

  fn compose(&self, tiles: &[&RgbImage], header_color: [u8; 3], title: &str) -> RgbImage {
    let columns = tiles.len().max(1) as u32;
    let width = columns * TILE_SIZE + (columns + 1) * TILE_GAP;
    let height = HEADER_HEIGHT + TILE_SIZE + 2 * TILE_GAP;
    let mut panel = RgbImage::from_pixel(width, height, Rgb(PANEL_BACKGROUND));

    let header = imageproc::rect::Rect::at(0, 0).of_size(width, HEADER_HEIGHT);
    draw_filled_rect_mut(&mut panel, header, Rgb(header_color));

    for (index, tile) in tiles.iter().enumerate() {
      let tile = fit_tile(tile);
      let x = TILE_GAP + index as u32 * (TILE_SIZE + TILE_GAP);
      let y = HEADER_HEIGHT + TILE_GAP;
      image::imageops::overlay(&mut panel, &tile, x as i64, y as i64);
    }

    if let Some(font) = &self.font {
      draw_text_mut(
        &mut panel,
        Rgb(TEXT_COLOR),
        TEXT_PADDING,
        TEXT_PADDING,
        PxScale::from(self.font_size),
        font,
        title,
      );
    } else {
      debug!("未加载字体，面板标题不绘制文字: {}", title);
    }

    panel
  }
}

/// 保持宽高比缩放到方形格子中，居中并用黑色填充
fn fit_tile(image: &RgbImage) -> RgbImage {
  let mut tile = RgbImage::new(TILE_SIZE, TILE_SIZE);
  let (width, height) = image.dimensions();
  if width == 0 || height == 0 {
    return tile;
  }

  let scale = (TILE_SIZE as f32 / width as f32).min(TILE_SIZE as f32 / height as f32);
  let new_width = ((width as f32 * scale).round() as u32).clamp(1, TILE_SIZE);
  let new_height = ((height as f32 * scale).round() as u32).clamp(1, TILE_SIZE);
  let resized = image::imageops::resize(image, new_width, new_height, FilterType::Triangle);

  let x = (TILE_SIZE - new_width) / 2;
  let y = (TILE_SIZE - new_height) / 2;
  image::imageops::overlay(&mut tile, &resized, x as i64, y as i64);
  tile
}
