// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/output/draw.rs - 绘制指令的光栅化
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{debug, warn};

use crate::geometry::PixelRect;
use crate::overlay::DrawPrimitive;

/// 缺省字体的常见安装位置，按顺序尝试
const WELL_KNOWN_FONTS: [&str; 4] = [
  "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/TTF/DejaVuSans.ttf",
  "/usr/share/fonts/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
];

#[derive(Error, Debug)]
pub enum RasterizerError {
  #[error("无法读取字体文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 把绘制指令落到 RGB 图像上的基本光栅器
///
/// 描边框与标签底色不依赖字体；标签文本只在有字体时绘制，
/// 找不到字体不是错误，只是少画一层。
pub struct Rasterizer {
  font: Option<FontArc>,
}

impl Default for Rasterizer {
  fn default() -> Self {
    for path in WELL_KNOWN_FONTS {
      if let Ok(data) = std::fs::read(path)
        && let Ok(font) = FontArc::try_from_vec(data)
      {
        debug!("使用系统字体: {}", path);
        return Self { font: Some(font) };
      }
    }
    warn!("找不到可用字体，标签文本将不被绘制");
    Self { font: None }
  }
}

impl Rasterizer {
  /// 从指定字体文件构造
  pub fn with_font_file<P: AsRef<Path>>(path: P) -> Result<Self, RasterizerError> {
    let data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(data)?;
    Ok(Self { font: Some(font) })
  }

  /// 明确不带字体构造，只画框和底色
  pub fn without_font() -> Self {
    Self { font: None }
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  /// 依次执行一批绘制指令
  pub fn draw(&self, image: &mut RgbImage, primitives: &[DrawPrimitive]) {
    for primitive in primitives {
      match primitive {
        DrawPrimitive::StrokeRect {
          rect,
          color,
          stroke_width,
          // 基本光栅器画直角，圆角参数留给更讲究的呈现层
          corner_radius: _,
        } => {
          self.stroke_rect(image, rect, *color, *stroke_width);
        }
        DrawPrimitive::FillRect { rect, color } => {
          if let Some(rect) = clipped_rect(image, rect) {
            draw_filled_rect_mut(image, rect, Rgb(*color));
          }
        }
        DrawPrimitive::Text {
          x,
          y,
          content,
          color,
          font_size,
        } => {
          let Some(font) = &self.font else {
            debug!("没有字体，跳过文本: {}", content);
            continue;
          };
          draw_text_mut(
            image,
            Rgb(*color),
            x.round() as i32,
            y.round() as i32,
            PxScale::from(*font_size),
            font,
            content,
          );
        }
      }
    }
  }

  fn stroke_rect(&self, image: &mut RgbImage, rect: &PixelRect, color: [u8; 3], width: f32) {
    let Some(outer) = clipped_rect(image, rect) else {
      return;
    };
    let thickness = width.round().max(1.0) as i32;
    // 每圈向内收一像素，叠出所需线宽
    for t in 0..thickness {
      let w = outer.width() as i32 - 2 * t;
      let h = outer.height() as i32 - 2 * t;
      if w <= 0 || h <= 0 {
        break;
      }
      let ring = Rect::at(outer.left() + t, outer.top() + t).of_size(w as u32, h as u32);
      draw_hollow_rect_mut(image, ring, Rgb(color));
    }
  }
}

/// 像素矩形取整并与图像求交，完全在界外时返回 None
fn clipped_rect(image: &RgbImage, rect: &PixelRect) -> Option<Rect> {
  let x = rect.x.round() as i32;
  let y = rect.y.round() as i32;
  let width = rect.width.round() as i32;
  let height = rect.height.round() as i32;

  let x0 = x.max(0);
  let y0 = y.max(0);
  let x1 = (x + width).min(image.width() as i32);
  let y1 = (y + height).min(image.height() as i32);
  if x1 <= x0 || y1 <= y0 {
    return None;
  }
  Some(Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32))
}
