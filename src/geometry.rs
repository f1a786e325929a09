// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/geometry.rs - 归一化矩形与像素矩形
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

use serde::{Deserialize, Serialize};

/// 检测器原生约定下的矩形：归一化到 [0,1]，原点在左下角
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
  /// 左边缘 x 坐标
  pub x: f32,
  /// 下边缘 y 坐标（左下角原点）
  pub y: f32,
  /// 宽度
  pub width: f32,
  /// 高度
  pub height: f32,
}

/// 画布（显示表面）的像素尺寸，每次布局时重新给出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySurface {
  /// 表面宽度（像素）
  pub width: f32,
  /// 表面高度（像素）
  pub height: f32,
}

impl DisplaySurface {
  pub fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }
}

impl From<(u32, u32)> for DisplaySurface {
  fn from((width, height): (u32, u32)) -> Self {
    Self {
      width: width as f32,
      height: height as f32,
    }
  }
}

/// 展示约定下的矩形：归一化到 [0,1]，原点在左上角
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedRect {
  /// 左边缘 x 坐标
  pub x: f32,
  /// 上边缘 y 坐标（左上角原点）
  pub y: f32,
  /// 宽度
  pub width: f32,
  /// 高度
  pub height: f32,
}

impl NormalizedRect {
  /// 把左下角原点的矩形换算到左上角原点
  ///
  /// 朝向修正已经在检测器一侧完成，这里只做纵轴翻转：
  /// `y' = 1 - y - height`，x 与宽高原样保留。
  pub fn from_bottom_left(raw: &RawBox) -> Self {
    Self {
      x: raw.x,
      y: 1.0 - raw.y - raw.height,
      width: raw.width,
      height: raw.height,
    }
  }

  /// 把矩形钳制进单位正方形
  ///
  /// 先钳制原点，再以 `min(width, 1 - x)` / `min(height, 1 - y)` 钳制尺寸，
  /// 检测器在图像边缘的浮点越界由此吸收；该操作是幂等的。
  pub fn clamp_unit(mut self) -> Self {
    self.x = self.x.clamp(0.0, 1.0);
    self.y = self.y.clamp(0.0, 1.0);
    self.width = self.width.min(1.0 - self.x);
    self.height = self.height.min(1.0 - self.y);
    self
  }

  /// 钳制之后宽或高不为正的矩形视为退化矩形
  pub fn is_degenerate(&self) -> bool {
    !(self.width > 0.0 && self.height > 0.0) || !self.x.is_finite() || !self.y.is_finite()
  }

  /// 按显示表面的像素尺寸做逐分量线性缩放
  ///
  /// 不做任何纵横比补偿：归一化坐标如何铺满表面由表面自己决定。
  pub fn scale_to(&self, surface: DisplaySurface) -> PixelRect {
    PixelRect {
      x: self.x * surface.width,
      y: self.y * surface.height,
      width: self.width * surface.width,
      height: self.height * surface.height,
    }
  }
}

/// 表面像素坐标系下的矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

#[cfg(test)]
mod tests {
  use super::*;

  const EPS: f32 = 1e-6;

  #[test]
  fn flip_converts_bottom_left_to_top_left() {
    let raw = RawBox {
      x: 0.1,
      y: 0.2,
      width: 0.3,
      height: 0.4,
    };
    let rect = NormalizedRect::from_bottom_left(&raw);
    assert!((rect.x - 0.1).abs() < EPS);
    assert!((rect.y - 0.4).abs() < EPS);
    assert!((rect.width - 0.3).abs() < EPS);
    assert!((rect.height - 0.4).abs() < EPS);
  }

  #[test]
  fn flip_is_self_inverse() {
    let y = 0.2f32;
    let height = 0.4f32;
    let once = 1.0 - y - height;
    let twice = 1.0 - once - height;
    assert!((twice - y).abs() < EPS);
  }

  #[test]
  fn clamp_is_idempotent() {
    let rect = NormalizedRect {
      x: -0.2,
      y: 0.7,
      width: 0.9,
      height: 0.8,
    };
    let once = rect.clamp_unit();
    let twice = once.clamp_unit();
    assert_eq!(once, twice);
  }

  #[test]
  fn clamp_shrinks_edge_overshoot() {
    // 检测器在右边缘多给了一点宽度
    let rect = NormalizedRect {
      x: 0.9,
      y: 0.9,
      width: 0.3,
      height: 0.1,
    }
    .clamp_unit();
    assert!((rect.width - 0.1).abs() < EPS);
    assert!(!rect.is_degenerate());
  }

  #[test]
  fn clamp_keeps_degenerate_detectable() {
    let rect = NormalizedRect {
      x: 1.0,
      y: 0.0,
      width: 0.5,
      height: 0.5,
    }
    .clamp_unit();
    assert!(rect.is_degenerate());
  }

  #[test]
  fn non_finite_shape_is_degenerate() {
    let rect = NormalizedRect {
      x: f32::NAN,
      y: 0.0,
      width: 0.5,
      height: 0.5,
    }
    .clamp_unit();
    assert!(rect.is_degenerate());

    let rect = NormalizedRect {
      x: 0.0,
      y: 0.0,
      width: f32::NAN,
      height: 0.5,
    };
    assert!(rect.is_degenerate());
  }

  #[test]
  fn scale_is_componentwise() {
    let rect = NormalizedRect {
      x: 0.25,
      y: 0.25,
      width: 0.5,
      height: 0.5,
    };
    let px = rect.scale_to(DisplaySurface::new(400.0, 300.0));
    assert_eq!(px.x, 100.0);
    assert_eq!(px.y, 75.0);
    assert_eq!(px.width, 200.0);
    assert_eq!(px.height, 150.0);
  }
}
