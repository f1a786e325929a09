// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/orientation.rs - 图像朝向解析
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

use tracing::warn;

/// 像素缓冲相对其正立呈现的朝向，对应 EXIF 的 8 种取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrientation {
  /// 正立（EXIF 1）
  Up,
  /// 正立镜像（EXIF 2）
  UpMirrored,
  /// 旋转 180°（EXIF 3）
  Down,
  /// 旋转 180° 并镜像（EXIF 4）
  DownMirrored,
  /// 左转镜像（EXIF 5）
  LeftMirrored,
  /// 需顺时针旋转 90° 扶正（EXIF 6）
  Right,
  /// 右转镜像（EXIF 7）
  RightMirrored,
  /// 需逆时针旋转 90° 扶正（EXIF 8）
  Left,
}

impl Default for ImageOrientation {
  fn default() -> Self {
    ImageOrientation::Up
  }
}

impl ImageOrientation {
  /// 从 EXIF 数值解析朝向，无法识别的取值按正立处理
  pub fn from_exif(value: u16) -> Self {
    match value {
      1 => ImageOrientation::Up,
      2 => ImageOrientation::UpMirrored,
      3 => ImageOrientation::Down,
      4 => ImageOrientation::DownMirrored,
      5 => ImageOrientation::LeftMirrored,
      6 => ImageOrientation::Right,
      7 => ImageOrientation::RightMirrored,
      8 => ImageOrientation::Left,
      other => {
        warn!("未知的朝向标记 {}，按正立处理", other);
        ImageOrientation::Up
      }
    }
  }
}

/// 以四分之一圈为单位的顺时针旋转量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterTurn {
  Zero,
  Quarter,
  Half,
  ThreeQuarter,
}

impl QuarterTurn {
  pub fn degrees(&self) -> u32 {
    match self {
      QuarterTurn::Zero => 0,
      QuarterTurn::Quarter => 90,
      QuarterTurn::Half => 180,
      QuarterTurn::ThreeQuarter => 270,
    }
  }
}

/// 交给检测器的朝向修正：检测器应在该坐标系里解读像素
///
/// 流水线的其余部分不解释这个值，它只在检测器调用边界被消费。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationCorrection {
  /// 扶正像素所需的顺时针旋转量
  pub rotation: QuarterTurn,
  /// 旋转之前是否需要水平镜像
  pub mirrored: bool,
}

impl OrientationCorrection {
  pub const UPRIGHT: Self = Self {
    rotation: QuarterTurn::Zero,
    mirrored: false,
  };
}

/// 朝向标记到修正值的固定查表，这里不做任何换算
pub fn resolve_orientation(orientation: ImageOrientation) -> OrientationCorrection {
  let (rotation, mirrored) = match orientation {
    ImageOrientation::Up => (QuarterTurn::Zero, false),
    ImageOrientation::UpMirrored => (QuarterTurn::Zero, true),
    ImageOrientation::Down => (QuarterTurn::Half, false),
    ImageOrientation::DownMirrored => (QuarterTurn::Half, true),
    ImageOrientation::LeftMirrored => (QuarterTurn::Quarter, true),
    ImageOrientation::Right => (QuarterTurn::Quarter, false),
    ImageOrientation::RightMirrored => (QuarterTurn::ThreeQuarter, true),
    ImageOrientation::Left => (QuarterTurn::ThreeQuarter, false),
  };
  OrientationCorrection { rotation, mirrored }
}
