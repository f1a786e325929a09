// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/frame.rs - 源图像定义
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

use image::RgbImage;

use crate::geometry::DisplaySurface;
use crate::orientation::ImageOrientation;

/// 一张待检测的源图像及其随身元数据
#[derive(Debug, Clone)]
pub struct SourceImage {
  /// 来源名，通常是文件名，输出端用它命名产物
  pub name: String,
  pub image: RgbImage,
  /// 像素缓冲相对正立呈现的朝向
  pub orientation: ImageOrientation,
}

impl SourceImage {
  pub fn new(name: impl Into<String>, image: RgbImage, orientation: ImageOrientation) -> Self {
    Self {
      name: name.into(),
      image,
      orientation,
    }
  }

  /// 朝向未知或无关时按正立构造
  pub fn upright(name: impl Into<String>, image: RgbImage) -> Self {
    Self::new(name, image, ImageOrientation::Up)
  }

  /// 以图像自身的像素尺寸作为呈现面
  pub fn display_surface(&self) -> DisplaySurface {
    DisplaySurface::from((self.image.width(), self.image.height()))
  }
}
