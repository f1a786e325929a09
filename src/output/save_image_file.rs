// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/output/save_image_file.rs - 保存标注图像文件
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

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::frame::SourceImage;
use crate::output::{
  FrameOverlay, Render,
  draw::{Rasterizer, RasterizerError},
};
use crate::{FromUrl, FromUrlWithScheme};

/// 把标注后的图像存成单个文件
///
/// `image:///path/to/out.png?font=/path/to/font.ttf`，
/// 字体参数缺省时探测系统字体。
pub struct SaveImageFileOutput {
  path: String,
  rasterizer: Rasterizer,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("字体错误: {0}")]
  FontError(#[from] RasterizerError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let rasterizer = match url.query_pairs().find(|(key, _)| key == "font") {
      Some((_, font_path)) => Rasterizer::with_font_file(font_path.into_owned())?,
      None => Rasterizer::default(),
    };

    Ok(SaveImageFileOutput {
      path: crate::percent_decoded_path(url),
      rasterizer,
    })
  }
}

impl SaveImageFileOutput {
  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    warn!("保存图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render<SourceImage, FrameOverlay> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &SourceImage, result: &FrameOverlay) -> Result<(), Self::Error> {
    let mut image = frame.image.clone();
    self.rasterizer.draw(&mut image, &result.primitives);
    self.save_image(image)
  }
}
