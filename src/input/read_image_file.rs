// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::ImageReader;
use thiserror::Error;
use tracing::{error, warn};
use url::Url;

use crate::frame::SourceImage;
use crate::orientation::ImageOrientation;
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(image::ImageError),
}

impl From<std::io::Error> for ImageFileInputError {
  fn from(err: std::io::Error) -> Self {
    ImageFileInputError::IoError(err)
  }
}

impl From<image::ImageError> for ImageFileInputError {
  fn from(err: image::ImageError) -> Self {
    ImageFileInputError::ImageLoadError(err)
  }
}

const READ_IMAGE_FILE_SCHEME: &str = "image";
const ORIENTATION_QUERY: &str = "orientation";

/// 单张图像文件输入
///
/// `image:///path/to/photo.jpg?orientation=6`，朝向取 EXIF 数值，
/// 缺省按正立。解码在构造时完成，坏文件当场报错。
pub struct ImageFileInput {
  frame: Option<SourceImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = READ_IMAGE_FILE_SCHEME;
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = crate::percent_decoded_path(url);
    let orientation = orientation_from_query(url);

    let image = ImageReader::open(&path)?.decode()?;
    let name = Path::new(&path)
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.clone());

    Ok(ImageFileInput {
      frame: Some(SourceImage::new(name, image.into(), orientation)),
    })
  }
}

impl ImageFileInput {
  pub fn into_frames(self) -> ImageFileInputFrames {
    ImageFileInputFrames { inner: self }
  }
}

pub struct ImageFileInputFrames {
  inner: ImageFileInput,
}

impl Iterator for ImageFileInputFrames {
  type Item = SourceImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.frame.take()
  }
}

fn orientation_from_query(url: &Url) -> ImageOrientation {
  for (key, value) in url.query_pairs() {
    if key == ORIENTATION_QUERY {
      return match value.parse::<u16>() {
        Ok(tag) => ImageOrientation::from_exif(tag),
        Err(_) => {
          warn!("朝向参数 '{}' 不是数字，按正立处理", value);
          ImageOrientation::Up
        }
      };
    }
  }
  ImageOrientation::Up
}

#[cfg(test)]
mod tests {
  use image::RgbImage;

  use super::*;

  fn write_png(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    RgbImage::new(3, 2).save(&path).unwrap();
    path.display().to_string()
  }

  #[test]
  fn yields_exactly_one_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "photo.png");

    let url = Url::parse(&format!("image://{}", path)).unwrap();
    let mut frames = ImageFileInput::from_url(&url).unwrap().into_frames();

    let frame = frames.next().unwrap();
    assert_eq!(frame.name, "photo.png");
    assert_eq!(frame.orientation, ImageOrientation::Up);
    assert_eq!(frame.image.dimensions(), (3, 2));
    assert!(frames.next().is_none());
  }

  #[test]
  fn orientation_comes_from_query() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "photo.png");

    let url = Url::parse(&format!("image://{}?orientation=6", path)).unwrap();
    let frame = ImageFileInput::from_url(&url)
      .unwrap()
      .into_frames()
      .next()
      .unwrap();
    assert_eq!(frame.orientation, ImageOrientation::Right);

    // 非法取值退回正立
    let url = Url::parse(&format!("image://{}?orientation=abc", path)).unwrap();
    let frame = ImageFileInput::from_url(&url)
      .unwrap()
      .into_frames()
      .next()
      .unwrap();
    assert_eq!(frame.orientation, ImageOrientation::Up);
  }

  #[test]
  fn scheme_is_checked() {
    let url = Url::parse("file:///tmp/photo.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));
  }

  #[test]
  fn missing_file_fails_at_construction() {
    let url = Url::parse("image:///no/such/photo.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::IoError(_))
    ));
  }
}
