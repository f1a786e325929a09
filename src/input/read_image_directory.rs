// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/input/read_image_directory.rs - 图像目录批量输入
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

use std::path::PathBuf;

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::frame::SourceImage;
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum ImageDirectoryInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("not a directory: {0}")]
  NotADirectory(String),
  #[error("I/O error: {0}")]
  IoError(std::io::Error),
}

impl From<std::io::Error> for ImageDirectoryInputError {
  fn from(err: std::io::Error) -> Self {
    ImageDirectoryInputError::IoError(err)
  }
}

const READ_IMAGE_DIRECTORY_SCHEME: &str = "folder";

/// 与 Cargo 特性保持一致的可解码扩展名
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 目录批量输入
///
/// `folder:///path/to/dir`，按文件名排序逐张产出目录里的图像。
/// 没有可随行的 EXIF 元数据来源，目录里的图像一律按正立处理。
pub struct ImageDirectoryInput {
  files: Vec<PathBuf>,
}

impl FromUrlWithScheme for ImageDirectoryInput {
  const SCHEME: &'static str = READ_IMAGE_DIRECTORY_SCHEME;
}

impl FromUrl for ImageDirectoryInput {
  type Error = ImageDirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageDirectoryInputError::SchemaMismatch);
    }

    let dir = PathBuf::from(crate::percent_decoded_path(url));
    if !dir.is_dir() {
      return Err(ImageDirectoryInputError::NotADirectory(
        dir.display().to_string(),
      ));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
      .filter_map(|entry| entry.ok())
      .map(|entry| entry.path())
      .filter(|path| path.is_file())
      .collect();
    files.sort();

    info!("目录 {} 下共 {} 个文件", dir.display(), files.len());
    Ok(ImageDirectoryInput { files })
  }
}

impl ImageDirectoryInput {
  pub fn into_frames(self) -> ImageDirectoryInputFrames {
    ImageDirectoryInputFrames {
      files: self.files.into_iter(),
    }
  }
}

pub struct ImageDirectoryInputFrames {
  files: std::vec::IntoIter<PathBuf>,
}

impl Iterator for ImageDirectoryInputFrames {
  type Item = SourceImage;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      let recognized = path
        .extension()
        .map(|ext| {
          let ext = ext.to_string_lossy().to_lowercase();
          IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false);
      if !recognized {
        debug!("跳过非图像文件: {}", path.display());
        continue;
      }

      let reader = match ImageReader::open(&path) {
        Ok(reader) => reader,
        Err(e) => {
          warn!("图像 {} 打开失败，跳过: {}", path.display(), e);
          continue;
        }
      };
      let image = match reader.decode() {
        Ok(image) => image,
        Err(e) => {
          warn!("图像 {} 解码失败，跳过: {}", path.display(), e);
          continue;
        }
      };

      let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
      return Some(SourceImage::upright(name, image.into()));
    }
    None
  }
}
