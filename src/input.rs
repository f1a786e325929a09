// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/input.rs - 图像输入
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

use thiserror::Error;

use crate::FromUrl;
use crate::frame::SourceImage;

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[cfg(feature = "read_image_directory")]
mod read_image_directory;
#[cfg(feature = "read_image_directory")]
pub use self::read_image_directory::{ImageDirectoryInput, ImageDirectoryInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[cfg(feature = "read_image_directory")]
  #[error("Image directory input error: {0}")]
  ImageDirectoryInputError(#[from] ImageDirectoryInputError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

pub enum InputWrapper {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
  #[cfg(feature = "read_image_directory")]
  ReadImageDirectory(ImageDirectoryInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::SCHEME {
        let input = ImageFileInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageFile(input));
      }
    }
    #[cfg(feature = "read_image_directory")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageDirectoryInput::SCHEME {
        let input = ImageDirectoryInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageDirectory(input));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

impl InputWrapper {
  pub fn into_frames(self) -> InputWrapperFrames {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => InputWrapperFrames::ReadImageFile(input.into_frames()),
      #[cfg(feature = "read_image_directory")]
      InputWrapper::ReadImageDirectory(input) => {
        InputWrapperFrames::ReadImageDirectory(input.into_frames())
      }
    }
  }
}

pub enum InputWrapperFrames {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(self::read_image_file::ImageFileInputFrames),
  #[cfg(feature = "read_image_directory")]
  ReadImageDirectory(self::read_image_directory::ImageDirectoryInputFrames),
}

impl Iterator for InputWrapperFrames {
  type Item = SourceImage;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapperFrames::ReadImageFile(input) => input.next(),
      #[cfg(feature = "read_image_directory")]
      InputWrapperFrames::ReadImageDirectory(input) => input.next(),
    }
  }
}
