// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/input.rs - 上传图像输入
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

use crate::FromUrl;

/// 允许上传的图像扩展名
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// 一次上传：文件名与未解码的原始字节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
  pub name: String,
  pub bytes: Vec<u8>,
}

impl Upload {
  pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self {
      name: name.into(),
      bytes,
    }
  }

  pub fn from_path(path: &Path) -> Result<Self, ImageInputError> {
    if !has_supported_extension(path) {
      return Err(ImageInputError::UnsupportedExtension(
        path.display().to_string(),
      ));
    }

    let bytes = std::fs::read(path)?;
    let name = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());
    Ok(Self { name, bytes })
  }
}

pub fn has_supported_extension(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
    })
    .unwrap_or(false)
}

#[derive(Error, Debug)]
pub enum ImageInputError {
  #[error("URI scheme mismatch: expected '{expected}', found '{found}'")]
  SchemeMismatch {
    expected: &'static str,
    found: String,
  },
  #[error("不支持的文件类型 (仅支持 jpg/jpeg/png): {0}")]
  UnsupportedExtension(String),
  #[error("不是目录: {0}")]
  NotADirectory(String),
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
}

mod read_image_file;
pub use self::read_image_file::ImageFileInput;

#[cfg(feature = "folder_input")]
mod folder_input;
#[cfg(feature = "folder_input")]
pub use self::folder_input::FolderInput;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("Image file input error: {0}")]
  ImageInputError(#[from] ImageInputError),
  #[error("URI scheme mismatch: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper {
  ReadImageFile(ImageFileInput),
  #[cfg(feature = "folder_input")]
  Folder(FolderInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    use crate::FromUrlWithScheme;

    if url.scheme() == ImageFileInput::SCHEME {
      let input = ImageFileInput::from_url(url)?;
      return Ok(InputWrapper::ReadImageFile(input));
    }
    #[cfg(feature = "folder_input")]
    {
      if url.scheme() == FolderInput::SCHEME {
        let input = FolderInput::from_url(url)?;
        return Ok(InputWrapper::Folder(input));
      }
    }
    Err(InputError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl Iterator for InputWrapper {
  type Item = Result<Upload, ImageInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::ReadImageFile(input) => input.next(),
      #[cfg(feature = "folder_input")]
      InputWrapper::Folder(input) => input.next(),
    }
  }
}
