// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/input/read_image_file.rs - 单个图像文件输入
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

use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{ImageInputError, Upload},
  url_local_path,
};

pub struct ImageFileInput {
  upload: Option<Upload>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageInputError::SchemeMismatch {
        expected: Self::SCHEME,
        found: url.scheme().to_string(),
      });
    }

    let path = url_local_path(url);
    let upload = Upload::from_path(Path::new(&path))?;
    debug!("读取上传文件: {} ({} 字节)", upload.name, upload.bytes.len());

    Ok(ImageFileInput {
      upload: Some(upload),
    })
  }
}

impl From<Upload> for ImageFileInput {
  fn from(upload: Upload) -> Self {
    Self {
      upload: Some(upload),
    }
  }
}

impl Iterator for ImageFileInput {
  type Item = Result<Upload, ImageInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.upload.take().map(Ok)
  }
}
