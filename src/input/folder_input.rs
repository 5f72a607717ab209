// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/input/folder_input.rs - 目录批量输入
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

use std::{collections::VecDeque, path::PathBuf};

use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{ImageInputError, Upload, has_supported_extension},
  url_local_path,
};

/// 按文件名顺序逐个读取目录中的 jpg/jpeg/png 文件
pub struct FolderInput {
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for FolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for FolderInput {
  type Error = ImageInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ImageInputError::SchemeMismatch {
        expected: Self::SCHEME,
        found: url.scheme().to_string(),
      });
    }

    Self::open(PathBuf::from(url_local_path(url)))
  }
}

impl FolderInput {
  pub fn open(directory: PathBuf) -> Result<Self, ImageInputError> {
    if !directory.is_dir() {
      return Err(ImageInputError::NotADirectory(
        directory.display().to_string(),
      ));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let path = entry?.path();
      if path.is_file() && has_supported_extension(&path) {
        files.push(path);
      } else {
        debug!("跳过非图像文件: {}", path.display());
      }
    }
    files.sort();

    info!("目录 {} 中找到 {} 个图像文件", directory.display(), files.len());
    Ok(Self {
      pending: files.into(),
    })
  }

  pub fn remaining(&self) -> usize {
    self.pending.len()
  }
}

impl Iterator for FolderInput {
  type Item = Result<Upload, ImageInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.pending.pop_front().map(|path| Upload::from_path(&path))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lists_images_sorted_and_skips_others() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.png", "a.JPG", "c.jpeg", "notes.txt", "scan.pdf"] {
      std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();

    let input = FolderInput::open(dir.path().to_path_buf()).unwrap();
    assert_eq!(input.remaining(), 3);
    let names: Vec<_> = input.map(|upload| upload.unwrap().name).collect();
    assert_eq!(names, ["a.JPG", "b.png", "c.jpeg"]);
  }

  #[test]
  fn file_removed_after_listing_fails_only_that_upload() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("1.png"), b"one").unwrap();
    std::fs::write(dir.path().join("2.png"), b"two").unwrap();

    let mut input = FolderInput::open(dir.path().to_path_buf()).unwrap();
    std::fs::remove_file(dir.path().join("1.png")).unwrap();

    assert!(matches!(input.next(), Some(Err(ImageInputError::IoError(_)))));
    assert_eq!(input.next().unwrap().unwrap().bytes, b"two");
    assert!(input.next().is_none());
  }

  #[test]
  fn rejects_plain_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.png");
    std::fs::write(&path, b"x").unwrap();
    assert!(matches!(
      FolderInput::open(path),
      Err(ImageInputError::NotADirectory(_))
    ));
  }
}
