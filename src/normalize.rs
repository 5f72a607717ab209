// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/normalize.rs - 图像解码与归一化
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

use std::io::Cursor;

use image::{ImageReader, RgbImage, imageops::FilterType};
use thiserror::Error;
use tracing::debug;

use crate::frame::{RGB_CHANNELS, RgbNhwcTensor};

/// 模型输入边长
pub const INPUT_SIZE: u32 = 224;

/// 分类模型的输入张量 (1, 224, 224, 3)
pub type InputTensor = RgbNhwcTensor<INPUT_SIZE, INPUT_SIZE>;

pub type WasteNormalizer = Normalizer<INPUT_SIZE, INPUT_SIZE>;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Error, Debug)]
pub enum ImageDecodeError {
  #[error("无法识别图像格式: {0}")]
  UnknownFormat(std::io::Error),
  #[error("图像解码失败: {0}")]
  Decode(#[from] image::ImageError),
  #[error("图像尺寸无效: {0}x{1}")]
  EmptyImage(u32, u32),
}

/// 模型族固定的逐通道输入变换，输入为 0-255 的像素值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Normalization {
  /// 原样输出像素值（EfficientNet 族的预处理即恒等变换）
  #[default]
  Passthrough,
  /// 缩放到 [0, 1]
  Unit,
  /// 缩放到 [-1, 1]
  Symmetric,
  /// ImageNet 均值方差归一化
  Imagenet,
}

impl Normalization {
  /// 超出 RGB 范围的通道没有均值方差，原样返回
  pub fn apply(self, channel: usize, value: f32) -> f32 {
    match self {
      Normalization::Passthrough => value,
      Normalization::Unit => value / 255.0,
      Normalization::Symmetric => value / 127.5 - 1.0,
      Normalization::Imagenet => match (IMAGENET_MEAN.get(channel), IMAGENET_STD.get(channel)) {
        (Some(mean), Some(deviation)) => (value / 255.0 - mean) / deviation,
        _ => value,
      },
    }
  }
}

/// 将任意尺寸的图像转换为固定形状的 NHWC 张量
#[derive(Debug, Clone)]
pub struct Normalizer<const W: u32, const H: u32> {
  normalization: Normalization,
  filter: FilterType,
}

impl<const W: u32, const H: u32> Default for Normalizer<W, H> {
  fn default() -> Self {
    Self::new(Normalization::default())
  }
}

impl<const W: u32, const H: u32> Normalizer<W, H> {
  pub fn new(normalization: Normalization) -> Self {
    Self {
      normalization,
      filter: FilterType::CatmullRom,
    }
  }

  pub fn normalization(&self) -> Normalization {
    self.normalization
  }

  /// 解码上传的字节并转换为三通道 RGB
  pub fn decode(&self, bytes: &[u8]) -> Result<RgbImage, ImageDecodeError> {
    let image = ImageReader::new(Cursor::new(bytes))
      .with_guessed_format()
      .map_err(ImageDecodeError::UnknownFormat)?
      .decode()?;

    if image.width() == 0 || image.height() == 0 {
      return Err(ImageDecodeError::EmptyImage(image.width(), image.height()));
    }

    debug!(
      "解码图像: {}x{} {:?}",
      image.width(),
      image.height(),
      image.color()
    );
    Ok(image.to_rgb8())
  }

  /// 拉伸缩放（不保持宽高比）并逐通道归一化
  pub fn normalize(&self, image: &RgbImage) -> RgbNhwcTensor<W, H> {
    let resized = image::imageops::resize(image, W, H, self.filter);

    let mut tensor = RgbNhwcTensor::<W, H>::default();
    let slice = tensor.as_mut();
    for (x, y, pixel) in resized.enumerate_pixels() {
      let base = ((y as usize) * (W as usize) + (x as usize)) * RGB_CHANNELS;
      for c in 0..RGB_CHANNELS {
        slice[base + c] = self.normalization.apply(c, pixel[c] as f32);
      }
    }
    tensor
  }

  pub fn process(&self, bytes: &[u8]) -> Result<RgbNhwcTensor<W, H>, ImageDecodeError> {
    let image = self.decode(bytes)?;
    Ok(self.normalize(&image))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbaImage};

  fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
  }

  fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
      Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
  }

  #[test]
  fn output_shape_is_fixed_for_any_input_size() {
    let normalizer = WasteNormalizer::default();
    for (w, h) in [(1, 1), (224, 224), (640, 480), (17, 900), (300, 31)] {
      let bytes = encode(gradient(w, h), ImageFormat::Png);
      let tensor = normalizer.process(&bytes).unwrap();
      assert_eq!(tensor.shape(), [1, 224, 224, 3], "input {}x{}", w, h);
      assert_eq!(tensor.as_slice().len(), InputTensor::LEN);
    }
  }

  #[test]
  fn repeated_calls_are_deterministic() {
    let normalizer = WasteNormalizer::new(Normalization::Imagenet);
    let bytes = encode(gradient(333, 257), ImageFormat::Jpeg);
    let first = normalizer.process(&bytes).unwrap();
    let second = normalizer.process(&bytes).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn passthrough_keeps_pixel_range() {
    let normalizer = WasteNormalizer::default();
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 80, Rgb([200, 100, 10])));
    let tensor = normalizer.process(&encode(image, ImageFormat::Png)).unwrap();
    for (y, x) in [(0, 0), (111, 57), (223, 223)] {
      assert!((tensor.get(y, x, 0).unwrap() - 200.0).abs() <= 1.0);
      assert!((tensor.get(y, x, 1).unwrap() - 100.0).abs() <= 1.0);
      assert!((tensor.get(y, x, 2).unwrap() - 10.0).abs() <= 1.0);
    }
  }

  #[test]
  fn grayscale_and_alpha_inputs_are_coerced_to_rgb() {
    let normalizer = WasteNormalizer::default();

    let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(30, 30, Luma([90])));
    let tensor = normalizer.process(&encode(gray, ImageFormat::Png)).unwrap();
    let value = tensor.get(10, 10, 0).unwrap();
    assert_eq!(tensor.get(10, 10, 1), Some(value));
    assert_eq!(tensor.get(10, 10, 2), Some(value));

    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 40, image::Rgba([1, 2, 3, 128])));
    let tensor = normalizer.process(&encode(rgba, ImageFormat::Png)).unwrap();
    assert_eq!(tensor.shape(), [1, 224, 224, 3]);
  }

  #[test]
  fn non_image_bytes_fail_to_decode() {
    let normalizer = WasteNormalizer::default();
    let err = normalizer.process(b"%PDF-1.7 definitely not a picture").unwrap_err();
    assert!(matches!(err, ImageDecodeError::Decode(_)));

    let err = normalizer.process(&[]).unwrap_err();
    assert!(matches!(err, ImageDecodeError::Decode(_)));
  }

  #[test]
  fn truncated_png_fails_to_decode() {
    let normalizer = WasteNormalizer::default();
    let mut bytes = encode(gradient(64, 64), ImageFormat::Png);
    bytes.truncate(bytes.len() / 2);
    assert!(normalizer.process(&bytes).is_err());
  }

  #[test]
  fn normalization_formulas() {
    assert_eq!(Normalization::Passthrough.apply(0, 128.0), 128.0);
    assert_eq!(Normalization::Unit.apply(1, 255.0), 1.0);
    assert_eq!(Normalization::Symmetric.apply(2, 0.0), -1.0);
    assert_eq!(Normalization::Symmetric.apply(2, 255.0), 1.0);
    let expected = (1.0 - 0.406) / 0.225;
    assert!((Normalization::Imagenet.apply(2, 255.0) - expected).abs() < 1e-6);
  }

  #[test]
  fn imagenet_leaves_channels_beyond_rgb_untouched() {
    assert_eq!(Normalization::Imagenet.apply(3, 200.0), 200.0);
    assert_eq!(Normalization::Imagenet.apply(usize::MAX, 7.0), 7.0);
  }
}
