// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/frame.rs - NHWC 输入张量定义
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
use tract_onnx::prelude::{Tensor, TractResult};

pub const RGB_CHANNELS: usize = 3;
pub const BATCH_SIZE: usize = 1;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
pub struct FrameShapeError {
  pub expected: usize,
  pub actual: usize,
}

/// 批大小为 1 的 NHWC 浮点张量，形状固定为 (1, H, W, 3)
#[derive(Debug, Clone, PartialEq)]
pub struct RgbNhwcTensor<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> RgbNhwcTensor<W, H> {
  pub const LEN: usize = BATCH_SIZE * H as usize * W as usize * RGB_CHANNELS;

  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn shape(&self) -> [usize; 4] {
    [BATCH_SIZE, H as usize, W as usize, RGB_CHANNELS]
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  /// 读取 (y, x, c) 处的值
  pub fn get(&self, y: usize, x: usize, c: usize) -> Option<f32> {
    if y >= H as usize || x >= W as usize || c >= RGB_CHANNELS {
      return None;
    }
    self
      .data
      .get((y * W as usize + x) * RGB_CHANNELS + c)
      .copied()
  }

  pub fn to_tensor(&self) -> TractResult<Tensor> {
    Tensor::from_shape(&self.shape(), &self.data[..])
  }
}

impl<const W: u32, const H: u32> TryFrom<Vec<f32>> for RgbNhwcTensor<W, H> {
  type Error = FrameShapeError;

  fn try_from(data: Vec<f32>) -> Result<Self, Self::Error> {
    if data.len() != Self::LEN {
      return Err(FrameShapeError {
        expected: Self::LEN,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const W: u32, const H: u32> Default for RgbNhwcTensor<W, H> {
  fn default() -> Self {
    Self {
      data: vec![0f32; Self::LEN].into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> AsMut<[f32]> for RgbNhwcTensor<W, H> {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_wrong_length() {
    let err = RgbNhwcTensor::<4, 2>::try_from(vec![0.0; 10]).unwrap_err();
    assert_eq!(
      err,
      FrameShapeError {
        expected: 24,
        actual: 10
      }
    );
  }

  #[test]
  fn indexes_in_nhwc_order() {
    let data: Vec<f32> = (0..24).map(|v| v as f32).collect();
    let frame = RgbNhwcTensor::<4, 2>::try_from(data).unwrap();
    assert_eq!(frame.shape(), [1, 2, 4, 3]);
    assert_eq!(frame.get(0, 0, 0), Some(0.0));
    assert_eq!(frame.get(0, 1, 2), Some(5.0));
    assert_eq!(frame.get(1, 0, 0), Some(12.0));
    assert_eq!(frame.get(2, 0, 0), None);
  }

  #[test]
  fn converts_to_tract_tensor_with_batch_dimension() {
    let frame = RgbNhwcTensor::<8, 6>::default();
    let tensor = frame.to_tensor().unwrap();
    assert_eq!(tensor.shape(), &[1, 6, 8, 3]);
  }
}
