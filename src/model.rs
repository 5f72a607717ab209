// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/model.rs - 模型
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

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

impl<M: Model + ?Sized> Model for &M {
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    (**self).infer(input)
  }
}

/// 模型原始输出：按固定类别顺序排列的分数
pub type OutputVector = Vec<f32>;

pub trait WithLabel: Sized + Copy + std::fmt::Debug + PartialEq + 'static {
  /// 按模型输出顺序排列的全部类别
  const LABELS: &'static [Self];

  fn to_label_str(&self) -> &'static str;

  fn from_label_id(id: u32) -> Option<Self> {
    Self::LABELS.get(id as usize).copied()
  }
}

mod label;
pub use self::label::{DisposalStatus, ParseLabelError, WasteClass};

mod onnx;
pub use self::onnx::{ClassifierError, WasteClassifier, WasteClassifierBuilder};

mod shared;
pub use self::shared::SharedModel;
