// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/model/label.rs - 垃圾类别与处置状态
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

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::model::WithLabel;

/// 垃圾材质类别，顺序与模型输出一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WasteClass {
  Cardboard,
  Glass,
  Metal,
  Paper,
  Plastic,
  Trash,
}

impl WithLabel for WasteClass {
  const LABELS: &'static [Self] = &[
    WasteClass::Cardboard,
    WasteClass::Glass,
    WasteClass::Metal,
    WasteClass::Paper,
    WasteClass::Plastic,
    WasteClass::Trash,
  ];

  fn to_label_str(&self) -> &'static str {
    match self {
      WasteClass::Cardboard => "Cardboard",
      WasteClass::Glass => "Glass",
      WasteClass::Metal => "Metal",
      WasteClass::Paper => "Paper",
      WasteClass::Plastic => "Plastic",
      WasteClass::Trash => "Trash",
    }
  }
}

impl WasteClass {
  pub fn disposal_status(self) -> DisposalStatus {
    DisposalStatus::of(self)
  }
}

impl fmt::Display for WasteClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.to_label_str())
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("未知类别: {0}")]
pub struct ParseLabelError(pub String);

impl FromStr for WasteClass {
  type Err = ParseLabelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::LABELS
      .iter()
      .find(|label| label.to_label_str().eq_ignore_ascii_case(s.trim()))
      .copied()
      .ok_or_else(|| ParseLabelError(s.to_string()))
  }
}

/// 由预测类别派生的粗粒度处置状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisposalStatus {
  Recyclable,
  NonRecyclable,
}

impl DisposalStatus {
  pub fn of(class: WasteClass) -> Self {
    match class {
      WasteClass::Trash => DisposalStatus::NonRecyclable,
      _ => DisposalStatus::Recyclable,
    }
  }

  /// 按类别名称求处置状态
  pub fn from_label(label: &str) -> Result<Self, ParseLabelError> {
    label.parse::<WasteClass>().map(Self::of)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      DisposalStatus::Recyclable => "Recyclable",
      DisposalStatus::NonRecyclable => "Non-Recyclable",
    }
  }
}

impl fmt::Display for DisposalStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn labels_follow_model_output_order() {
    let names: Vec<_> = WasteClass::LABELS.iter().map(|c| c.to_label_str()).collect();
    assert_eq!(
      names,
      ["Cardboard", "Glass", "Metal", "Paper", "Plastic", "Trash"]
    );
    assert_eq!(WasteClass::from_label_id(2), Some(WasteClass::Metal));
    assert_eq!(WasteClass::from_label_id(6), None);
  }

  #[test]
  fn trash_is_the_only_non_recyclable_class() {
    assert_eq!(
      DisposalStatus::from_label("Trash").unwrap().to_string(),
      "Non-Recyclable"
    );
    for name in ["Cardboard", "Glass", "Metal", "Paper", "Plastic"] {
      assert_eq!(DisposalStatus::from_label(name).unwrap().as_str(), "Recyclable");
    }
  }

  #[test]
  fn parses_names_case_insensitively() {
    assert_eq!("plastic".parse::<WasteClass>(), Ok(WasteClass::Plastic));
    assert_eq!(" GLASS ".parse::<WasteClass>(), Ok(WasteClass::Glass));
    assert_eq!(
      "styrofoam".parse::<WasteClass>(),
      Err(ParseLabelError("styrofoam".to_string()))
    );
  }
}
