// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/rank.rs - 分类结果排序
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
use tracing::debug;

use crate::model::WithLabel;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RankError {
  #[error("输出向量长度不匹配: 期望 {expected}, 实际 {actual}")]
  ContractError { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore<T> {
  pub kind: T,
  pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult<T> {
  /// 预测类别
  pub label: T,
  /// 预测类别在输出向量中的下标
  pub index: usize,
  /// 模型给出的原始分数，未重新归一化
  pub confidence: f32,
  /// 按固定类别顺序排列的全部分数
  pub breakdown: Box<[ClassScore<T>]>,
}

/// 最大值下标，并列时取最小下标；NaN 不参与比较，全为 NaN 时返回 0
pub fn argmax(scores: &[f32]) -> Option<usize> {
  if scores.is_empty() {
    return None;
  }

  let mut best: Option<(usize, f32)> = None;
  for (index, &score) in scores.iter().enumerate() {
    if score.is_nan() {
      continue;
    }
    match best {
      Some((_, best_score)) if score <= best_score => {}
      _ => best = Some((index, score)),
    }
  }
  Some(best.map(|(index, _)| index).unwrap_or(0))
}

pub fn rank<T: WithLabel>(scores: &[f32]) -> Result<PredictionResult<T>, RankError> {
  if scores.len() != T::LABELS.len() {
    return Err(RankError::ContractError {
      expected: T::LABELS.len(),
      actual: scores.len(),
    });
  }

  let breakdown: Box<[ClassScore<T>]> = T::LABELS
    .iter()
    .zip(scores)
    .map(|(&kind, &score)| ClassScore { kind, score })
    .collect();

  let index = argmax(scores).ok_or(RankError::ContractError {
    expected: T::LABELS.len(),
    actual: 0,
  })?;
  let ClassScore { kind, score } = breakdown[index];
  debug!("预测类别: {:?} ({:.4})", kind, score);

  Ok(PredictionResult {
    label: kind,
    index,
    confidence: score,
    breakdown,
  })
}

impl<T: WithLabel> PredictionResult<T> {
  /// 分数之和，仅用于展示，不做归一化
  pub fn total_score(&self) -> f32 {
    self.breakdown.iter().map(|item| item.score).sum()
  }

  pub fn score_of(&self, kind: T) -> Option<f32> {
    self
      .breakdown
      .iter()
      .find(|item| item.kind == kind)
      .map(|item| item.score)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::WasteClass;

  #[test]
  fn metal_scenario() {
    let scores = [0.05, 0.02, 0.80, 0.05, 0.05, 0.03];
    let result = rank::<WasteClass>(&scores).unwrap();
    assert_eq!(result.label, WasteClass::Metal);
    assert_eq!(result.index, 2);
    assert_eq!(result.confidence, 0.80);
    assert_eq!(result.breakdown.len(), 6);
    for (item, score) in result.breakdown.iter().zip(scores) {
      assert_eq!(item.score, score);
    }
  }

  #[test]
  fn ties_go_to_lowest_index() {
    let result = rank::<WasteClass>(&[0.1, 0.4, 0.1, 0.4, 0.0, 0.0]).unwrap();
    assert_eq!(result.label, WasteClass::Glass);

    let result = rank::<WasteClass>(&[0.0; 6]).unwrap();
    assert_eq!(result.label, WasteClass::Cardboard);
  }

  #[test]
  fn breakdown_keeps_fixed_order_whoever_wins() {
    let result = rank::<WasteClass>(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.9]).unwrap();
    assert_eq!(result.label, WasteClass::Trash);
    let kinds: Vec<_> = result.breakdown.iter().map(|item| item.kind).collect();
    assert_eq!(kinds, WasteClass::LABELS);
  }

  #[test]
  fn scores_are_not_renormalized() {
    let result = rank::<WasteClass>(&[2.0, 3.5, -1.0, 0.0, 7.25, 1.0]).unwrap();
    assert_eq!(result.label, WasteClass::Plastic);
    assert_eq!(result.confidence, 7.25);
    assert_eq!(result.total_score(), 12.75);
    assert_eq!(result.score_of(WasteClass::Metal), Some(-1.0));
  }

  #[test]
  fn wrong_length_is_a_contract_error() {
    assert_eq!(
      rank::<WasteClass>(&[0.5; 5]).unwrap_err(),
      RankError::ContractError {
        expected: 6,
        actual: 5
      }
    );
    assert_eq!(
      rank::<WasteClass>(&[0.1; 7]).unwrap_err(),
      RankError::ContractError {
        expected: 6,
        actual: 7
      }
    );
    assert!(rank::<WasteClass>(&[]).is_err());
  }

  #[test]
  fn argmax_skips_nan() {
    assert_eq!(argmax(&[f32::NAN, 0.2, 0.7, 0.1]), Some(2));
    assert_eq!(argmax(&[f32::NAN, f32::NAN]), Some(0));
    assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
    assert_eq!(argmax(&[]), None);
  }
}
