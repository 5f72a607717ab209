// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/pipeline.rs - 单张图像的分类流程
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
use tracing::{debug, info};

use crate::{
  input::Upload,
  model::{DisposalStatus, Model, OutputVector, WasteClass},
  normalize::{ImageDecodeError, InputTensor, Normalization, WasteNormalizer},
  rank::{PredictionResult, RankError, rank},
};

#[derive(Error, Debug)]
pub enum PipelineError<E> {
  #[error("图像解码错误: {0}")]
  ImageDecodeError(#[from] ImageDecodeError),
  #[error("模型推理错误: {0}")]
  Model(#[source] E),
  #[error("结果排序错误: {0}")]
  Rank(#[from] RankError),
}

impl<E> PipelineError<E> {
  /// 仅影响当前上传、不影响后续请求的错误
  pub fn is_recoverable(&self) -> bool {
    matches!(self, PipelineError::ImageDecodeError(_))
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
  pub prediction: PredictionResult<WasteClass>,
  /// 启用处置状态分组时才有值
  pub disposal: Option<DisposalStatus>,
}

/// 归一化 → 推理 → 排序，每张上传图像同步执行一次
#[derive(Debug, Clone, Default)]
pub struct ClassifyPipeline {
  normalizer: WasteNormalizer,
  disposal_status: bool,
}

impl ClassifyPipeline {
  pub fn new(normalization: Normalization) -> Self {
    Self {
      normalizer: WasteNormalizer::new(normalization),
      disposal_status: false,
    }
  }

  pub fn with_disposal_status(mut self, enabled: bool) -> Self {
    self.disposal_status = enabled;
    self
  }

  pub fn disposal_status(&self) -> bool {
    self.disposal_status
  }

  pub fn classify<M>(
    &self,
    model: &M,
    upload: &Upload,
  ) -> Result<Classification, PipelineError<M::Error>>
  where
    M: Model<Input = InputTensor, Output = OutputVector>,
  {
    debug!("归一化上传图像: {}", upload.name);
    let tensor = self.normalizer.process(&upload.bytes)?;

    let now = std::time::Instant::now();
    let scores = model.infer(&tensor).map_err(PipelineError::Model)?;
    info!("{} 推理完成，耗时: {:.2?}", upload.name, now.elapsed());

    let prediction = rank::<WasteClass>(&scores)?;
    let disposal = self
      .disposal_status
      .then(|| DisposalStatus::of(prediction.label));

    Ok(Classification {
      prediction,
      disposal,
    })
  }
}
