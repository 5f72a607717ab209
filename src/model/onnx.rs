// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/model/onnx.rs - ONNX 分类模型
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
use tracing::{debug, error, info};
use tract_onnx::{prelude::*, tract_hir::infer::GenericFactoid};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{BATCH_SIZE, RGB_CHANNELS},
  model::{Model, OutputVector, WasteClass, WithLabel},
  normalize::{INPUT_SIZE, InputTensor},
  url_local_path,
};

const CLASSIFIER_NUM_INPUTS: usize = 1;
const CLASSIFIER_NUM_OUTPUTS: usize = 1;
const CLASSIFIER_INPUT_SHAPE: [usize; 4] = [
  BATCH_SIZE,
  INPUT_SIZE as usize,
  INPUT_SIZE as usize,
  RGB_CHANNELS,
];

/// 分类模型错误
///
/// 加载阶段的 `ModelLoadError`、`ModelInvalid`、`ModelShapeMismatch` 与
/// `ModelPathError` 同属模型不可用一类（见 [`ClassifierError::is_fatal`]）：
/// 文件缺失或不可读为 `ModelLoadError`，文件无法解析为 `ModelInvalid`，
/// 输入输出结构不符为 `ModelShapeMismatch`。
/// 推理阶段输入形状不符为 `InferenceError`，不会对张量做任何变形。
#[derive(Error, Debug)]
pub enum ClassifierError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(std::io::Error),
  #[error("模型无效: {0}, 错误: {1}")]
  ModelInvalid(String, TractError),
  #[error("模型结构不符: {0}")]
  ModelShapeMismatch(String),
  #[error("输入张量形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  InferenceError {
    expected: Vec<usize>,
    actual: Vec<usize>,
  },
  #[error("推理执行错误: {0}")]
  InferenceFailed(TractError),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

impl From<std::io::Error> for ClassifierError {
  fn from(err: std::io::Error) -> Self {
    ClassifierError::ModelLoadError(err)
  }
}

impl ClassifierError {
  pub fn invalid(msg: &str, e: TractError) -> Self {
    ClassifierError::ModelInvalid(msg.to_string(), e)
  }

  /// 启动阶段的错误，出现后无法提供任何分类服务
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      ClassifierError::ModelLoadError(_)
        | ClassifierError::ModelInvalid(..)
        | ClassifierError::ModelShapeMismatch(_)
        | ClassifierError::ModelPathError(_)
    )
  }
}

/// 已加载并优化的分类网络，加载后只读
pub struct WasteClassifier {
  plan: TypedRunnableModel<TypedModel>,
  input_shape: Vec<usize>,
  output_shape: Vec<usize>,
}

pub struct WasteClassifierBuilder {
  model_path: String,
}

impl FromUrlWithScheme for WasteClassifierBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for WasteClassifierBuilder {
  type Error = ClassifierError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ClassifierError::ModelPathError(format!(
        "模型路径必须使用 {} 方案, 实际为 {}",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(WasteClassifierBuilder {
      model_path: url_local_path(url),
    })
  }
}

impl WasteClassifierBuilder {
  pub fn new(model_path: impl Into<String>) -> Self {
    Self {
      model_path: model_path.into(),
    }
  }

  pub fn model_path(&self) -> &str {
    &self.model_path
  }

  pub fn build(&self) -> Result<WasteClassifier, ClassifierError> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("解析 ONNX 模型");
    let model = tract_onnx::onnx()
      .model_for_read(&mut model_data.as_slice())
      .map_err(|e| ClassifierError::invalid("无法解析 ONNX 模型", e))?;

    let num_inputs = model
      .input_outlets()
      .map_err(|e| ClassifierError::invalid("无法获取输入数量", e))?
      .len();
    let num_outputs = model
      .output_outlets()
      .map_err(|e| ClassifierError::invalid("无法获取输出数量", e))?
      .len();

    if num_inputs != CLASSIFIER_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        CLASSIFIER_NUM_INPUTS, num_inputs
      );
      return Err(ClassifierError::ModelShapeMismatch(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        CLASSIFIER_NUM_INPUTS, num_inputs
      )));
    }

    if num_outputs != CLASSIFIER_NUM_OUTPUTS {
      error!(
        "预期模型输出数量为 {}, 实际为 {}",
        CLASSIFIER_NUM_OUTPUTS, num_outputs
      );
      return Err(ClassifierError::ModelShapeMismatch(format!(
        "预期模型输出数量为 {}, 实际为 {}",
        CLASSIFIER_NUM_OUTPUTS, num_outputs
      )));
    }

    let declared = model
      .input_fact(0)
      .map_err(|e| ClassifierError::invalid("无法获取输入信息", e))?;
    debug!("模型声明的输入: {:?}", declared);
    check_declared_input(declared)?;

    info!("优化 ONNX 模型");
    let model = model
      .with_input_fact(
        0,
        InferenceFact::dt_shape(f32::datum_type(), CLASSIFIER_INPUT_SHAPE),
      )
      .map_err(|e| ClassifierError::invalid("无法设置输入形状", e))?
      .into_optimized()
      .map_err(|e| ClassifierError::invalid("无法优化模型", e))?;

    let input_shape = concrete_shape(&model, true)?;
    let output_shape = concrete_shape(&model, false)?;
    debug!("模型输入形状: {:?}", input_shape);
    debug!("模型输出形状: {:?}", output_shape);

    let num_classes = WasteClass::LABELS.len();
    if output_shape.iter().product::<usize>() != num_classes
      || output_shape.last() != Some(&num_classes)
    {
      return Err(ClassifierError::ModelShapeMismatch(format!(
        "预期输出形状为 [1, {}], 实际为 {:?}",
        num_classes, output_shape
      )));
    }

    let plan = model
      .into_runnable()
      .map_err(|e| ClassifierError::invalid("无法生成执行计划", e))?;
    info!("模型加载完成");

    Ok(WasteClassifier {
      plan,
      input_shape,
      output_shape,
    })
  }
}

/// 模型自身声明的输入形状必须与 (1, 224, 224, 3) 兼容，未声明或符号化的维度不做限制
fn check_declared_input(fact: &InferenceFact) -> Result<(), ClassifierError> {
  let dims: Vec<Option<usize>> = fact
    .shape
    .dims()
    .map(|dim| match dim {
      GenericFactoid::Only(dim) => dim.as_i64().map(|dim| dim as usize),
      GenericFactoid::Any => None,
    })
    .collect();

  let rank_ok = if fact.shape.is_open() {
    dims.len() <= CLASSIFIER_INPUT_SHAPE.len()
  } else {
    dims.len() == CLASSIFIER_INPUT_SHAPE.len()
  };
  let dims_ok = dims
    .iter()
    .zip(CLASSIFIER_INPUT_SHAPE)
    .all(|(dim, expected)| dim.is_none_or(|dim| dim == expected));

  if !rank_ok || !dims_ok {
    error!(
      "预期输入形状为 {:?}, 模型声明为 {:?}",
      CLASSIFIER_INPUT_SHAPE, fact.shape
    );
    return Err(ClassifierError::ModelShapeMismatch(format!(
      "预期输入形状为 {:?}, 模型声明为 {:?}",
      CLASSIFIER_INPUT_SHAPE, fact.shape
    )));
  }
  Ok(())
}

fn concrete_shape(model: &TypedModel, input: bool) -> Result<Vec<usize>, ClassifierError> {
  let fact = if input {
    model.input_fact(0)
  } else {
    model.output_fact(0)
  }
  .map_err(|e| ClassifierError::invalid("无法获取张量信息", e))?;

  fact
    .shape
    .as_concrete()
    .map(|dims| dims.to_vec())
    .ok_or_else(|| ClassifierError::ModelShapeMismatch(format!("张量形状不确定: {:?}", fact.shape)))
}

impl WasteClassifier {
  pub fn input_shape(&self) -> &[usize] {
    &self.input_shape
  }

  pub fn output_shape(&self) -> &[usize] {
    &self.output_shape
  }

  /// 对任意张量执行一次前向推理，形状必须与模型声明一致
  pub fn infer_tensor(&self, tensor: Tensor) -> Result<OutputVector, ClassifierError> {
    if tensor.shape() != self.input_shape.as_slice() {
      error!(
        "输入张量形状不匹配: 期望 {:?}, 实际 {:?}",
        self.input_shape,
        tensor.shape()
      );
      return Err(ClassifierError::InferenceError {
        expected: self.input_shape.clone(),
        actual: tensor.shape().to_vec(),
      });
    }

    debug!("执行模型推理");
    let outputs = self
      .plan
      .run(tvec!(tensor.into()))
      .map_err(ClassifierError::InferenceFailed)?;

    debug!("获取模型输出");
    let output = outputs.first().ok_or_else(|| {
      ClassifierError::ModelShapeMismatch("模型没有产生输出".to_string())
    })?;
    Self::postprocess(output)
  }

  fn postprocess(output: &TValue) -> Result<OutputVector, ClassifierError> {
    let scores = output
      .cast_to::<f32>()
      .map_err(ClassifierError::InferenceFailed)?;
    let scores = scores
      .as_slice::<f32>()
      .map_err(ClassifierError::InferenceFailed)?
      .to_vec();
    debug!("模型推理结果：{:?}", scores);
    Ok(scores)
  }
}

impl Model for WasteClassifier {
  type Input = InputTensor;
  type Output = OutputVector;
  type Error = ClassifierError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let tensor = input
      .to_tensor()
      .map_err(ClassifierError::InferenceFailed)?;
    self.infer_tensor(tensor)
  }
}
