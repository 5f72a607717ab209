// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/output/console.rs - 终端文本输出
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

use std::io::Write;

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::Upload,
  model::WithLabel,
  output::{Render, format_percent},
  pipeline::Classification,
};

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub struct ConsoleOutput;

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }
    Ok(ConsoleOutput)
  }
}

/// 按上传顺序逐行写出分类结果
pub fn write_classification<W: Write>(
  out: &mut W,
  upload: &Upload,
  result: &Classification,
) -> std::io::Result<()> {
  let prediction = &result.prediction;
  writeln!(out, "[{}]", upload.name)?;
  writeln!(
    out,
    "Predicted Material: {}",
    prediction.label.to_label_str()
  )?;
  writeln!(out, "Confidence: {}", format_percent(prediction.confidence))?;
  if let Some(status) = result.disposal {
    writeln!(out, "Disposal Status: {}", status)?;
  }
  writeln!(out, "Probability Breakdown:")?;
  for item in prediction.breakdown.iter() {
    writeln!(
      out,
      "  {}: {}",
      item.kind.to_label_str(),
      format_percent(item.score)
    )?;
  }
  Ok(())
}

impl Render<Upload, Classification> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, frame: &Upload, result: &Classification) -> Result<(), Self::Error> {
    let mut stdout = std::io::stdout().lock();
    write_classification(&mut stdout, frame, result)?;
    stdout.flush()?;
    Ok(())
  }
}
