// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/output/json_output.rs - JSON 行输出
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

use serde_json::{Map, Value, json};
use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::Upload,
  model::WithLabel,
  output::Render,
  pipeline::Classification,
};

#[derive(Error, Debug)]
pub enum JsonOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 每张上传图像输出一行 JSON 到标准输出
pub struct JsonOutput {
  pretty: bool,
}

impl FromUrlWithScheme for JsonOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonOutput {
  type Error = JsonOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonOutputError::SchemeMismatch(uri.scheme().to_string()));
    }

    let pretty = uri.query_pairs().any(|(k, _)| k == "pretty");
    Ok(JsonOutput { pretty })
  }
}

pub fn classification_json(upload: &Upload, result: &Classification) -> Value {
  let prediction = &result.prediction;

  // 保持类别顺序
  let breakdown: Vec<Value> = prediction
    .breakdown
    .iter()
    .map(|item| json!({ "class": item.kind.to_label_str(), "score": item.score }))
    .collect();

  let mut object = Map::new();
  object.insert("file".to_string(), json!(upload.name));
  object.insert("label".to_string(), json!(prediction.label.to_label_str()));
  object.insert("index".to_string(), json!(prediction.index));
  object.insert("confidence".to_string(), json!(prediction.confidence));
  if let Some(status) = result.disposal {
    object.insert("disposal_status".to_string(), json!(status.as_str()));
  }
  object.insert("breakdown".to_string(), Value::Array(breakdown));
  Value::Object(object)
}

impl Render<Upload, Classification> for JsonOutput {
  type Error = JsonOutputError;

  fn render_result(&self, frame: &Upload, result: &Classification) -> Result<(), Self::Error> {
    let value = classification_json(frame, result);
    let line = if self.pretty {
      serde_json::to_string_pretty(&value)?
    } else {
      serde_json::to_string(&value)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    model::{DisposalStatus, WasteClass},
    rank::rank,
  };

  #[test]
  fn json_carries_label_confidence_and_ordered_breakdown() {
    let result = Classification {
      prediction: rank::<WasteClass>(&[0.0, 0.0, 0.0, 0.0, 0.25, 0.75]).unwrap(),
      disposal: Some(DisposalStatus::NonRecyclable),
    };
    let value = classification_json(&Upload::new("wrapper.png", Vec::new()), &result);

    assert_eq!(value["file"], "wrapper.png");
    assert_eq!(value["label"], "Trash");
    assert_eq!(value["index"], 5);
    assert_eq!(value["confidence"], 0.75);
    assert_eq!(value["disposal_status"], "Non-Recyclable");

    let classes: Vec<_> = value["breakdown"]
      .as_array()
      .unwrap()
      .iter()
      .map(|item| item["class"].as_str().unwrap().to_string())
      .collect();
    assert_eq!(
      classes,
      ["Cardboard", "Glass", "Metal", "Paper", "Plastic", "Trash"]
    );
    assert_eq!(value["breakdown"][4]["score"], 0.25);
  }

  #[test]
  fn disposal_status_is_omitted_when_disabled() {
    let result = Classification {
      prediction: rank::<WasteClass>(&[0.9, 0.0, 0.0, 0.0, 0.0, 0.1]).unwrap(),
      disposal: None,
    };
    let value = classification_json(&Upload::new("box.jpg", Vec::new()), &result);
    assert!(value.get("disposal_status").is_none());
  }

  #[test]
  fn pretty_flag_comes_from_query() {
    let output = JsonOutput::from_url(&Url::parse("json://?pretty").unwrap()).unwrap();
    assert!(output.pretty);
    let output = JsonOutput::from_url(&Url::parse("json://").unwrap()).unwrap();
    assert!(!output.pretty);
  }
}
