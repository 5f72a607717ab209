// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/config.rs - 项目参数配置
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

use clap::{Parser, ValueEnum};
use url::Url;

use crate::{normalize::Normalization, pipeline::ClassifyPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TaskKind {
  /// 只分类第一张上传图像
  #[default]
  Oneshot,
  /// 依次分类所有上传图像
  Continuous,
}

/// Huishou 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型文件路径，例如 onnx:///opt/models/waste.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 上传来源
  /// 支持格式:
  /// - 单个文件: image:///path/to/photo.jpg
  /// - 目录: folder:///path/to/uploads
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 结果输出方式: console:// 或 json://
  #[arg(long, value_name = "OUTPUT", default_value = "console://")]
  pub output: Url,

  /// 模型族固定的输入归一化方式
  #[arg(long, value_enum, default_value_t = Normalization::Passthrough)]
  pub normalization: Normalization,

  /// 显示 Recyclable / Non-Recyclable 处置状态
  #[arg(long)]
  pub disposal_status: bool,

  /// 任务类型
  #[arg(long, value_enum, default_value_t = TaskKind::Oneshot)]
  pub task: TaskKind,

  /// 最大处理上传数（仅对 continuous 有效，0 表示无限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_uploads: usize,
}

impl Args {
  pub fn pipeline(&self) -> ClassifyPipeline {
    ClassifyPipeline::new(self.normalization).with_disposal_status(self.disposal_status)
  }

  pub fn upload_limit(&self) -> Option<usize> {
    (self.max_uploads > 0).then_some(self.max_uploads)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let args = Args::try_parse_from([
      "huishou",
      "--model",
      "onnx:///opt/waste.onnx",
      "--input",
      "image:///tmp/can.jpg",
    ])
    .unwrap();
    assert_eq!(args.output.scheme(), "console");
    assert_eq!(args.normalization, Normalization::Passthrough);
    assert_eq!(args.task, TaskKind::Oneshot);
    assert!(!args.disposal_status);
    assert_eq!(args.upload_limit(), None);
    assert!(!args.pipeline().disposal_status());
  }

  #[test]
  fn all_options() {
    let args = Args::try_parse_from([
      "huishou",
      "--model",
      "onnx:///opt/waste.onnx",
      "--input",
      "folder:///srv/uploads",
      "--output",
      "json://",
      "--normalization",
      "imagenet",
      "--disposal-status",
      "--task",
      "continuous",
      "--max-uploads",
      "25",
    ])
    .unwrap();
    assert_eq!(args.normalization, Normalization::Imagenet);
    assert_eq!(args.task, TaskKind::Continuous);
    assert_eq!(args.upload_limit(), Some(25));
    assert!(args.pipeline().disposal_status());
  }

  #[test]
  fn rejects_unknown_normalization() {
    let result = Args::try_parse_from([
      "huishou",
      "--model",
      "onnx:///opt/waste.onnx",
      "--input",
      "image:///tmp/can.jpg",
      "--normalization",
      "zscore",
    ]);
    assert!(result.is_err());
  }
}
