// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 重复推理基准测试
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use huishou::{
  FromUrl,
  input::InputWrapper,
  normalize::Normalization,
  output::OutputWrapper,
  pipeline::ClassifyPipeline,
  task::{RepeatShotTask, Task},
};
use tracing::{info, warn};

/// Huishou 基准测试参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 上传来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出方式
  #[arg(long, value_name = "OUTPUT", default_value = "console://")]
  pub output: Url,
  /// 输入归一化方式
  #[arg(long, value_enum, default_value_t = Normalization::Passthrough)]
  pub normalization: Normalization,
  /// 重复次数
  #[arg(long, default_value_t = RepeatShotTask::DEFAULT_REPEAT_TIMES, value_name = "COUNT")]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("上传来源: {}", args.input);
  info!("输出方式: {}", args.output);

  let model = huishou::model::WasteClassifierBuilder::from_url(&args.model)?.build()?;
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let report = RepeatShotTask::new(ClassifyPipeline::new(args.normalization))
    .with_repeat(args.repeat)
    .run_task(input, model, output)?;

  if report.mismatches > 0 {
    warn!("结果不稳定: {} / {}", report.mismatches, report.classified);
  }

  Ok(())
}
