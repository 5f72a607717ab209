// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/main.rs - 项目主程序
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
use tracing::info;

use huishou::{
  FromUrl,
  config::{Args, TaskKind},
  input::InputWrapper,
  model::{SharedModel, WasteClassifierBuilder},
  output::OutputWrapper,
  task::{ContinuousTask, OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("上传来源: {}", args.input);
  info!("输出方式: {}", args.output);
  info!("归一化方式: {:?}", args.normalization);
  info!("处置状态: {}", args.disposal_status);

  let builder = WasteClassifierBuilder::from_url(&args.model)?;
  let model = SharedModel::new(|| builder.build());
  // 启动时加载，模型不可用则直接退出
  model.get()?;

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;
  let pipeline = args.pipeline();

  let report = match args.task {
    TaskKind::Oneshot => OneShotTask::new(pipeline).run_task(input, &model, output)?,
    TaskKind::Continuous => ContinuousTask::new(pipeline)
      .with_upload_number(args.upload_limit())
      .interruptible(true)
      .run_task(input, &model, output)?,
  };

  info!(
    "处理完成! 分类 {} 张，跳过 {} 张",
    report.classified, report.skipped
  );

  Ok(())
}
