// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/task.rs - 分类任务
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

use std::time::Duration;
use tracing::{error, info, warn};

use crate::{
  input::Upload,
  model::{Model, OutputVector},
  normalize::InputTensor,
  output::Render,
  pipeline::{Classification, ClassifyPipeline},
};

/// 任务结束时的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskReport {
  /// 成功分类并输出的上传数
  pub classified: usize,
  /// 因读取或解码失败被跳过的上传数
  pub skipped: usize,
  /// 与首次结果不一致的重复推理次数
  pub mismatches: usize,
}

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<TaskReport, Self::Error>;
}

pub struct OneShotTask {
  pipeline: ClassifyPipeline,
}

impl OneShotTask {
  pub fn new(pipeline: ClassifyPipeline) -> Self {
    Self { pipeline }
  }
}

impl<
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<Upload, IE>>,
  M: Model<Input = InputTensor, Output = OutputVector, Error = ME>,
  O: Render<Upload, Classification, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<TaskReport, Self::Error> {
    info!("开始任务...");
    let upload = input.next().ok_or_else(|| anyhow::anyhow!("没有上传图像"))??;
    info!("上传图像获取成功，开始分类...");
    let result = self.pipeline.classify(&model, &upload)?;
    output.render_result(&upload, &result)?;
    info!("输出完成");

    Ok(TaskReport {
      classified: 1,
      ..TaskReport::default()
    })
  }
}

/// 对同一张图像重复分类，统计平均耗时并检查结果是否一致
pub struct RepeatShotTask {
  pipeline: ClassifyPipeline,
  repeat: usize,
  render: bool,
}

impl RepeatShotTask {
  pub const DEFAULT_REPEAT_TIMES: usize = 1000;
  const WARMUP_RUNS: usize = 2;

  pub fn new(pipeline: ClassifyPipeline) -> Self {
    Self {
      pipeline,
      repeat: Self::DEFAULT_REPEAT_TIMES,
      render: false,
    }
  }

  pub fn with_repeat(mut self, repeat: usize) -> Self {
    self.repeat = repeat.max(1);
    self
  }

  /// 每次结果都交给输出，默认只输出首次结果
  pub fn with_render_every_run(mut self, render: bool) -> Self {
    self.render = render;
    self
  }
}

fn mean_latency(times: &[Duration], warmup: usize) -> Duration {
  let measured = if times.len() > warmup {
    &times[warmup..]
  } else {
    times
  };
  if measured.is_empty() {
    return Duration::ZERO;
  }
  measured.iter().sum::<Duration>() / measured.len() as u32
}

impl<
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<Upload, IE>>,
  M: Model<Input = InputTensor, Output = OutputVector, Error = ME>,
  O: Render<Upload, Classification, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<TaskReport, Self::Error> {
    info!("开始任务...");
    let upload = input.next().ok_or_else(|| anyhow::anyhow!("没有上传图像"))??;
    info!("上传图像获取成功，开始重复分类 {} 次...", self.repeat);

    let mut report = TaskReport::default();
    let mut first: Option<Classification> = None;
    let mut times = Vec::with_capacity(self.repeat);
    for i in 0..self.repeat {
      let now = std::time::Instant::now();
      let result = self.pipeline.classify(&model, &upload)?;
      let elapsed = now.elapsed();
      info!("({})分类完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);

      match &first {
        None => {
          output.render_result(&upload, &result)?;
          first = Some(result);
        }
        Some(expected) => {
          if *expected != result {
            warn!("({})分类结果与首次不一致: {:?}", i, result.prediction);
            report.mismatches += 1;
          }
          if self.render {
            output.render_result(&upload, &result)?;
          }
        }
      }
      report.classified += 1;
    }

    warn!(
      "平均分类时间: {:.2?}",
      mean_latency(&times, Self::WARMUP_RUNS)
    );
    if report.mismatches > 0 {
      error!("{} 次重复分类结果不一致", report.mismatches);
    }

    Ok(report)
  }
}

/// 依次分类所有上传，单张失败只跳过该张
#[derive(Default, Debug)]
pub struct ContinuousTask {
  pipeline: ClassifyPipeline,
  upload_number: Option<usize>,
  interruptible: bool,
}

impl ContinuousTask {
  pub fn new(pipeline: ClassifyPipeline) -> Self {
    Self {
      pipeline,
      ..Self::default()
    }
  }

  pub fn with_upload_number(mut self, upload_number: Option<usize>) -> Self {
    self.upload_number = upload_number;
    self
  }

  /// 安装 Ctrl-C 处理器，收到信号后在两次上传之间退出
  pub fn interruptible(mut self, interruptible: bool) -> Self {
    self.interruptible = interruptible;
    self
  }
}

impl<
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<Upload, IE>>,
  M: Model<Input = InputTensor, Output = OutputVector, Error = ME>,
  O: Render<Upload, Classification, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<TaskReport, Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    if self.interruptible {
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        let _ = tx.send(());
      })?;
    }

    let mut report = TaskReport::default();
    for (upload_index, upload) in input.enumerate() {
      if self
        .upload_number
        .map(|n| upload_index >= n)
        .unwrap_or(false)
      {
        info!("达到指定上传数 {}, 退出任务循环", upload_index);
        break;
      }

      info!("处理第 {} 张上传图像", upload_index + 1);
      let upload = match upload {
        Ok(upload) => upload,
        Err(e) => {
          warn!("读取上传失败，跳过: {}", e);
          report.skipped += 1;
          continue;
        }
      };

      match self.pipeline.classify(&model, &upload) {
        Ok(result) => {
          output.render_result(&upload, &result)?;
          report.classified += 1;
        }
        Err(e) if e.is_recoverable() => {
          warn!("{} 无法分类，跳过: {}", upload.name, e);
          report.skipped += 1;
        }
        Err(e) => {
          error!("{} 分类失败: {}", upload.name, e);
          return Err(e.into());
        }
      }

      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!(
      "任务完成，共分类 {} 张，跳过 {} 张",
      report.classified, report.skipped
    );
    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mean_latency_skips_warmup() {
    let times = [
      Duration::from_millis(100),
      Duration::from_millis(50),
      Duration::from_millis(10),
      Duration::from_millis(20),
    ];
    assert_eq!(mean_latency(&times, 2), Duration::from_millis(15));
    assert_eq!(mean_latency(&times[..2], 2), Duration::from_millis(75));
    assert_eq!(mean_latency(&[], 2), Duration::ZERO);
  }

  #[test]
  fn repeat_count_is_at_least_one() {
    let task = RepeatShotTask::new(ClassifyPipeline::default()).with_repeat(0);
    assert_eq!(task.repeat, 1);
  }
}
