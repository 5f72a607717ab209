// 该文件是 Huishou （回收分拣） 项目的一部分。
// src/model/shared.rs - 进程内共享、只加载一次的模型句柄
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

use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::{debug, info};

use crate::model::Model;

/// 首次使用时加载模型，之后所有调用共享同一实例。
///
/// 并发的首次调用由 `init` 互斥锁串行化，加载函数至多成功执行一次。
/// 加载失败不会被缓存，下一次调用会重新尝试。
pub struct SharedModel<M, F> {
  loader: F,
  cell: OnceLock<M>,
  init: Mutex<()>,
}

impl<M, E, F> SharedModel<M, F>
where
  F: Fn() -> Result<M, E>,
{
  pub fn new(loader: F) -> Self {
    Self {
      loader,
      cell: OnceLock::new(),
      init: Mutex::new(()),
    }
  }

  pub fn is_loaded(&self) -> bool {
    self.cell.get().is_some()
  }

  pub fn get(&self) -> Result<&M, E> {
    if let Some(model) = self.cell.get() {
      return Ok(model);
    }

    let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(model) = self.cell.get() {
      debug!("模型已由其他调用加载");
      return Ok(model);
    }

    info!("首次使用，开始加载模型");
    let model = (self.loader)()?;
    Ok(self.cell.get_or_init(|| model))
  }
}

impl<M, F> Model for SharedModel<M, F>
where
  M: Model,
  F: Fn() -> Result<M, M::Error>,
{
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.get()?.infer(input)
  }
}
