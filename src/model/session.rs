// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/model/session.rs - ONNX Runtime 会话构建
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

use std::path::Path;

use ort::session::{Session, builder::GraphOptimizationLevel};
use thiserror::Error;
use tracing::{debug, info};

// 小于该大小的文件通常是 Git LFS 指针而不是模型
const MIN_MODEL_BYTES: usize = 1024;

#[derive(Error, Debug)]
pub enum SessionError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型文件过小 ({1} 字节), 可能不是有效的 ONNX 模型: {0}")]
  ModelTooSmall(String, usize),
  #[error("ONNX Runtime 错误 ({0}): {1}")]
  OrtError(&'static str, String),
}

fn intra_op_threads() -> usize {
  num_cpus::get_physical().max(1)
}

/// 从文件加载 ONNX 模型并创建 CPU 推理会话
pub fn build_session(model_path: &Path, model_name: &str) -> Result<Session, SessionError> {
  info!("加载{}模型文件: {}", model_name, model_path.display());
  let model_data = std::fs::read(model_path)?;
  debug!(
    "模型文件大小: {:.2} MB",
    model_data.len() as f64 / (1024.0 * 1024.0)
  );

  if model_data.len() < MIN_MODEL_BYTES {
    return Err(SessionError::ModelTooSmall(
      model_path.display().to_string(),
      model_data.len(),
    ));
  }

  let threads = intra_op_threads();
  debug!("推理线程数: {}", threads);

  let session = Session::builder()
    .map_err(|e| SessionError::OrtError("创建会话构建器", e.to_string()))?
    .with_optimization_level(GraphOptimizationLevel::Level3)
    .map_err(|e| SessionError::OrtError("设置图优化级别", e.to_string()))?
    .with_intra_threads(threads)
    .map_err(|e| SessionError::OrtError("设置算子内线程数", e.to_string()))?
    .with_inter_threads(1)
    .map_err(|e| SessionError::OrtError("设置算子间线程数", e.to_string()))?
    .commit_from_memory(&model_data)
    .map_err(|e| SessionError::OrtError("加载模型", e.to_string()))?;

  info!("{}模型加载完成", model_name);
  Ok(session)
}
