// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use kaimozhi::speech::DEFAULT_TTS_ENDPOINT;

/// Kaimozhi 泰米尔语 ↔ 马拉雅拉姆语手语识别
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分类模型，例如 onnx:///models/mobile_98.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 背景分割模型，例如 onnx:///models/u2net.onnx；缺省时不去除背景
  #[arg(long, value_name = "MODEL")]
  pub background: Option<Url>,

  /// 类别标签文件 (JSON，整数下标到标签)
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,

  /// 类别表 (TOML)；缺省时使用内置类别表
  #[arg(long, value_name = "FILE")]
  pub signs: Option<PathBuf>,

  /// 内置类别表中相对路径的根目录
  #[arg(long, default_value = ".", value_name = "DIR")]
  pub assets: PathBuf,

  /// 覆盖类别表中的占位图像
  #[arg(long, value_name = "FILE")]
  pub placeholder: Option<PathBuf>,

  /// 上传来源
  /// - 单个文件: image:///path/to/sign.jpg
  /// - 目录: folder:///path/to/inbox
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 额外输出，可重复
  /// - 结果面板: image:///tmp/panel.png?font=/path/to/font.ttf
  /// - 记录目录: folder:///tmp/records?failures
  #[arg(long, value_name = "OUTPUT")]
  pub output: Vec<Url>,

  /// 朗读音频文件，每次上传覆盖写入
  #[arg(long, default_value = "output.mp3", value_name = "FILE")]
  pub audio: PathBuf,

  /// 语音合成服务地址
  #[arg(long, default_value = DEFAULT_TTS_ENDPOINT, value_name = "URL")]
  pub speech_endpoint: String,

  /// 处理输入中的所有上传图像，失败后继续
  #[arg(long)]
  pub continuous: bool,

  /// 连续模式下最多处理的上传数量
  #[arg(long, value_name = "COUNT")]
  pub frame_number: Option<usize>,
}
