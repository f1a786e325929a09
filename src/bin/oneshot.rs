// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/bin/oneshot.rs - 单图标注
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use miaohong::{
  FromUrl,
  catalog::ClassCatalog,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Miaohong 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 检测结果来源
  #[arg(long, value_name = "DETECTIONS")]
  pub detections: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 类别清单文件，缺省使用内置的 COCO 80 类
  #[arg(long, value_name = "CATALOG")]
  pub catalog: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("检测结果来源: {}", args.detections);
  info!("输出路径: {}", args.output);

  let input = miaohong::input::ImageFileInput::from_url(&args.input)?;
  let detector = miaohong::detector::ReplayDetector::from_url(&args.detections)?;
  let output = miaohong::output::SaveImageFileOutput::from_url(&args.output)?;

  let catalog = match &args.catalog {
    Some(path) => ClassCatalog::from_file(path)?,
    None => ClassCatalog::coco(),
  };

  OneShotTask::new(catalog).run_task(input.into_frames(), detector, output)?;

  Ok(())
}
