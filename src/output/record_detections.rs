// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/output/record_detections.rs - 检测记录输出
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

//! # 检测记录输出模块
//!
//! 把每一帧的标注图和检测记录写进按日期分层的目录，方便离线翻查。
//!
//! ## 目录布局
//!
//! `<根目录>/<年>/<月>/<日>/<帧名>-<序号>.png`，
//! 检测记录与图像同名，扩展名随格式。
//!
//! ## URL Scheme
//!
//! `record://`
//!
//! ## 基本用法
//!
//! ```no_run
//! use miaohong::{FromUrl, output::RecordOutput};
//! use url::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // JSON 记录，无检测结果的帧也落盘
//! let url = Url::parse("record:///var/lib/miaohong/records?format=json&always")?;
//! let output = RecordOutput::from_url(&url)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## 参数说明
//!
//! - `format` — 记录格式，`txt`（缺省）或 `json`
//! - `always` — 出现时连无检测结果的帧也记录
//! - `font` — 标注文本使用的字体文件路径

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Utc};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::detection::Detection;
use crate::frame::SourceImage;
use crate::output::{
  FrameOverlay, Render,
  draw::{Rasterizer, RasterizerError},
};
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("字体错误: {0}")]
  FontError(#[from] RasterizerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordFormat {
  Txt,
  Json,
}

pub struct RecordOutput {
  directory: PathBuf,
  format: RecordFormat,
  rasterizer: Rasterizer,
  frame_counter: Arc<Mutex<u16>>,
  always: bool,
}

impl FromUrlWithScheme for RecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordOutput {
  type Error = RecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RecordOutputError::SchemeMismatch);
    }

    let format = {
      let mut format = RecordFormat::Txt;
      for (key, value) in url.query_pairs() {
        if key == "format" {
          if value == "json" {
            format = RecordFormat::Json;
          }
          break;
        }
      }
      format
    };

    let always = url.query_pairs().any(|(key, _)| key == "always");

    let rasterizer = match url.query_pairs().find(|(key, _)| key == "font") {
      Some((_, font_path)) => Rasterizer::with_font_file(font_path.into_owned())?,
      None => Rasterizer::default(),
    };

    Ok(RecordOutput {
      directory: PathBuf::from(crate::percent_decoded_path(url)),
      format,
      rasterizer,
      frame_counter: Arc::new(Mutex::new(0)),
      always,
    })
  }
}

impl RecordOutput {
  fn frame_id(&self) -> u16 {
    let mut counter = self.frame_counter.lock().unwrap();
    let id = *counter + 1;
    *counter = id;
    id
  }

  fn frame_path(&self, frame_name: &str) -> Result<PathBuf, RecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    let stem = std::path::Path::new(frame_name)
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| frame_name.to_string());

    Ok(directory.join(format!("{}-{:04X}.png", stem, self.frame_id())))
  }

  fn record(
    &self,
    detections: &[Detection],
    path: &std::path::Path,
  ) -> Result<(), RecordOutputError> {
    match self.format {
      RecordFormat::Json => {
        let content = serde_json::to_string_pretty(detections)?;
        std::fs::write(path.with_extension("json"), content)?;
      }
      RecordFormat::Txt => {
        let mut records = Vec::with_capacity(detections.len());
        for detection in detections {
          records.push(format!(
            "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
            detection.class_id,
            detection.score,
            detection.bbox.x,
            detection.bbox.y,
            detection.bbox.width,
            detection.bbox.height
          ));
        }
        std::fs::write(path.with_extension("txt"), records.join("\n"))?;
      }
    }
    Ok(())
  }
}

impl Render<SourceImage, FrameOverlay> for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(&self, frame: &SourceImage, result: &FrameOverlay) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      debug!("帧 {} 没有检测结果，跳过记录", frame.name);
      return Ok(());
    }

    let path = self.frame_path(&frame.name)?;
    let mut image = frame.image.clone();
    self.rasterizer.draw(&mut image, &result.primitives);
    image.save(&path)?;
    self.record(&result.detections, &path)?;
    info!("记录帧 {} 到 {}", frame.name, path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use image::RgbImage;

  use super::*;
  use crate::catalog::ClassCatalog;
  use crate::detection::DetectionNormalizer;
  use crate::geometry::RawBox;
  use crate::observation::RawObservation;
  use crate::overlay::OverlayRenderer;

  fn overlay_with_one_person(frame: &SourceImage) -> FrameOverlay {
    let catalog = ClassCatalog::coco();
    let observations = vec![RawObservation::new(
      RawBox {
        x: 0.1,
        y: 0.2,
        width: 0.3,
        height: 0.4,
      },
      "person",
      0.9,
    )];
    let detections = DetectionNormalizer::new().normalize(&observations, &catalog);
    let primitives =
      OverlayRenderer::new().render(&detections, &catalog, frame.display_surface());
    FrameOverlay::new(detections, primitives)
  }

  fn collect_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
      for entry in std::fs::read_dir(&dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
          stack.push(path);
        } else {
          files.push(path);
        }
      }
    }
    files.sort();
    files
  }

  #[test]
  fn writes_png_and_txt_record_into_dated_directory() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("record://{}", dir.path().display())).unwrap();
    let output = RecordOutput::from_url(&url).unwrap();

    let frame = SourceImage::upright("street.png", RgbImage::new(32, 32));
    let overlay = overlay_with_one_person(&frame);
    output.render_result(&frame, &overlay).unwrap();

    let files = collect_files(dir.path());
    assert_eq!(files.len(), 2);
    let png = files.iter().find(|p| p.extension().unwrap() == "png").unwrap();
    let txt = files.iter().find(|p| p.extension().unwrap() == "txt").unwrap();
    assert!(png.file_name().unwrap().to_string_lossy().starts_with("street-"));

    let record = std::fs::read_to_string(txt).unwrap();
    assert!(record.starts_with("0, 0.9000"));
  }

  #[test]
  fn json_format_serializes_detections() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("record://{}?format=json", dir.path().display())).unwrap();
    let output = RecordOutput::from_url(&url).unwrap();

    let frame = SourceImage::upright("street.png", RgbImage::new(32, 32));
    let overlay = overlay_with_one_person(&frame);
    output.render_result(&frame, &overlay).unwrap();

    let files = collect_files(dir.path());
    let json = files.iter().find(|p| p.extension().unwrap() == "json").unwrap();
    let parsed: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
    assert_eq!(parsed[0]["class_id"], 0);
  }

  #[test]
  fn empty_frames_are_skipped_unless_always() {
    let frame = SourceImage::upright("empty.png", RgbImage::new(16, 16));

    let quiet_dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("record://{}", quiet_dir.path().display())).unwrap();
    let output = RecordOutput::from_url(&url).unwrap();
    output.render_result(&frame, &FrameOverlay::empty()).unwrap();
    assert!(std::fs::read_dir(quiet_dir.path()).unwrap().next().is_none());

    let always_dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("record://{}?always", always_dir.path().display())).unwrap();
    let output = RecordOutput::from_url(&url).unwrap();
    output.render_result(&frame, &FrameOverlay::empty()).unwrap();
    assert_eq!(collect_files(always_dir.path()).len(), 2);
  }
}
