// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/task.rs - 任务定义
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

use std::{thread, time::Duration};

use tracing::{error, info, warn};

use crate::catalog::ClassCatalog;
use crate::detector::{Detector, DetectorError};
use crate::frame::SourceImage;
use crate::orientation::resolve_orientation;
use crate::output::{FrameOverlay, Render};
use crate::overlay::OverlayRenderer;
use crate::session::DetectSession;

pub trait Task<I, D, O>: Sized {
  type Error;
  fn run_task(self, input: I, detector: D, output: O) -> Result<(), Self::Error>;
}

/// 单帧走完 提交-检测-落地-排版 一整圈
///
/// 检测失败时展示状态已被清空，是中止还是跳过由调用方决定。
fn detect_frame<D: Detector>(
  session: &mut DetectSession,
  renderer: &OverlayRenderer,
  detector: &D,
  frame: &SourceImage,
) -> Result<FrameOverlay, DetectorError> {
  let submission = session.begin();
  let correction = resolve_orientation(frame.orientation);
  match detector.detect(frame, correction) {
    Ok(observations) => {
      session.complete(submission, frame.image.clone(), observations);
    }
    Err(e) => {
      session.fail(submission);
      return Err(e);
    }
  }

  Ok(match session.view() {
    Some(view) => FrameOverlay::new(
      view.detections.clone(),
      renderer.render(&view.detections, session.catalog(), frame.display_surface()),
    ),
    None => FrameOverlay::empty(),
  })
}

pub struct OneShotTask {
  session: DetectSession,
  renderer: OverlayRenderer,
}

impl OneShotTask {
  pub fn new(catalog: ClassCatalog) -> Self {
    Self {
      session: DetectSession::new(catalog),
      renderer: OverlayRenderer::new(),
    }
  }
}

impl<
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = SourceImage>,
  D: Detector,
  O: Render<SourceImage, FrameOverlay, Error = RE>,
> Task<I, D, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(mut self, mut input: I, detector: D, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始检测...");
    let now = std::time::Instant::now();
    let overlay = detect_frame(&mut self.session, &self.renderer, &detector, &frame)?;
    let elapsed_a = now.elapsed();
    output.render_result(&frame, &overlay)?;
    let elapsed_b = now.elapsed();
    info!("检测完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);

    Ok(())
  }
}

pub struct BatchTask {
  session: DetectSession,
  renderer: OverlayRenderer,
  frame_limit: Option<usize>,
}

impl BatchTask {
  pub fn new(catalog: ClassCatalog) -> Self {
    Self {
      session: DetectSession::new(catalog),
      renderer: OverlayRenderer::new(),
      frame_limit: None,
    }
  }

  pub fn with_frame_limit(mut self, frame_limit: Option<usize>) -> Self {
    self.frame_limit = frame_limit;
    self
  }
}

impl<
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = SourceImage>,
  D: Detector,
  O: Render<SourceImage, FrameOverlay, Error = RE>,
> Task<I, D, O> for BatchTask
{
  type Error = anyhow::Error;

  fn run_task(mut self, input: I, detector: D, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
    .expect("Error setting Ctrl-C handler");

    let mut frame_index = 0;
    let mut now = std::time::Instant::now();
    for frame in input {
      frame_index = (frame_index + 1) % usize::MAX;
      info!("处理第 {} 帧图像: {}", frame_index, frame.name);
      match detect_frame(&mut self.session, &self.renderer, &detector, &frame) {
        Ok(overlay) => {
          let elapsed_a = now.elapsed();
          output.render_result(&frame, &overlay)?;
          let elapsed_b = now.elapsed();
          info!("检测完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);
        }
        Err(e) => {
          error!("第 {} 帧检测失败，跳过: {}", frame_index, e);
        }
      }
      now = std::time::Instant::now();
      if self.frame_limit.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，退出");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use image::RgbImage;

  use super::*;
  use crate::geometry::RawBox;
  use crate::observation::RawObservation;
  use crate::orientation::OrientationCorrection;

  struct StubDetector {
    fail_on: Option<&'static str>,
  }

  impl Detector for StubDetector {
    fn detect(
      &self,
      frame: &SourceImage,
      _correction: OrientationCorrection,
    ) -> Result<Vec<RawObservation>, DetectorError> {
      if self.fail_on == Some(frame.name.as_str()) {
        return Err(DetectorError::ModelUnavailable("测试桩".to_string()));
      }
      Ok(vec![RawObservation::new(
        RawBox {
          x: 0.1,
          y: 0.1,
          width: 0.2,
          height: 0.2,
        },
        "person",
        0.9,
      )])
    }
  }

  #[derive(Clone, Default)]
  struct CaptureOutput {
    frames: Arc<Mutex<Vec<(String, usize)>>>,
  }

  impl Render<SourceImage, FrameOverlay> for CaptureOutput {
    type Error = std::convert::Infallible;

    fn render_result(&self, frame: &SourceImage, result: &FrameOverlay) -> Result<(), Self::Error> {
      self
        .frames
        .lock()
        .unwrap()
        .push((frame.name.clone(), result.detections.len()));
      Ok(())
    }
  }

  fn frames(names: &[&str]) -> Vec<SourceImage> {
    names
      .iter()
      .map(|name| SourceImage::upright(*name, RgbImage::new(8, 8)))
      .collect()
  }

  #[test]
  fn one_shot_renders_first_frame_only() {
    let output = CaptureOutput::default();
    let captured = output.frames.clone();
    let task = OneShotTask::new(ClassCatalog::coco());

    task
      .run_task(
        frames(&["a.png", "b.png"]).into_iter(),
        StubDetector { fail_on: None },
        output,
      )
      .unwrap();

    let captured = captured.lock().unwrap();
    assert_eq!(captured.as_slice(), &[("a.png".to_string(), 1)]);
  }

  #[test]
  fn one_shot_without_frames_is_an_error() {
    let task = OneShotTask::new(ClassCatalog::coco());
    let outcome = task.run_task(
      std::iter::empty(),
      StubDetector { fail_on: None },
      CaptureOutput::default(),
    );
    assert!(outcome.is_err());
  }

  #[test]
  fn one_shot_detector_failure_aborts_without_output() {
    let output = CaptureOutput::default();
    let captured = output.frames.clone();
    let task = OneShotTask::new(ClassCatalog::coco());

    let outcome = task.run_task(
      frames(&["a.png"]).into_iter(),
      StubDetector {
        fail_on: Some("a.png"),
      },
      output,
    );

    assert!(outcome.is_err());
    assert!(captured.lock().unwrap().is_empty());
  }

  // ctrlc 信号回调整个进程只能注册一次，BatchTask 在本测试程序里只跑这一回
  #[test]
  fn batch_skips_failing_frames_and_keeps_going() {
    let output = CaptureOutput::default();
    let captured = output.frames.clone();
    let task = BatchTask::new(ClassCatalog::coco());

    task
      .run_task(
        frames(&["a.png", "b.png", "c.png"]).into_iter(),
        StubDetector {
          fail_on: Some("b.png"),
        },
        output,
      )
      .unwrap();

    let captured = captured.lock().unwrap();
    assert_eq!(
      captured.as_slice(),
      &[("a.png".to_string(), 1), ("c.png".to_string(), 1)]
    );
  }
}
