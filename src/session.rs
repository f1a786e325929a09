// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/session.rs - 单图检测会话的展示状态
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

use image::RgbImage;
use tracing::debug;

use crate::catalog::ClassCatalog;
use crate::detection::{Detection, DetectionNormalizer};
use crate::observation::RawObservation;

/// 一次提交的凭据，由 [`DetectSession::begin`] 发出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
  serial: u64,
}

/// 提交结果的落地情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
  /// 结果已写入展示状态
  Applied,
  /// 已有更新的提交，该结果被废弃
  Superseded,
}

/// 当前展示的图像与其检测结果，二者始终一起更新
#[derive(Debug, Clone)]
pub struct SessionView {
  pub image: RgbImage,
  pub detections: Vec<Detection>,
}

/// 单图检测会话
///
/// 每次提交拿到一个单调递增的序号，只有最近一次提交的结果才允许
/// 落到展示状态上：先提交后完成的旧结果一律废弃，保证后提交者胜出。
/// 当前提交失败时清空展示状态，绝不让旧结果陪着失败一起挂在界面上。
pub struct DetectSession {
  catalog: ClassCatalog,
  normalizer: DetectionNormalizer,
  next_serial: u64,
  latest: Option<u64>,
  view: Option<SessionView>,
}

impl DetectSession {
  pub fn new(catalog: ClassCatalog) -> Self {
    Self {
      catalog,
      normalizer: DetectionNormalizer::new(),
      next_serial: 0,
      latest: None,
      view: None,
    }
  }

  pub fn catalog(&self) -> &ClassCatalog {
    &self.catalog
  }

  /// 登记一次新提交，此后更早的提交全部过期
  pub fn begin(&mut self) -> Submission {
    self.next_serial += 1;
    let serial = self.next_serial;
    self.latest = Some(serial);
    debug!("登记提交 #{}", serial);
    Submission { serial }
  }

  /// 提交的检测结果就绪
  ///
  /// 只有最近一次登记的提交才会被采纳，图像与检测结果一并写入。
  pub fn complete(
    &mut self,
    submission: Submission,
    image: RgbImage,
    observations: Vec<RawObservation>,
  ) -> Completion {
    if self.latest != Some(submission.serial) {
      debug!("提交 #{} 的结果迟到，废弃", submission.serial);
      return Completion::Superseded;
    }
    let detections = self.normalizer.normalize(&observations, &self.catalog);
    debug!(
      "提交 #{} 落地，{} 条观测归一化为 {} 条检测",
      submission.serial,
      observations.len(),
      detections.len()
    );
    self.view = Some(SessionView { image, detections });
    Completion::Applied
  }

  /// 提交失败
  ///
  /// 当前提交失败时清空展示状态；过期提交的失败不影响现状。
  pub fn fail(&mut self, submission: Submission) -> Completion {
    if self.latest != Some(submission.serial) {
      debug!("提交 #{} 的失败迟到，忽略", submission.serial);
      return Completion::Superseded;
    }
    debug!("提交 #{} 失败，清空展示状态", submission.serial);
    self.view = None;
    Completion::Applied
  }

  /// 当前展示的图像与检测结果
  pub fn view(&self) -> Option<&SessionView> {
    self.view.as_ref()
  }

  /// 清空会话，序号继续单调递增
  pub fn reset(&mut self) {
    self.latest = None;
    self.view = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::RawBox;

  fn person_at(x: f32) -> RawObservation {
    RawObservation::new(
      RawBox {
        x,
        y: 0.1,
        width: 0.2,
        height: 0.2,
      },
      "person",
      0.9,
    )
  }

  fn image() -> RgbImage {
    RgbImage::new(2, 2)
  }

  #[test]
  fn current_submission_installs_view() {
    let mut session = DetectSession::new(ClassCatalog::coco());
    let submission = session.begin();
    let outcome = session.complete(submission, image(), vec![person_at(0.1)]);
    assert_eq!(outcome, Completion::Applied);
    let view = session.view().unwrap();
    assert_eq!(view.detections.len(), 1);
  }

  #[test]
  fn late_result_never_overwrites_newer_submission() {
    let mut session = DetectSession::new(ClassCatalog::coco());
    let old = session.begin();
    let new = session.begin();

    assert_eq!(
      session.complete(new, image(), vec![person_at(0.5)]),
      Completion::Applied
    );
    // 旧提交的结果此时才到
    assert_eq!(
      session.complete(old, image(), vec![person_at(0.1)]),
      Completion::Superseded
    );

    let view = session.view().unwrap();
    assert_eq!(view.detections.len(), 1);
    assert!((view.detections[0].bbox.x - 0.5).abs() < 1e-6);
  }

  #[test]
  fn stale_result_before_newer_completes_shows_nothing() {
    let mut session = DetectSession::new(ClassCatalog::coco());
    let old = session.begin();
    let _new = session.begin();

    assert_eq!(
      session.complete(old, image(), vec![person_at(0.1)]),
      Completion::Superseded
    );
    assert!(session.view().is_none());
  }

  #[test]
  fn failure_of_current_submission_clears_view() {
    let mut session = DetectSession::new(ClassCatalog::coco());
    let first = session.begin();
    session.complete(first, image(), vec![person_at(0.1)]);
    assert!(session.view().is_some());

    let second = session.begin();
    assert_eq!(session.fail(second), Completion::Applied);
    assert!(session.view().is_none());
  }

  #[test]
  fn stale_failure_leaves_view_alone() {
    let mut session = DetectSession::new(ClassCatalog::coco());
    let old = session.begin();
    session.complete(old, image(), vec![person_at(0.1)]);

    let new = session.begin();
    session.complete(new, image(), vec![person_at(0.5)]);

    // 旧提交这时才报失败，不能动新结果
    assert_eq!(session.fail(old), Completion::Superseded);
    let view = session.view().unwrap();
    assert!((view.detections[0].bbox.x - 0.5).abs() < 1e-6);
  }

  #[test]
  fn reset_clears_view_and_pending_submission() {
    let mut session = DetectSession::new(ClassCatalog::coco());
    let submission = session.begin();
    session.complete(submission, image(), vec![person_at(0.1)]);
    session.reset();
    assert!(session.view().is_none());
    // 清空后旧凭据不再有效
    assert_eq!(
      session.complete(submission, image(), vec![person_at(0.1)]),
      Completion::Superseded
    );
  }
}
