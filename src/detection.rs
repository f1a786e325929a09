// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/detection.rs - 观测归一化与检测结果构造
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

use std::fmt;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::ClassCatalog;
use crate::geometry::NormalizedRect;
use crate::observation::RawObservation;

/// 检测结果的标识，构造时生成，仅用于列表差分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DetectionId(Uuid);

impl DetectionId {
  fn fresh() -> Self {
    Self(Uuid::new_v4())
  }
}

impl fmt::Display for DetectionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// 一条通过全部校验的检测结果
///
/// 包围框是左上角原点的归一化坐标，保证落在单位正方形内且宽高为正；
/// 类别编号保证在目录范围内。构造后不再修改。
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
  pub id: DetectionId,
  pub class_id: u32,
  pub score: f32,
  pub bbox: NormalizedRect,
}

/// 标识只服务列表差分，内容比较时忽略
impl PartialEq for Detection {
  fn eq(&self, other: &Self) -> bool {
    self.class_id == other.class_id && self.score == other.score && self.bbox == other.bbox
  }
}

/// 把检测器边界上的原始观测折算成可展示的检测结果
///
/// 逐条走标签解析、纵轴翻转、钳制、退化校验四步，
/// 任何一步不过就丢弃该条观测，绝不让整批失败。
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionNormalizer;

impl DetectionNormalizer {
  pub fn new() -> Self {
    Self
  }

  /// 归一化一批观测，输出顺序与输入一致（被丢弃的条目除外）
  pub fn normalize(
    &self,
    observations: &[RawObservation],
    catalog: &ClassCatalog,
  ) -> Vec<Detection> {
    let mut detections = Vec::with_capacity(observations.len());
    for observation in observations {
      let Some(class_id) = catalog.resolve(&observation.label) else {
        debug!("丢弃目录之外的标签: {}", observation.label);
        continue;
      };
      // 朝向修正已在检测器调用处生效，这里只剩纵轴翻转
      let bbox = NormalizedRect::from_bottom_left(&observation.bbox).clamp_unit();
      if bbox.is_degenerate() {
        debug!("丢弃钳制后退化的包围框: {:?}", observation.bbox);
        continue;
      }
      detections.push(Detection {
        id: DetectionId::fresh(),
        class_id,
        score: observation.score,
        bbox,
      });
    }
    detections
  }
}
