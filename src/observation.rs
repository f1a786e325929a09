// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/observation.rs - 检测器边界上的原始观测
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

use serde::{Deserialize, Serialize};

use crate::geometry::RawBox;

/// 检测器给出的标签令牌，可能是类别编号也可能是类别名
///
/// 变体顺序即反序列化尝试顺序，JSON 里的整数先按编号解析。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelToken {
  Index(u32),
  Name(String),
}

impl fmt::Display for LabelToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LabelToken::Index(index) => write!(f, "#{}", index),
      LabelToken::Name(name) => write!(f, "{}", name),
    }
  }
}

impl From<u32> for LabelToken {
  fn from(index: u32) -> Self {
    LabelToken::Index(index)
  }
}

impl From<&str> for LabelToken {
  fn from(name: &str) -> Self {
    LabelToken::Name(name.to_string())
  }
}

/// 检测器边界上的一条原始观测，未经任何校验
///
/// 包围框是左下角原点的归一化坐标，坐标轴向的换算发生在归一化阶段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
  pub bbox: RawBox,
  pub label: LabelToken,
  pub score: f32,
}

impl RawObservation {
  pub fn new(bbox: RawBox, label: impl Into<LabelToken>, score: f32) -> Self {
    Self {
      bbox,
      label: label.into(),
      score,
    }
  }
}
