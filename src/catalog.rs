// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/catalog.rs - 类别目录
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

use thiserror::Error;

use crate::observation::LabelToken;

/// COCO 80 类类别名，顺序即类别编号
pub const COCO_LABELS: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

/// 类别目录错误
#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("无法读取类别文件: {0}")]
  Io(#[from] std::io::Error),
  #[error("类别文件为空")]
  Empty,
}

/// 类别目录：类别编号与类别名的双向映射
///
/// 编号由条目在目录里的位置决定，检测器输出与展示共用同一份目录。
#[derive(Debug, Clone)]
pub struct ClassCatalog {
  labels: Vec<String>,
}

impl ClassCatalog {
  /// COCO 80 类目录
  pub fn coco() -> Self {
    Self::from_labels(COCO_LABELS.iter().map(|s| s.to_string()))
  }

  /// 从类别名序列构造目录
  pub fn from_labels<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      labels: labels.into_iter().map(Into::into).collect(),
    }
  }

  /// 从文本文件加载目录，每行一个类别名，空行忽略
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    let labels: Vec<String> = content
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect();
    if labels.is_empty() {
      return Err(CatalogError::Empty);
    }
    Ok(Self { labels })
  }

  /// 按编号取类别名，越界返回 None
  pub fn label(&self, class_id: u32) -> Option<&str> {
    self.labels.get(class_id as usize).map(String::as_str)
  }

  /// 把检测器给出的标签令牌折算成类别编号
  ///
  /// 名字要求逐字符完全一致，编号要求落在目录范围内，
  /// 否则一律返回 None，由调用方决定怎么处置。
  pub fn resolve(&self, token: &LabelToken) -> Option<u32> {
    match token {
      LabelToken::Index(index) => ((*index as usize) < self.labels.len()).then_some(*index),
      LabelToken::Name(name) => self
        .labels
        .iter()
        .position(|label| label == name)
        .map(|pos| pos as u32),
    }
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }
}
