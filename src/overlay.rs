// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/overlay.rs - 检测结果的标注排版
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

use crate::catalog::ClassCatalog;
use crate::detection::Detection;
use crate::geometry::{DisplaySurface, PixelRect};

// 标注布局常量
const MIN_STROKE_WIDTH: f32 = 2.0;
const STROKE_WIDTH_DIVISOR: f32 = 300.0;
const MIN_CORNER_RADIUS: f32 = 4.0;
const CORNER_RADIUS_DIVISOR: f32 = 150.0;
const MIN_LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_FONT_SIZE_DIVISOR: f32 = 50.0;
const LABEL_CHAR_WIDTH_RATIO: f32 = 0.55; // 每字符平均宽度与字号之比（粗略估计）
const LABEL_LINE_HEIGHT_RATIO: f32 = 1.2;
const CHIP_HORIZONTAL_PADDING: f32 = 4.0;
const CHIP_VERTICAL_PADDING: f32 = 2.0;
const CHIP_MARGIN: f32 = 2.0;
const TEXT_COLOR: [u8; 3] = [255, 255, 255]; // 白色文本

/// 与呈现层无关的绘制指令
///
/// 排版结果只描述画什么，由呈现层决定怎么画。
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
  /// 描边矩形
  StrokeRect {
    rect: PixelRect,
    color: [u8; 3],
    stroke_width: f32,
    corner_radius: f32,
  },
  /// 实心矩形，用作标签底色
  FillRect { rect: PixelRect, color: [u8; 3] },
  /// 文本，坐标为左上角
  Text {
    x: f32,
    y: f32,
    content: String,
    color: [u8; 3],
    font_size: f32,
  },
}

/// 把检测结果排版成绘制指令
///
/// 线宽、圆角与字号随画面宽度缩放，画面大小变化时标注观感不变。
/// 排版是纯函数，不碰检测结果本身，可在任意线程上调用。
pub struct OverlayRenderer {
  /// 边界框颜色映射
  colors: Vec<[u8; 3]>,
}

impl Default for OverlayRenderer {
  fn default() -> Self {
    Self::new()
  }
}

impl OverlayRenderer {
  pub fn new() -> Self {
    // 生成 80 种不同的颜色（对应 COCO 数据集的 80 个类别）
    let colors: Vec<[u8; 3]> = (0..80)
      .map(|i| {
        let hue = (i as f32 / 80.0) * 360.0;
        Self::hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();
    Self { colors }
  }

  /// HSV 转 RGB
  fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
      (c, x, 0.0)
    } else if h < 120.0 {
      (x, c, 0.0)
    } else if h < 180.0 {
      (0.0, c, x)
    } else if h < 240.0 {
      (0.0, x, c)
    } else if h < 300.0 {
      (x, 0.0, c)
    } else {
      (c, 0.0, x)
    };

    [
      ((r + m) * 255.0) as u8,
      ((g + m) * 255.0) as u8,
      ((b + m) * 255.0) as u8,
    ]
  }

  fn color_for(&self, class_id: u32) -> [u8; 3] {
    self.colors[class_id as usize % self.colors.len()]
  }

  /// 估算文本大小（粗略估计），保证排版结果可复现
  fn measure_label(content: &str, font_size: f32) -> (f32, f32) {
    let width = content.chars().count() as f32 * font_size * LABEL_CHAR_WIDTH_RATIO;
    let height = font_size * LABEL_LINE_HEIGHT_RATIO;
    (width, height)
  }

  /// 排版一批检测结果，每条产出描边框、标签底色、标签文本三条指令
  ///
  /// 指令组顺序与检测结果顺序一致，底色始终排在对应文本之前。
  pub fn render(
    &self,
    detections: &[Detection],
    catalog: &ClassCatalog,
    surface: DisplaySurface,
  ) -> Vec<DrawPrimitive> {
    let stroke_width = (surface.width / STROKE_WIDTH_DIVISOR).max(MIN_STROKE_WIDTH);
    let corner_radius = (surface.width / CORNER_RADIUS_DIVISOR).max(MIN_CORNER_RADIUS);
    let font_size = (surface.width / LABEL_FONT_SIZE_DIVISOR).max(MIN_LABEL_FONT_SIZE);

    let mut primitives = Vec::with_capacity(detections.len() * 3);
    for detection in detections {
      let rect = detection.bbox.scale_to(surface);
      let color = self.color_for(detection.class_id);

      primitives.push(DrawPrimitive::StrokeRect {
        rect,
        color,
        stroke_width,
        corner_radius,
      });

      // 目录解析不到的编号也要给出可读标签，绝不留空
      let name = match catalog.label(detection.class_id) {
        Some(name) => name.to_string(),
        None => format!("ID:{}", detection.class_id),
      };
      let content = format!("{}: {:.2}", name, detection.score);

      let (text_width, text_height) = Self::measure_label(&content, font_size);
      let chip_width = text_width + 2.0 * CHIP_HORIZONTAL_PADDING;
      let chip_height = text_height + 2.0 * CHIP_VERTICAL_PADDING;
      // 标签挪到框的上方，顶到画面上沿为止
      let chip_x = rect.x;
      let chip_y = (rect.y - chip_height - CHIP_MARGIN).max(0.0);

      primitives.push(DrawPrimitive::FillRect {
        rect: PixelRect {
          x: chip_x,
          y: chip_y,
          width: chip_width,
          height: chip_height,
        },
        color,
      });
      primitives.push(DrawPrimitive::Text {
        x: chip_x + CHIP_HORIZONTAL_PADDING,
        y: chip_y + CHIP_VERTICAL_PADDING,
        content,
        color: TEXT_COLOR,
        font_size,
      });
    }
    primitives
  }
}
