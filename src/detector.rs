// 该文件是 Miaohong （描红识物） 项目的一部分。
// src/detector.rs - 检测器边界
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

use thiserror::Error;

use crate::frame::SourceImage;
use crate::observation::RawObservation;
use crate::orientation::OrientationCorrection;

/// 检测器边界错误，对当前图像是致命的
#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("模型不可用: {0}")]
  ModelUnavailable(String),
  #[error("检测调用失败: {0}")]
  Invocation(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DetectorError {
  pub fn invocation(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    DetectorError::Invocation(Box::new(err))
  }
}

/// 外部检测器的统一入口
///
/// 检测器拿到解码后的图像和朝向修正，返回已做过 NMS 的原始观测。
/// 任何适配器都必须把自家结果折算成 [`RawObservation`] 的固定形状，
/// 流水线内部不做运行时类型分辨。
pub trait Detector {
  fn detect(
    &self,
    frame: &SourceImage,
    correction: OrientationCorrection,
  ) -> Result<Vec<RawObservation>, DetectorError>;
}

#[cfg(feature = "replay_detections")]
pub use self::replay::{ReplayDetector, ReplayError};

#[cfg(feature = "replay_detections")]
mod replay {
  use std::path::{Path, PathBuf};

  use thiserror::Error;
  use tracing::{debug, info, warn};
  use url::Url;

  use super::{Detector, DetectorError};
  use crate::frame::SourceImage;
  use crate::observation::RawObservation;
  use crate::orientation::OrientationCorrection;
  use crate::{FromUrl, FromUrlWithScheme};

  const REPLAY_SCHEME: &str = "replay";

  /// 回放检测器错误
  #[derive(Error, Debug)]
  pub enum ReplayError {
    #[error("回放地址错误: {0}")]
    PathError(String),
    #[error("无法读取回放文件: {0}")]
    Io(#[from] std::io::Error),
    #[error("回放文件格式错误: {0}")]
    Parse(#[from] serde_json::Error),
  }

  enum ReplaySource {
    /// 单个转储文件，对每一帧都给出同一批观测
    Dump(Vec<RawObservation>),
    /// 目录下按帧名找 `<名字>.json` 伴随文件
    Sidecars(PathBuf),
  }

  /// 从 JSON 转储回放原始观测的检测器
  ///
  /// 让整条流水线在没有任何推理运行时的机器上也能跑通，
  /// 转储里的观测已经在修正后的坐标系里。
  pub struct ReplayDetector {
    source: ReplaySource,
  }

  impl FromUrl for ReplayDetector {
    type Error = ReplayError;

    fn from_url(url: &Url) -> Result<Self, Self::Error> {
      if url.scheme() != REPLAY_SCHEME {
        return Err(ReplayError::PathError(format!(
          "回放地址必须使用 {} 方案",
          REPLAY_SCHEME
        )));
      }

      let path = PathBuf::from(crate::percent_decoded_path(url));

      if path.is_dir() {
        info!("按目录回放观测: {}", path.display());
        Ok(Self {
          source: ReplaySource::Sidecars(path),
        })
      } else {
        // 转储文件在构造时整个读入，缺失或损坏当场暴露
        info!("加载观测转储: {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        let observations: Vec<RawObservation> = serde_json::from_str(&content)?;
        debug!("转储共 {} 条观测", observations.len());
        Ok(Self {
          source: ReplaySource::Dump(observations),
        })
      }
    }
  }

  impl FromUrlWithScheme for ReplayDetector {
    const SCHEME: &'static str = REPLAY_SCHEME;
  }

  impl ReplayDetector {
    fn sidecar_path(dir: &Path, frame_name: &str) -> PathBuf {
      let stem = Path::new(frame_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| frame_name.to_string());
      dir.join(format!("{}.json", stem))
    }
  }

  impl Detector for ReplayDetector {
    fn detect(
      &self,
      frame: &SourceImage,
      _correction: OrientationCorrection,
    ) -> Result<Vec<RawObservation>, DetectorError> {
      match &self.source {
        ReplaySource::Dump(observations) => Ok(observations.clone()),
        ReplaySource::Sidecars(dir) => {
          let path = Self::sidecar_path(dir, &frame.name);
          if !path.exists() {
            warn!("帧 {} 没有伴随转储，按无观测处理", frame.name);
            return Ok(Vec::new());
          }
          let content = std::fs::read_to_string(&path).map_err(DetectorError::invocation)?;
          let observations: Vec<RawObservation> =
            serde_json::from_str(&content).map_err(DetectorError::invocation)?;
          debug!("帧 {} 回放 {} 条观测", frame.name, observations.len());
          Ok(observations)
        }
      }
    }
  }

  #[cfg(test)]
  mod tests {
    use std::io::Write;

    use image::RgbImage;

    use super::*;
    use crate::geometry::RawBox;

    fn dump_json() -> String {
      let observations = vec![
        RawObservation::new(
          RawBox {
            x: 0.1,
            y: 0.2,
            width: 0.3,
            height: 0.4,
          },
          "person",
          0.9,
        ),
        RawObservation::new(
          RawBox {
            x: 0.5,
            y: 0.5,
            width: 0.2,
            height: 0.2,
          },
          16u32,
          0.7,
        ),
      ];
      serde_json::to_string(&observations).unwrap()
    }

    fn frame(name: &str) -> SourceImage {
      SourceImage::upright(name, RgbImage::new(4, 4))
    }

    #[test]
    fn dump_file_replays_for_every_frame() {
      let mut file = tempfile::NamedTempFile::new().unwrap();
      file.write_all(dump_json().as_bytes()).unwrap();

      let url = Url::parse(&format!("replay://{}", file.path().display())).unwrap();
      let detector = ReplayDetector::from_url(&url).unwrap();

      let first = detector
        .detect(&frame("a.png"), OrientationCorrection::UPRIGHT)
        .unwrap();
      let second = detector
        .detect(&frame("b.png"), OrientationCorrection::UPRIGHT)
        .unwrap();
      assert_eq!(first.len(), 2);
      assert_eq!(first, second);
    }

    #[test]
    fn sidecar_directory_matches_frame_stem() {
      let dir = tempfile::tempdir().unwrap();
      std::fs::write(dir.path().join("a.json"), dump_json()).unwrap();

      let url = Url::parse(&format!("replay://{}", dir.path().display())).unwrap();
      let detector = ReplayDetector::from_url(&url).unwrap();

      let with_sidecar = detector
        .detect(&frame("a.png"), OrientationCorrection::UPRIGHT)
        .unwrap();
      assert_eq!(with_sidecar.len(), 2);

      // 没有伴随文件的帧按无观测处理
      let without = detector
        .detect(&frame("b.png"), OrientationCorrection::UPRIGHT)
        .unwrap();
      assert!(without.is_empty());
    }

    #[test]
    fn missing_dump_fails_at_construction() {
      let url = Url::parse("replay:///no/such/dump.json").unwrap();
      assert!(matches!(
        ReplayDetector::from_url(&url),
        Err(ReplayError::Io(_))
      ));
    }

    #[test]
    fn scheme_is_checked() {
      let url = Url::parse("file:///tmp/dump.json").unwrap();
      assert!(matches!(
        ReplayDetector::from_url(&url),
        Err(ReplayError::PathError(_))
      ));
    }
  }
}
