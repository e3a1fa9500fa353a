//! 程序配置
//!
//! 可选的 JSON 配置文件，所有字段都有默认值；命令行参数覆盖文件中的值。

use anyhow::{Context, Result};
use fieldcad_core::georef::AffineGeoConfig;
use fieldcad_core::snap::SnapConfig;
use fieldcad_core::survey::StakeoutConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

/// 程序配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 新导入图层的配准参数
    pub georef: AffineGeoConfig,
    /// 测点导出坐标系
    pub export_crs: String,
    pub snap: SnapConfig,
    pub stakeout: StakeoutConfig,
    /// 日志级别（trace/debug/info/warn/error）
    pub log_level: String,
    /// 捕捉时使用的地图缩放级别
    pub zoom: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            georef: AffineGeoConfig::default(),
            export_crs: "ITRF96_TM33".to_string(),
            snap: SnapConfig::default(),
            stakeout: StakeoutConfig::default(),
            log_level: "info".to_string(),
            zoom: 18.0,
        }
    }
}

impl AppConfig {
    /// 读取配置文件；未指定时使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// 日志级别，无法识别时为 INFO
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}
