//! 测量项目
//!
//! 一个项目包含采集的测点、叠加图层和默认导出坐标系。

use chrono::{DateTime, Utc};
use fieldcad_core::crs::WGS84_ID;
use fieldcad_core::layer::DrawingLayer;
use fieldcad_core::survey::PointStore;
use serde::{Deserialize, Serialize};

/// 项目元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ProjectMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            created_at: now,
            modified_at: now,
        }
    }

    /// 更新修改时间
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// 测量项目
#[derive(Debug, Clone)]
pub struct SurveyProject {
    pub metadata: ProjectMetadata,
    /// 测点导出使用的坐标系
    pub export_crs: String,
    pub points: PointStore,
    pub layers: Vec<DrawingLayer>,
}

impl SurveyProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ProjectMetadata::new(name),
            export_crs: WGS84_ID.to_string(),
            points: PointStore::new(),
            layers: Vec::new(),
        }
    }

    pub fn layer(&self, name: &str) -> Option<&DrawingLayer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut DrawingLayer> {
        self.layers.iter_mut().find(|l| l.name() == name)
    }

    pub fn add_layer(&mut self, layer: DrawingLayer) {
        self.layers.push(layer);
    }

    /// 删除图层，返回是否存在
    pub fn remove_layer(&mut self, name: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| l.name() != name);
        self.layers.len() != before
    }
}

impl Default for SurveyProject {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
