//! 图纸解码结果与地理配准
//!
//! 解析（文件 -> [`CadDrawing`]）和配准（[`CadDrawing`] -> 要素）是两个独立阶段。
//! 修改配准参数只需对已解析的实体重新执行 [`CadDrawing::georeference`]，
//! 不需要重新读取源文件。

use crate::feature::{FeatureCollection, GeoFeature, GeoGeometry};
use crate::geometry::{CadEntity, CadGeometry};
use crate::georef::GeoTransform;
use crate::math::{LatLng, Point2};
use serde::{Deserialize, Serialize};

/// 图层表中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    /// 图层颜色索引，未设置时为 None
    pub color: Option<i16>,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>, color: Option<i16>) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// 已解析的图纸：实体列表 + 图层表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadDrawing {
    pub entities: Vec<CadEntity>,
    pub layers: Vec<LayerInfo>,
}

impl CadDrawing {
    pub fn new(entities: Vec<CadEntity>, layers: Vec<LayerInfo>) -> Self {
        Self { entities, layers }
    }

    pub fn layer(&self, name: &str) -> Option<&LayerInfo> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// 出现过的所有图层名（图层表在前，实体引用的其余图层按首次出现顺序在后）
    pub fn layer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let table = self.layers.iter().map(|l| l.name.as_str());
        let referenced = self.entities.iter().map(|e| e.layer.as_str());
        for name in table.chain(referenced) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// 实体的显示颜色
    pub fn resolve_color(&self, entity: &CadEntity) -> &'static str {
        let layer_color = self.layer(&entity.layer).and_then(|l| l.color);
        entity.color.resolve(layer_color)
    }

    /// 用给定变换把所有实体转换为地理要素
    ///
    /// 少于 2 个顶点的多段线被丢弃。退化的投影结果按回退坐标保留。
    pub fn georeference(&self, transform: &GeoTransform) -> FeatureCollection {
        let mut degenerate = 0usize;
        let mut map = |p: Point2| -> LatLng {
            let outcome = transform.to_geographic(p.x, p.y);
            if outcome.is_degenerate() {
                degenerate += 1;
            }
            outcome.lat_lng()
        };

        let mut features = Vec::with_capacity(self.entities.len());
        for entity in &self.entities {
            let geometry = match &entity.geometry {
                CadGeometry::Point(point) => GeoGeometry::Point(map(point.position)),
                CadGeometry::Line(line) => GeoGeometry::LineString(vec![map(line.start), map(line.end)]),
                CadGeometry::Polyline(polyline) => {
                    if polyline.is_degenerate() {
                        continue;
                    }
                    GeoGeometry::LineString(polyline.vertices.iter().map(|v| map(*v)).collect())
                }
                CadGeometry::Arc(arc) => {
                    GeoGeometry::LineString(arc.tessellate().into_iter().map(&mut map).collect())
                }
            };

            let mut feature = GeoFeature::new(geometry)
                .with_property("layer", entity.layer.as_str())
                .with_property("color", self.resolve_color(entity));
            if let Some(handle) = &entity.handle {
                feature = feature.with_property("handle", handle.as_str());
            }
            features.push(feature);
        }

        tracing::debug!(
            crs = transform.crs_id(),
            entities = self.entities.len(),
            features = features.len(),
            degenerate,
            "Georeferenced drawing"
        );

        FeatureCollection::new(features)
    }
}
