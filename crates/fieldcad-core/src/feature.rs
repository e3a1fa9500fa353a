//! 地理要素
//!
//! 与 GeoJSON 结构对应的要素模型。坐标一律为 WGS84 经纬度。
//! 要素是派生数据：配准参数变化时整体重算，不做增量修补。

use crate::geodesic::{self, EdgeLength};
use crate::math::{GeoBounds, LatLng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Properties = BTreeMap<String, serde_json::Value>;

/// 要素几何
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeoGeometry {
    Point(LatLng),
    LineString(Vec<LatLng>),
    /// 第一个环为外环
    Polygon(Vec<Vec<LatLng>>),
}

impl GeoGeometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            GeoGeometry::Point(_) => "Point",
            GeoGeometry::LineString(_) => "LineString",
            GeoGeometry::Polygon(_) => "Polygon",
        }
    }

    /// 所有顶点
    pub fn positions(&self) -> Box<dyn Iterator<Item = LatLng> + '_> {
        match self {
            GeoGeometry::Point(p) => Box::new(std::iter::once(*p)),
            GeoGeometry::LineString(line) => Box::new(line.iter().copied()),
            GeoGeometry::Polygon(rings) => Box::new(rings.iter().flatten().copied()),
        }
    }

    /// 面的外环
    pub fn exterior_ring(&self) -> Option<&[LatLng]> {
        match self {
            GeoGeometry::Polygon(rings) => rings.first().map(Vec::as_slice),
            _ => None,
        }
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(self.positions())
    }
}

/// 地理要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    pub geometry: GeoGeometry,
    pub properties: Properties,
}

impl GeoFeature {
    pub fn new(geometry: GeoGeometry) -> Self {
        Self {
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// `layer` 属性，渲染时用于子图层过滤
    pub fn layer(&self) -> Option<&str> {
        self.properties.get("layer").and_then(|v| v.as_str())
    }

    pub fn color(&self) -> Option<&str> {
        self.properties.get("color").and_then(|v| v.as_str())
    }
}

/// 要素集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<GeoFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<GeoFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoFeature> {
        self.features.iter()
    }

    /// 只含面要素的迭代器
    pub fn polygons(&self) -> impl Iterator<Item = &GeoFeature> {
        self.features
            .iter()
            .filter(|f| matches!(f.geometry, GeoGeometry::Polygon(_)))
    }

    /// 所有面要素各个环的边长标注
    pub fn parcel_edge_lengths(&self) -> Vec<EdgeLength> {
        self.polygons()
            .filter_map(|f| match &f.geometry {
                GeoGeometry::Polygon(rings) => Some(rings),
                _ => None,
            })
            .flatten()
            .flat_map(|ring| geodesic::edge_lengths(ring))
            .collect()
    }

    /// 整体包围盒（缩放到图层）
    pub fn bounds(&self) -> Option<GeoBounds> {
        let mut result: Option<GeoBounds> = None;
        for bounds in self.features.iter().filter_map(|f| f.geometry.bounds()) {
            match result.as_mut() {
                Some(acc) => acc.merge(&bounds),
                None => result = Some(bounds),
            }
        }
        result
    }
}

impl FromIterator<GeoFeature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = GeoFeature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lng: f64, lat: f64) -> GeoFeature {
        GeoFeature::new(GeoGeometry::Polygon(vec![vec![
            LatLng::new(lat, lng),
            LatLng::new(lat, lng + 0.01),
            LatLng::new(lat + 0.01, lng + 0.01),
            LatLng::new(lat, lng),
        ]]))
    }

    #[test]
    fn test_collection_bounds() {
        let fc = FeatureCollection::new(vec![
            square(29.0, 41.0),
            GeoFeature::new(GeoGeometry::Point(LatLng::new(40.0, 30.0))),
        ]);
        let bounds = fc.bounds().unwrap();
        assert_eq!(bounds.south_west, LatLng::new(40.0, 29.0));
        assert!((bounds.north_east.lat - 41.01).abs() < 1e-12);
        assert_eq!(bounds.north_east.lng, 30.0);
        assert_eq!(fc.polygons().count(), 1);
    }

    #[test]
    fn test_layer_property() {
        let f = GeoFeature::new(GeoGeometry::Point(LatLng::new(0.0, 0.0)))
            .with_property("layer", "WALLS")
            .with_property("color", "#ff0000");
        assert_eq!(f.layer(), Some("WALLS"));
        assert_eq!(f.color(), Some("#ff0000"));
    }

    #[test]
    fn test_parcel_edge_lengths() {
        let line = GeoFeature::new(GeoGeometry::LineString(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
        ]));
        let fc = FeatureCollection::new(vec![square(29.0, 41.0), line]);

        // 线要素不标注，方块外环三条边
        let edges = fc.parcel_edge_lengths();
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|e| e.length_m > 800.0 && e.length_m < 1500.0));
        assert!(edges[0].label().ends_with(" m"));
    }

    #[test]
    fn test_empty_collection_has_no_bounds() {
        assert!(FeatureCollection::default().bounds().is_none());
    }
}
