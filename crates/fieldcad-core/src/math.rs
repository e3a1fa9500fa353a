//! 基础数学类型
//!
//! 平面坐标使用 nalgebra 的 `Point2<f64>`，地理坐标使用 [`LatLng`]。
//! 两者不可混用：`Point2` 总是某个坐标系（CRS）下的平面坐标，
//! `LatLng` 总是 WGS84 经纬度（度）。

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

/// WGS84 经纬度（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// GeoJSON 顺序 `[lng, lat]`
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn from_lng_lat(coord: [f64; 2]) -> Self {
        Self::new(coord[1], coord[0])
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

/// 经纬度包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub fn from_point(p: LatLng) -> Self {
        Self {
            south_west: p,
            north_east: p,
        }
    }

    /// 从点集计算包围盒，空集返回 None
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::from_point(first);
        for p in iter {
            bounds.expand_to_include(p);
        }
        Some(bounds)
    }

    pub fn expand_to_include(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn merge(&mut self, other: &GeoBounds) {
        self.expand_to_include(other.south_west);
        self.expand_to_include(other.north_east);
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_points() {
        let bounds = GeoBounds::from_points([
            LatLng::new(41.0, 29.0),
            LatLng::new(40.5, 29.5),
            LatLng::new(41.2, 28.8),
        ])
        .unwrap();

        assert_eq!(bounds.south_west, LatLng::new(40.5, 28.8));
        assert_eq!(bounds.north_east, LatLng::new(41.2, 29.5));
        assert!(bounds.contains(LatLng::new(41.0, 29.0)));
        assert!(!bounds.contains(LatLng::new(42.0, 29.0)));
    }

    #[test]
    fn test_bounds_empty() {
        assert!(GeoBounds::from_points(Vec::new()).is_none());
    }
}
