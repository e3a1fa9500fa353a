//! 测点、放样与量测
//!
//! - [`PointStore`]：用户采集的测点，自动命名 `P-1`, `P-2`, ...
//! - [`StakeoutSession`]：通过 ID 引用目标测点，距离与方位角每次按需计算
//! - [`MeasurementPath`]：只追加的量测折线，可整体清空

use crate::error::{CoreError, CoreResult};
use crate::geodesic;
use crate::math::LatLng;
use serde::{Deserialize, Serialize};

/// 采集的测点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPoint {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl RecordedPoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: LatLng) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat: position.lat,
            lng: position.lng,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// 放样配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeoutConfig {
    /// 小于该距离（米）视为到达目标
    pub arrival_radius_m: f64,
}

impl Default for StakeoutConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: 1.0,
        }
    }
}

/// 放样会话：只保存目标 ID 与最近一次位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeoutSession {
    pub target_point_id: String,
    pub last_known_position: Option<LatLng>,
}

impl StakeoutSession {
    pub fn new(target_point_id: impl Into<String>) -> Self {
        Self {
            target_point_id: target_point_id.into(),
            last_known_position: None,
        }
    }

    pub fn update_position(&mut self, position: LatLng) {
        self.last_known_position = Some(position);
    }
}

/// 放样读数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StakeoutReading {
    pub distance_m: f64,
    pub bearing_deg: f64,
    pub arrived: bool,
}

impl StakeoutReading {
    pub fn between(position: LatLng, target: LatLng, config: &StakeoutConfig) -> Self {
        let distance_m = geodesic::distance(position, target);
        Self {
            distance_m,
            bearing_deg: geodesic::bearing(position, target),
            arrived: distance_m < config.arrival_radius_m,
        }
    }

    pub fn display_distance(&self) -> String {
        if self.distance_m < 1000.0 {
            format!("{:.2} m", self.distance_m)
        } else {
            format!("{:.2} km", self.distance_m / 1000.0)
        }
    }

    pub fn display_bearing(&self) -> String {
        format!("{:.1}°", self.bearing_deg)
    }
}

/// 测点集合
#[derive(Debug, Clone, Default)]
pub struct PointStore {
    points: Vec<RecordedPoint>,
    stakeout: Option<StakeoutSession>,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<RecordedPoint>) -> Self {
        Self {
            points,
            stakeout: None,
        }
    }

    /// 采集新测点，名称为 `P-{现有数量 + 1}`
    pub fn capture(&mut self, position: LatLng) -> &RecordedPoint {
        let name = format!("P-{}", self.points.len() + 1);
        let point = RecordedPoint::new(uuid::Uuid::new_v4().to_string(), name, position);
        self.points.push(point);
        &self.points[self.points.len() - 1]
    }

    pub fn points(&self) -> &[RecordedPoint] {
        &self.points
    }

    pub fn get(&self, id: &str) -> Option<&RecordedPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> CoreResult<()> {
        let point = self
            .points
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::PointNotFound(id.to_string()))?;
        point.name = name.into();
        Ok(())
    }

    /// 删除测点；若它是放样目标，同时结束放样
    pub fn remove(&mut self, id: &str) -> CoreResult<RecordedPoint> {
        let index = self
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::PointNotFound(id.to_string()))?;
        if self.stakeout.as_ref().is_some_and(|s| s.target_point_id == id) {
            self.stakeout = None;
        }
        Ok(self.points.remove(index))
    }

    /// 清空所有测点并结束放样
    pub fn clear(&mut self) {
        self.points.clear();
        self.stakeout = None;
    }

    pub fn start_stakeout(&mut self, id: &str) -> CoreResult<&mut StakeoutSession> {
        if self.get(id).is_none() {
            return Err(CoreError::PointNotFound(id.to_string()));
        }
        let last = self.stakeout.take().and_then(|s| s.last_known_position);
        let session = self.stakeout.insert(StakeoutSession::new(id));
        session.last_known_position = last;
        Ok(session)
    }

    pub fn stop_stakeout(&mut self) {
        self.stakeout = None;
    }

    pub fn stakeout(&self) -> Option<&StakeoutSession> {
        self.stakeout.as_ref()
    }

    /// 位置更新（无放样时忽略）
    pub fn update_position(&mut self, position: LatLng) {
        if let Some(session) = self.stakeout.as_mut() {
            session.update_position(position);
        }
    }

    /// 当前放样读数；无目标或尚无位置时为 None
    pub fn stakeout_reading(&self, config: &StakeoutConfig) -> Option<StakeoutReading> {
        let session = self.stakeout.as_ref()?;
        let position = session.last_known_position?;
        let target = self.get(&session.target_point_id)?;
        Some(StakeoutReading::between(position, target.position(), config))
    }
}

/// 量测路径
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPath {
    points: Vec<LatLng>,
}

impl MeasurementPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: LatLng) {
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn segment_lengths(&self) -> Vec<f64> {
        geodesic::segment_lengths(&self.points)
    }

    pub fn total_length(&self) -> f64 {
        geodesic::path_length(&self.points)
    }

    pub fn display_total(&self) -> String {
        let total = self.total_length();
        if total < 1000.0 {
            format!("{:.2} m", total)
        } else {
            format!("{:.3} km", total / 1000.0)
        }
    }
}

/// 按坐标系格式化显示坐标：WGS84 显示 `lat, lng`（6 位），平面坐标显示 `x, y`（3 位）
pub fn display_coordinates(x: f64, y: f64, geographic: bool) -> String {
    if geographic {
        format!("{:.6}, {:.6}", y, x)
    } else {
        format!("{:.3}, {:.3}", x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_names_and_ids() {
        let mut store = PointStore::new();
        let first_id = store.capture(LatLng::new(41.0, 29.0)).id.clone();
        store.capture(LatLng::new(41.001, 29.001));

        let names: Vec<_> = store.points().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["P-1", "P-2"]);
        assert_ne!(store.points()[0].id, store.points()[1].id);

        store.remove(&first_id).unwrap();
        // 名称按当前数量生成
        assert_eq!(store.capture(LatLng::new(0.0, 0.0)).name, "P-2");
    }

    #[test]
    fn test_remove_target_ends_stakeout() {
        let mut store = PointStore::new();
        let id = store.capture(LatLng::new(41.0, 29.0)).id.clone();
        let other = store.capture(LatLng::new(41.1, 29.1)).id.clone();

        store.start_stakeout(&id).unwrap();
        store.remove(&other).unwrap();
        assert!(store.stakeout().is_some());

        store.remove(&id).unwrap();
        assert!(store.stakeout().is_none());
    }

    #[test]
    fn test_clear_ends_stakeout() {
        let mut store = PointStore::new();
        let id = store.capture(LatLng::new(41.0, 29.0)).id.clone();
        store.start_stakeout(&id).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert!(store.stakeout().is_none());
    }

    #[test]
    fn test_stakeout_reading() {
        let config = StakeoutConfig::default();
        let mut store = PointStore::new();
        let id = store.capture(LatLng::new(0.0, 0.001)).id.clone();

        assert!(store.start_stakeout("missing").is_err());
        store.start_stakeout(&id).unwrap();
        assert!(store.stakeout_reading(&config).is_none());

        store.update_position(LatLng::new(0.0, 0.0));
        let reading = store.stakeout_reading(&config).unwrap();
        assert!((reading.bearing_deg - 90.0).abs() < 1e-9);
        assert!((reading.distance_m - 111.19).abs() < 0.01);
        assert!(!reading.arrived);
        assert_eq!(reading.display_distance(), "111.19 m");
        assert_eq!(reading.display_bearing(), "90.0°");

        store.update_position(LatLng::new(0.0, 0.000_995));
        assert!(store.stakeout_reading(&config).unwrap().arrived);
    }

    #[test]
    fn test_rename_missing_point() {
        let mut store = PointStore::new();
        assert_eq!(
            store.rename("x", "BM-1"),
            Err(CoreError::PointNotFound("x".to_string()))
        );
    }

    #[test]
    fn test_measurement_path() {
        let mut path = MeasurementPath::new();
        assert_eq!(path.total_length(), 0.0);
        assert_eq!(path.display_total(), "0.00 m");
        path.push(LatLng::new(0.0, 0.0));
        assert_eq!(path.display_total(), "0.00 m");
        path.clear();

        path.push(LatLng::new(0.0, 0.0));
        path.push(LatLng::new(0.0, 0.01));
        path.push(LatLng::new(0.0, 0.02));
        assert_eq!(path.segment_lengths().len(), 2);
        assert!((path.total_length() - 2223.9).abs() < 0.1);
        assert_eq!(path.display_total(), "2.224 km");

        path.clear();
        assert!(path.points().is_empty());
    }

    #[test]
    fn test_display_coordinates() {
        assert_eq!(display_coordinates(28.9784, 41.0082, true), "41.008200, 28.978400");
        assert_eq!(display_coordinates(500000.12345, 4540000.5, false), "500000.123, 4540000.500");
    }
}
