//! 测点捕捉
//!
//! 采点模式下，点击位置若在屏幕上距某个已有测点足够近，就吸附到该测点。
//! 地图到屏幕的投影由调用方提供，这里只比较像素距离。
//!
//! 规则：
//! - 像素距离严格小于阈值才吸附
//! - 多个候选距离相同时取第一个
//! - 未启用捕捉时点击坐标原样返回

use crate::math::{LatLng, Point2};
use crate::survey::RecordedPoint;
use serde::{Deserialize, Serialize};

/// 捕捉配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// 是否启用捕捉
    pub enabled: bool,
    /// 捕捉容差（屏幕像素）
    pub threshold_px: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_px: 15.0, // 15像素
        }
    }
}

/// 捕捉结果
#[derive(Debug, Clone, Copy)]
pub struct SnapHit<'a, T> {
    pub candidate: &'a T,
    /// 屏幕像素距离
    pub distance: f64,
}

/// 在候选集中找屏幕距离最近且小于阈值的一个
///
/// `project` 把地理坐标映射为屏幕像素坐标。
pub fn nearest<'a, T, P, F>(
    click: LatLng,
    candidates: &'a [T],
    threshold_px: f64,
    position: P,
    project: F,
) -> Option<SnapHit<'a, T>>
where
    P: Fn(&T) -> LatLng,
    F: Fn(LatLng) -> Point2,
{
    let click_px = project(click);
    let mut best: Option<SnapHit<'a, T>> = None;

    for candidate in candidates {
        let distance = (project(position(candidate)) - click_px).norm();
        // 严格小于才替换，保证相同距离时先出现的胜出
        if best.as_ref().map_or(true, |b| distance < b.distance) {
            best = Some(SnapHit { candidate, distance });
        }
    }

    best.filter(|hit| hit.distance < threshold_px)
}

/// 瓦片地图像素坐标（Web Mercator，256 像素瓦片）
///
/// 交互端按当前缩放级别把地理坐标映射到屏幕像素时使用。
pub fn web_mercator_pixels(ll: LatLng, zoom: f64) -> Point2 {
    let world = 256.0 * 2f64.powf(zoom);
    let lat = ll.lat.to_radians();
    let x = (ll.lng + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0;
    Point2::new(x * world, y * world)
}

/// 测点捕捉器
#[derive(Debug, Clone, Default)]
pub struct PointSnapper {
    config: SnapConfig,
}

impl PointSnapper {
    pub fn new(config: SnapConfig) -> Self {
        Self { config }
    }

    /// 获取配置
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// 获取配置（可变）
    pub fn config_mut(&mut self) -> &mut SnapConfig {
        &mut self.config
    }

    /// 最近的已有测点
    pub fn find<'a, F>(&self, click: LatLng, points: &'a [RecordedPoint], project: F) -> Option<&'a RecordedPoint>
    where
        F: Fn(LatLng) -> Point2,
    {
        nearest(click, points, self.config.threshold_px, RecordedPoint::position, project)
            .map(|hit| hit.candidate)
    }

    /// 处理一次采点点击：启用时吸附到最近测点，否则原样返回
    pub fn resolve_click<F>(&self, click: LatLng, points: &[RecordedPoint], project: F) -> LatLng
    where
        F: Fn(LatLng) -> Point2,
    {
        if !self.config.enabled {
            return click;
        }
        self.find(click, points, project)
            .map(RecordedPoint::position)
            .unwrap_or(click)
    }
}
