//! CAD 几何图元
//!
//! 解码后的图纸实体只保留四种图元：
//! - 点 (Point)
//! - 线段 (Line)
//! - 多段线 (Polyline)
//! - 圆弧 (Arc)，整圆用 0–2π 的圆弧表示
//!
//! 坐标均为图纸单位，尚未经过地理配准。

use crate::color::ColorIndex;
use crate::math::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// 圆弧离散的分段数（得到 33 个顶点）
pub const ARC_SEGMENTS: usize = 32;

/// 几何类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CadGeometry {
    Point(Point),
    Line(Line),
    Polyline(Polyline),
    Arc(Arc),
}

impl CadGeometry {
    /// 获取几何的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            CadGeometry::Point(_) => "Point",
            CadGeometry::Line(_) => "Line",
            CadGeometry::Polyline(_) => "Polyline",
            CadGeometry::Arc(_) => "Arc",
        }
    }
}

/// 图纸实体：几何 + 图层/颜色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadEntity {
    pub geometry: CadGeometry,
    pub layer: String,
    pub color: ColorIndex,
    /// 源文件中的句柄（如果有）
    pub handle: Option<String>,
}

impl CadEntity {
    pub fn new(geometry: CadGeometry, layer: impl Into<String>) -> Self {
        Self {
            geometry,
            layer: layer.into(),
            color: ColorIndex::Unset,
            handle: None,
        }
    }

    pub fn with_color(mut self, color: ColorIndex) -> Self {
        self.color = color;
        self
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }
}

/// 点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub position: Point2,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
        }
    }
}

/// 线段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// 计算线段长度
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// 多段线（只保留顶点，凸度不参与地理配准）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Point2>,
    pub closed: bool,
}

impl Polyline {
    pub fn new(vertices: Vec<Point2>, closed: bool) -> Self {
        Self { vertices, closed }
    }

    /// 顶点少于 2 个的多段线无法成线
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 2
    }

    pub fn length(&self) -> f64 {
        self.vertices.windows(2).map(|w| (w[1] - w[0]).norm()).fold(0.0, |acc, d| acc + d)
    }
}

/// 圆弧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    /// 起始角度（弧度）
    pub start_angle: f64,
    /// 终止角度（弧度）
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// 整圆
    pub fn full_circle(center: Point2, radius: f64) -> Self {
        Self::new(center, radius, 0.0, TAU)
    }

    /// 逆时针扫过的角度，范围 (0, 2π]
    ///
    /// 终止角小于起始角时跨越 0°；两者相等视为整圆。
    pub fn sweep_angle(&self) -> f64 {
        let sweep = self.end_angle - self.start_angle;
        if sweep <= 0.0 {
            sweep + TAU
        } else {
            sweep
        }
    }

    /// 获取圆弧上指定角度的点
    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    /// 按角度等分离散为 `ARC_SEGMENTS + 1` 个顶点
    pub fn tessellate(&self) -> Vec<Point2> {
        let sweep = self.sweep_angle();
        (0..=ARC_SEGMENTS)
            .map(|i| self.point_at_angle(self.start_angle + sweep * i as f64 / ARC_SEGMENTS as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_line_length() {
        let line = Line::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!((line.length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_circle_tessellation() {
        let circle = Arc::full_circle(Point2::new(10.0, 5.0), 2.0);
        let points = circle.tessellate();

        assert_eq!(points.len(), 33);
        let first = points[0];
        let last = points[32];
        assert!((first - last).norm() < 1e-9);
        assert!((first - Point2::new(12.0, 5.0)).norm() < 1e-12);
        for p in &points {
            assert!(((p - circle.center).norm() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_arc_wraps_through_zero() {
        // 270° -> 90°，逆时针经过 0°
        let arc = Arc::new(Point2::origin(), 1.0, 3.0 * FRAC_PI_2, FRAC_PI_2);
        assert!((arc.sweep_angle() - PI).abs() < 1e-12);

        let points = arc.tessellate();
        assert!((points[16] - Point2::new(1.0, 0.0)).norm() < 1e-9);
        assert!((points[32] - Point2::new(0.0, 1.0)).norm() < 1e-9);
    }

    #[test]
    fn test_equal_angles_is_full_circle() {
        let arc = Arc::new(Point2::origin(), 1.0, 0.0, 0.0);
        assert!((arc.sweep_angle() - TAU).abs() < 1e-12);
    }

    #[test]
    fn test_polyline_degenerate() {
        assert!(Polyline::new(vec![Point2::origin()], false).is_degenerate());
        let pl = Polyline::new(vec![Point2::origin(), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)], false);
        assert!(!pl.is_degenerate());
        assert!((pl.length() - 2.0).abs() < 1e-12);
    }
}
