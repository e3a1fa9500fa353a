//! 球面大圆距离与方位角
//!
//! 使用半径 6 371 000 m 的球体和 haversine 公式，适用于工地到宗地尺度的放样与量测。
//! 输入为 NaN 时结果也是 NaN，不做额外检查。

use crate::math::LatLng;

/// 地球平均半径（米）
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// 两点间大圆距离（米）
pub fn distance(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// 从 `a` 指向 `b` 的初始方位角（度），范围 [0, 360)
pub fn bearing(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    let degrees = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid 对极小负数可能返回 360.0
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

/// 路径各段长度
pub fn segment_lengths(path: &[LatLng]) -> Vec<f64> {
    path.windows(2).map(|w| distance(w[0], w[1])).collect()
}

/// 边长标注忽略的最短边（米）
pub const MIN_EDGE_LABEL_M: f64 = 0.2;

/// 一条边的长度与标注位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLength {
    /// 边的中点（经纬度直接取平均）
    pub midpoint: LatLng,
    pub length_m: f64,
}

impl EdgeLength {
    /// 标注文字，如 `12.34 m`
    pub fn label(&self) -> String {
        format!("{:.2} m", self.length_m)
    }
}

/// 环上各边的长度，短于 [`MIN_EDGE_LABEL_M`] 的边不标注
pub fn edge_lengths(ring: &[LatLng]) -> Vec<EdgeLength> {
    ring.windows(2)
        .zip(segment_lengths(ring))
        .filter(|(_, length)| *length >= MIN_EDGE_LABEL_M)
        .map(|(w, length_m)| EdgeLength {
            midpoint: LatLng::new((w[0].lat + w[1].lat) / 2.0, (w[0].lng + w[1].lng) / 2.0),
            length_m,
        })
        .collect()
}

/// 路径总长度，少于两点时为 +0.0
pub fn path_length(path: &[LatLng]) -> f64 {
    // 空迭代器的 f64 sum 为 -0.0
    path.windows(2).map(|w| distance(w[0], w[1])).fold(0.0, |acc, d| acc + d)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISTANBUL: LatLng = LatLng { lat: 41.0082, lng: 28.9784 };
    const ANKARA: LatLng = LatLng { lat: 39.9334, lng: 32.8597 };

    #[test]
    fn test_distance_zero_and_symmetric() {
        assert_eq!(distance(ISTANBUL, ISTANBUL), 0.0);
        assert_eq!(distance(ISTANBUL, ANKARA), distance(ANKARA, ISTANBUL));
    }

    #[test]
    fn test_distance_known_value() {
        // 赤道上 1° 经度
        let d = distance(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        let expected = EARTH_RADIUS_M * 1f64.to_radians();
        assert!((d - expected).abs() < 1e-6);

        let d = distance(ISTANBUL, ANKARA);
        assert!((d - 350_000.0).abs() < 10_000.0, "distance {}", d);
    }

    #[test]
    fn test_bearing_cardinal() {
        let origin = LatLng::new(0.0, 0.0);
        assert!((bearing(origin, LatLng::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(origin, LatLng::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(origin, LatLng::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(origin, LatLng::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range_and_reverse() {
        let pairs = [
            (ISTANBUL, ANKARA),
            (LatLng::new(41.0, 29.0), LatLng::new(41.0001, 29.0001)),
            (LatLng::new(-33.9, 18.4), LatLng::new(-33.8, 18.5)),
            (LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.001)),
        ];
        for (a, b) in pairs {
            let forward = bearing(a, b);
            let reverse = bearing(b, a);
            assert!((0.0..360.0).contains(&forward));
            assert!((0.0..360.0).contains(&reverse));

            // 正反方位角相差 180°，偏差不超过子午线收敛角（≤ 经差）
            let diff = (forward - reverse).rem_euclid(360.0);
            let tolerance = (b.lng - a.lng).abs() + 1e-9;
            assert!((diff - 180.0).abs() < tolerance, "{:?} -> {:?}: {}", a, b, diff);
        }
    }

    #[test]
    fn test_edge_lengths() {
        // 约 111 m 的边、约 0.1 m 的短边、闭合边
        let ring = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 0.001),
            LatLng::new(0.000_001, 0.001),
            LatLng::new(0.0, 0.0),
        ];
        let edges = edge_lengths(&ring);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].midpoint, LatLng::new(0.0, 0.0005));
        assert_eq!(edges[0].label(), "111.19 m");
        assert!((edges[1].length_m - distance(ring[2], ring[3])).abs() < 1e-12);

        assert!(edge_lengths(&ring[..1]).is_empty());
    }

    #[test]
    fn test_path_length() {
        let path = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0), LatLng::new(0.0, 2.0)];
        let lengths = segment_lengths(&path);
        assert_eq!(lengths.len(), 2);
        assert!((path_length(&path) - lengths.iter().sum::<f64>()).abs() < 1e-9);
        assert_eq!(path_length(&path[..1]), 0.0);
        assert!(path_length(&path[..1]).is_sign_positive());
        assert!(path_length(&[]).is_sign_positive());
    }
}
