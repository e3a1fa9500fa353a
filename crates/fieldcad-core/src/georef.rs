//! 仿射地理配准变换
//!
//! 图纸坐标 -> 地理坐标的流水线：
//!
//! ```text
//! (x, y) --偏移--> --均匀缩放--> --逆时针旋转--> 平面坐标 --反投影--> (lat, lng)
//! ```
//!
//! `local` 坐标系使用固定的平地近似（经度 1/111320 度/米，纬度 1/110540 度/米），
//! 不随纬度修正。反向变换严格按相反顺序执行，供导出使用。

use crate::crs::{CrsDefinition, CrsRegistry, Projector};
use crate::error::{CoreError, CoreResult};
use crate::math::{LatLng, Point2, Vector2};
use nalgebra::Rotation2;
use serde::{Deserialize, Serialize};

/// 每米对应的经度（度）的倒数
pub const LOCAL_METERS_PER_DEGREE_LNG: f64 = 111_320.0;
/// 每米对应的纬度（度）的倒数
pub const LOCAL_METERS_PER_DEGREE_LAT: f64 = 110_540.0;

/// 图层的地理配准参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AffineGeoConfig {
    pub crs_id: String,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    pub rotation_degrees: f64,
}

impl Default for AffineGeoConfig {
    fn default() -> Self {
        Self {
            crs_id: crate::crs::LOCAL_ID.to_string(),
            origin_lat: 41.0082,
            origin_lng: 28.9784,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            rotation_degrees: 0.0,
        }
    }
}

impl AffineGeoConfig {
    /// 指定坐标系下的恒等配置（无偏移、缩放为 1、不旋转、原点 0,0）
    pub fn identity(crs_id: impl Into<String>) -> Self {
        Self {
            crs_id: crs_id.into(),
            origin_lat: 0.0,
            origin_lng: 0.0,
            ..Self::default()
        }
    }

    /// 校验配置：缩放必须为正，坐标系必须存在
    pub fn validate(&self, registry: &CrsRegistry) -> CoreResult<()> {
        if !(self.scale > 0.0) || !self.scale.is_finite() {
            return Err(CoreError::InvalidScale(self.scale));
        }
        registry.lookup(&self.crs_id)?;
        Ok(())
    }

    fn apply_affine(&self, x: f64, y: f64) -> Point2 {
        let scaled = Vector2::new(x + self.offset_x, y + self.offset_y) * self.scale;
        if self.rotation_degrees == 0.0 {
            return Point2::from(scaled);
        }
        Point2::from(Rotation2::new(self.rotation_degrees.to_radians()) * scaled)
    }

    fn invert_affine(&self, planar: Point2) -> Point2 {
        let mut v = planar.coords;
        if self.rotation_degrees != 0.0 {
            v = Rotation2::new(-self.rotation_degrees.to_radians()) * v;
        }
        let v = v / self.scale;
        Point2::new(v.x - self.offset_x, v.y - self.offset_y)
    }
}

/// 反投影结果
///
/// 投影数值失败不作为错误抛出：携带未投影的平面坐标，
/// 由调用方决定如何显示。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoOutcome {
    Exact(LatLng),
    /// 反投影失败，`planar` 为旋转/缩放/偏移后的平面坐标
    Degenerate { planar: Point2 },
}

impl GeoOutcome {
    pub fn is_degenerate(&self) -> bool {
        matches!(self, GeoOutcome::Degenerate { .. })
    }

    /// 取坐标；退化时把平面坐标原样当作 (lng=x, lat=y)
    pub fn lat_lng(self) -> LatLng {
        match self {
            GeoOutcome::Exact(ll) => ll,
            GeoOutcome::Degenerate { planar } => LatLng::new(planar.y, planar.x),
        }
    }
}

/// 平面侧的处理方式
#[derive(Debug)]
enum PlaneMapping {
    /// 平地近似
    Local,
    /// 经纬度恒等
    Geographic,
    Projected(Projector),
}

/// 已校验、已解析投影的变换，批量转换时复用
#[derive(Debug)]
pub struct GeoTransform {
    config: AffineGeoConfig,
    mapping: PlaneMapping,
}

impl GeoTransform {
    pub fn new(registry: &CrsRegistry, config: &AffineGeoConfig) -> CoreResult<Self> {
        config.validate(registry)?;
        let def = registry.lookup(&config.crs_id)?;
        Self::with_crs(def, config)
    }

    /// 使用给定坐标系定义（可以是注册表之外现场构造的分带）
    pub fn with_crs(def: &CrsDefinition, config: &AffineGeoConfig) -> CoreResult<Self> {
        if !(config.scale > 0.0) || !config.scale.is_finite() {
            return Err(CoreError::InvalidScale(config.scale));
        }
        let mapping = if def.is_local() {
            PlaneMapping::Local
        } else if def.is_geographic() {
            PlaneMapping::Geographic
        } else {
            PlaneMapping::Projected(Projector::new(def)?)
        };

        let mut config = config.clone();
        config.crs_id = def.id.clone();
        Ok(Self { config, mapping })
    }

    pub fn config(&self) -> &AffineGeoConfig {
        &self.config
    }

    pub fn crs_id(&self) -> &str {
        &self.config.crs_id
    }

    /// 图纸坐标 -> 地理坐标
    pub fn to_geographic(&self, x: f64, y: f64) -> GeoOutcome {
        let planar = self.config.apply_affine(x, y);
        match &self.mapping {
            PlaneMapping::Local => GeoOutcome::Exact(LatLng::new(
                self.config.origin_lat + planar.y / LOCAL_METERS_PER_DEGREE_LAT,
                self.config.origin_lng + planar.x / LOCAL_METERS_PER_DEGREE_LNG,
            )),
            PlaneMapping::Geographic => GeoOutcome::Exact(LatLng::new(planar.y, planar.x)),
            PlaneMapping::Projected(projector) => match projector.inverse(planar) {
                Ok(ll) => GeoOutcome::Exact(ll),
                Err(message) => {
                    tracing::warn!(
                        crs = projector.crs_id(),
                        x = planar.x,
                        y = planar.y,
                        "Inverse projection failed, using unprojected coordinates: {}",
                        message
                    );
                    GeoOutcome::Degenerate { planar }
                }
            },
        }
    }

    /// 地理坐标 -> 图纸坐标
    ///
    /// 正投影失败时同样回退为未投影坐标（x=lng, y=lat），并记录日志。
    pub fn from_geographic(&self, geo: LatLng) -> Point2 {
        let planar = match &self.mapping {
            PlaneMapping::Local => Point2::new(
                (geo.lng - self.config.origin_lng) * LOCAL_METERS_PER_DEGREE_LNG,
                (geo.lat - self.config.origin_lat) * LOCAL_METERS_PER_DEGREE_LAT,
            ),
            PlaneMapping::Geographic => Point2::new(geo.lng, geo.lat),
            PlaneMapping::Projected(projector) => match projector.forward(geo) {
                Ok(p) => p,
                Err(message) => {
                    tracing::warn!(
                        crs = projector.crs_id(),
                        lat = geo.lat,
                        lng = geo.lng,
                        "Forward projection failed, using unprojected coordinates: {}",
                        message
                    );
                    Point2::new(geo.lng, geo.lat)
                }
            },
        };
        self.config.invert_affine(planar)
    }
}

/// 单点便捷接口：图纸坐标 -> 地理坐标
pub fn to_geographic(
    registry: &CrsRegistry,
    x: f64,
    y: f64,
    config: &AffineGeoConfig,
) -> CoreResult<GeoOutcome> {
    Ok(GeoTransform::new(registry, config)?.to_geographic(x, y))
}

/// 单点便捷接口：地理坐标 -> 图纸坐标
pub fn from_geographic(
    registry: &CrsRegistry,
    geo: LatLng,
    config: &AffineGeoConfig,
) -> CoreResult<Point2> {
    Ok(GeoTransform::new(registry, config)?.from_geographic(geo))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CrsRegistry {
        CrsRegistry::builtin()
    }

    #[test]
    fn test_local_identity() {
        let config = AffineGeoConfig::identity("local");
        let t = GeoTransform::new(&registry(), &config).unwrap();

        let ll = t.to_geographic(111_320.0, 110_540.0).lat_lng();
        assert!((ll.lng - 1.0).abs() < 1e-12);
        assert!((ll.lat - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_affine_order() {
        // 偏移 -> 缩放 -> 旋转 90°
        let config = AffineGeoConfig {
            offset_x: 1.0,
            offset_y: 0.0,
            scale: 2.0,
            rotation_degrees: 90.0,
            ..AffineGeoConfig::identity("local")
        };
        let planar = config.apply_affine(1.0, 0.0);
        assert!(planar.x.abs() < 1e-9);
        assert!((planar.y - 4.0).abs() < 1e-9);

        let back = config.invert_affine(planar);
        assert!((back.x - 1.0).abs() < 1e-9);
        assert!(back.y.abs() < 1e-9);
    }

    #[test]
    fn test_geographic_identity() {
        let config = AffineGeoConfig::identity("WGS84");
        let t = GeoTransform::new(&registry(), &config).unwrap();

        let ll = t.to_geographic(28.9784, 41.0082).lat_lng();
        assert_eq!(ll, LatLng::new(41.0082, 28.9784));

        let back = t.from_geographic(ll);
        assert_eq!(back, Point2::new(28.9784, 41.0082));
    }

    #[test]
    fn test_invalid_scale_rejected() {
        for scale in [0.0, -1.0, f64::NAN] {
            let config = AffineGeoConfig {
                scale,
                ..AffineGeoConfig::default()
            };
            assert!(matches!(
                GeoTransform::new(&registry(), &config),
                Err(CoreError::InvalidScale(_))
            ));
        }
    }

    #[test]
    fn test_unknown_crs_rejected() {
        let config = AffineGeoConfig::identity("EPSG:0000");
        assert_eq!(
            config.validate(&registry()),
            Err(CoreError::UnknownCrs("EPSG:0000".to_string()))
        );
    }

    #[test]
    fn test_round_trip_all_crs() {
        let registry = registry();
        let samples = [LatLng::new(39.92, 32.85), LatLng::new(41.0082, 28.9784), LatLng::new(37.0, 27.4)];

        for def in registry.iter() {
            let config = AffineGeoConfig {
                crs_id: def.id.clone(),
                origin_lat: 40.0,
                origin_lng: 30.0,
                offset_x: 125.5,
                offset_y: -310.25,
                scale: 0.75,
                rotation_degrees: 17.5,
            };
            let t = GeoTransform::new(&registry, &config).unwrap();

            for g in samples {
                let planar = t.from_geographic(g);
                let outcome = t.to_geographic(planar.x, planar.y);
                assert!(!outcome.is_degenerate(), "{} degenerate", def.id);
                let back = outcome.lat_lng();
                assert!((back.lat - g.lat).abs() < 1e-6, "{} lat {} != {}", def.id, back.lat, g.lat);
                assert!((back.lng - g.lng).abs() < 1e-6, "{} lng {} != {}", def.id, back.lng, g.lng);
            }
        }
    }

    #[test]
    fn test_local_round_trip_identity_config() {
        let registry = registry();
        let config = AffineGeoConfig::identity("local");
        let g = LatLng::new(0.25, 0.5);
        let planar = from_geographic(&registry, g, &config).unwrap();
        let back = to_geographic(&registry, planar.x, planar.y, &config).unwrap().lat_lng();
        assert_eq!(back, g);
    }

    #[test]
    fn test_degenerate_fallback() {
        let config = AffineGeoConfig::identity("ITRF96_TM30");
        let t = GeoTransform::new(&registry(), &config).unwrap();

        let outcome = t.to_geographic(f64::NAN, 4_000_000.0);
        assert!(outcome.is_degenerate());
        match outcome {
            GeoOutcome::Degenerate { planar } => assert_eq!(planar.y, 4_000_000.0),
            GeoOutcome::Exact(_) => unreachable!(),
        }
        assert_eq!(outcome.lat_lng().lat, 4_000_000.0);
    }
}
