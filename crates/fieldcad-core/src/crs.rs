//! 坐标参考系（CRS）注册表
//!
//! 注册表在启动时构建一次，之后只读，可通过 `Arc<CrsRegistry>` 在各组件间共享。
//! 新增坐标系只需修改 [`BUILTIN_CRS`] 目录。
//!
//! 三类坐标系：
//! - 地理坐标系 `WGS84`：经纬度（度），与 [`LatLng`] 恒等
//! - 本地伪坐标系 `local`：以原点为锚的平面近似，见 [`crate::georef`]
//! - 投影坐标系：横轴墨卡托等，通过 proj4rs 做正/反投影

use crate::error::{CoreError, CoreResult};
use crate::math::{LatLng, Point2};
use proj4rs::proj::Proj;
use serde::{Deserialize, Serialize};

/// WGS84 地理坐标系 ID
pub const WGS84_ID: &str = "WGS84";
/// 本地近似坐标系 ID
pub const LOCAL_ID: &str = "local";

const WGS84_PARAMS: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// 坐标系类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsKind {
    Geographic,
    Projected,
}

/// 坐标系定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsDefinition {
    pub id: String,
    pub display_name: String,
    pub kind: CrsKind,
    /// PROJ 风格参数串，`local` 为空
    pub projection_parameters: String,
}

impl CrsDefinition {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        kind: CrsKind,
        projection_parameters: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind,
            projection_parameters: projection_parameters.into(),
        }
    }

    /// ITRF96 基准（GRS80 椭球）上的 3° 带横轴墨卡托
    pub fn itrf96_tm(central_meridian: f64) -> Self {
        Self::new(
            format!("ITRF96_TM{}", central_meridian),
            format!("ITRF96 / TM{}", central_meridian),
            CrsKind::Projected,
            format!(
                "+proj=tmerc +lat_0=0 +lon_0={} +k=1 +x_0=500000 +y_0=0 +ellps=GRS80 +units=m +no_defs",
                central_meridian
            ),
        )
    }

    pub fn is_local(&self) -> bool {
        self.id == LOCAL_ID
    }

    pub fn is_geographic(&self) -> bool {
        self.kind == CrsKind::Geographic
    }

    /// 从参数串中读取中央子午线（`+lon_0`）
    pub fn central_meridian(&self) -> Option<f64> {
        self.projection_parameters
            .split_whitespace()
            .find_map(|token| token.strip_prefix("+lon_0="))
            .and_then(|value| value.parse().ok())
    }

    /// 导出坐标的小数位数：地理坐标 6 位，平面坐标 3 位
    pub fn coordinate_precision(&self) -> usize {
        if self.is_geographic() {
            6
        } else {
            3
        }
    }
}

/// 内置坐标系目录：(id, 显示名, 类型, 参数)
const BUILTIN_CRS: &[(&str, &str, CrsKind, &str)] = &[
    (WGS84_ID, "WGS84 (Lat/Lng)", CrsKind::Geographic, WGS84_PARAMS),
    (LOCAL_ID, "Local (Manual Placing)", CrsKind::Projected, ""),
    (
        "ITRF96_TM27",
        "ITRF96 / TM27 (West)",
        CrsKind::Projected,
        "+proj=tmerc +lat_0=0 +lon_0=27 +k=1 +x_0=500000 +y_0=0 +ellps=GRS80 +units=m +no_defs",
    ),
    (
        "ITRF96_TM30",
        "ITRF96 / TM30 (Center)",
        CrsKind::Projected,
        "+proj=tmerc +lat_0=0 +lon_0=30 +k=1 +x_0=500000 +y_0=0 +ellps=GRS80 +units=m +no_defs",
    ),
    (
        "ITRF96_TM33",
        "ITRF96 / TM33 (East)",
        CrsKind::Projected,
        "+proj=tmerc +lat_0=0 +lon_0=33 +k=1 +x_0=500000 +y_0=0 +ellps=GRS80 +units=m +no_defs",
    ),
    (
        "ED50_TM30",
        "ED50 / TM30",
        CrsKind::Projected,
        "+proj=tmerc +lat_0=0 +lon_0=30 +k=1 +x_0=500000 +y_0=0 +ellps=intl +towgs84=-84,-107,-120,0,0,0,0 +units=m +no_defs",
    ),
    (
        "ED50_TM33",
        "ED50 / TM33",
        CrsKind::Projected,
        "+proj=tmerc +lat_0=0 +lon_0=33 +k=1 +x_0=500000 +y_0=0 +ellps=intl +towgs84=-84,-107,-120,0,0,0,0 +units=m +no_defs",
    ),
    (
        "WEB_MERCATOR",
        "Web Mercator",
        CrsKind::Projected,
        "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0 +k=1.0 +units=m +no_defs",
    ),
];

/// 坐标系注册表（只读）
#[derive(Debug, Clone)]
pub struct CrsRegistry {
    entries: Vec<CrsDefinition>,
}

impl CrsRegistry {
    /// 内置目录
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_CRS
                .iter()
                .map(|(id, name, kind, params)| CrsDefinition::new(*id, *name, *kind, *params))
                .collect(),
        }
    }

    /// 内置目录加上额外定义（同 ID 覆盖内置项）
    pub fn with_definitions(extra: impl IntoIterator<Item = CrsDefinition>) -> Self {
        let mut registry = Self::builtin();
        for def in extra {
            match registry.entries.iter_mut().find(|e| e.id == def.id) {
                Some(existing) => *existing = def,
                None => registry.entries.push(def),
            }
        }
        registry
    }

    pub fn lookup(&self, id: &str) -> CoreResult<&CrsDefinition> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| CoreError::UnknownCrs(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CrsDefinition> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 中央子午线为 `central_meridian` 的 GRS80 横轴墨卡托
    ///
    /// 注册表中已有则返回该项，否则现场构造。
    pub fn transverse_mercator(&self, central_meridian: f64) -> CrsDefinition {
        self.entries
            .iter()
            .filter(|e| e.id.starts_with("ITRF96_TM"))
            .find(|e| e.central_meridian() == Some(central_meridian))
            .cloned()
            .unwrap_or_else(|| CrsDefinition::itrf96_tm(central_meridian))
    }
}

impl Default for CrsRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// 投影坐标系与 WGS84 之间的正/反投影
///
/// 只对投影坐标系（非 `local`）构造。
pub struct Projector {
    crs_id: String,
    projected: Proj,
    geographic: Proj,
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector").field("crs_id", &self.crs_id).finish()
    }
}

impl Projector {
    pub fn new(def: &CrsDefinition) -> CoreResult<Self> {
        let setup_error = |e: proj4rs::errors::Error| CoreError::Projection {
            crs: def.id.clone(),
            message: e.to_string(),
        };
        let projected = Proj::from_proj_string(&def.projection_parameters).map_err(setup_error)?;
        let geographic = Proj::from_proj_string(WGS84_PARAMS).map_err(setup_error)?;

        Ok(Self {
            crs_id: def.id.clone(),
            projected,
            geographic,
        })
    }

    pub fn crs_id(&self) -> &str {
        &self.crs_id
    }

    /// 反投影：平面坐标 -> WGS84
    pub fn inverse(&self, planar: Point2) -> Result<LatLng, String> {
        let mut p = (planar.x, planar.y, 0.0);
        proj4rs::transform::transform(&self.projected, &self.geographic, &mut p)
            .map_err(|e| e.to_string())?;

        let result = LatLng::new(p.1.to_degrees(), p.0.to_degrees());
        if result.lat.is_finite() && result.lng.is_finite() {
            Ok(result)
        } else {
            Err(format!("non-finite result for ({}, {})", planar.x, planar.y))
        }
    }

    /// 正投影：WGS84 -> 平面坐标
    pub fn forward(&self, geo: LatLng) -> Result<Point2, String> {
        let mut p = (geo.lng.to_radians(), geo.lat.to_radians(), 0.0);
        proj4rs::transform::transform(&self.geographic, &self.projected, &mut p)
            .map_err(|e| e.to_string())?;

        if p.0.is_finite() && p.1.is_finite() {
            Ok(Point2::new(p.0, p.1))
        } else {
            Err(format!("non-finite result for ({}, {})", geo.lat, geo.lng))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sentinels() {
        let registry = CrsRegistry::builtin();
        let wgs84 = registry.lookup(WGS84_ID).unwrap();
        assert!(wgs84.is_geographic());
        assert_eq!(wgs84.coordinate_precision(), 6);

        let local = registry.lookup(LOCAL_ID).unwrap();
        assert!(local.is_local());
        assert!(local.projection_parameters.is_empty());
    }

    #[test]
    fn test_tm_zones() {
        let registry = CrsRegistry::builtin();
        for (id, meridian) in [("ITRF96_TM27", 27.0), ("ITRF96_TM30", 30.0), ("ITRF96_TM33", 33.0)] {
            let def = registry.lookup(id).unwrap();
            assert_eq!(def.kind, CrsKind::Projected);
            assert_eq!(def.central_meridian(), Some(meridian));
            assert_eq!(def.coordinate_precision(), 3);
        }
    }

    #[test]
    fn test_unknown_crs() {
        let registry = CrsRegistry::builtin();
        assert_eq!(
            registry.lookup("EPSG:9999"),
            Err(CoreError::UnknownCrs("EPSG:9999".to_string()))
        );
    }

    #[test]
    fn test_transverse_mercator_lookup_or_construct() {
        let registry = CrsRegistry::builtin();
        assert_eq!(registry.transverse_mercator(30.0).id, "ITRF96_TM30");

        let constructed = registry.transverse_mercator(36.0);
        assert_eq!(constructed.id, "ITRF96_TM36");
        assert_eq!(constructed.central_meridian(), Some(36.0));
        assert!(!registry.contains("ITRF96_TM36"));
    }

    #[test]
    fn test_with_definitions_overrides() {
        let custom = CrsDefinition::itrf96_tm(39.0);
        let registry = CrsRegistry::with_definitions([custom.clone()]);
        assert_eq!(registry.lookup("ITRF96_TM39").unwrap(), &custom);
        assert_eq!(registry.len(), CrsRegistry::builtin().len() + 1);
    }

    #[test]
    fn test_projector_central_meridian() {
        let registry = CrsRegistry::builtin();
        let projector = Projector::new(registry.lookup("ITRF96_TM30").unwrap()).unwrap();

        // 中央子午线上的点，东坐标等于假东偏
        let planar = projector.forward(LatLng::new(39.0, 30.0)).unwrap();
        assert!((planar.x - 500_000.0).abs() < 1e-3);
        assert!(planar.y > 4_000_000.0);

        let back = projector.inverse(planar).unwrap();
        assert!((back.lat - 39.0).abs() < 1e-8);
        assert!((back.lng - 30.0).abs() < 1e-8);
    }
}
