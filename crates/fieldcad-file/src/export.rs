//! 测点与宗地导出
//!
//! - 坐标列表：每行 `<名称> <x> <y>`，地理坐标 x=经度、y=纬度
//! - 测点 DXF：每个测点一个 POINT 和一个 TEXT 标注
//! - 宗地 DXF：每个面要素一条闭合 LWPOLYLINE，未指定坐标系时自动选择 3° 带
//!
//! 所有坐标都通过 `from_geographic` 在恒等配准下转换。输入为空时不生成任何输出。

use crate::dxf_writer::DxfWriter;
use fieldcad_core::crs::{CrsDefinition, CrsRegistry};
use fieldcad_core::error::CoreResult;
use fieldcad_core::feature::FeatureCollection;
use fieldcad_core::georef::{AffineGeoConfig, GeoTransform};
use fieldcad_core::math::{LatLng, Point2};
use fieldcad_core::survey::RecordedPoint;
use std::fmt;

/// 测点图层
pub const POINTS_LAYER: &str = "RECORDED_POINTS";
/// 测点名称标注图层
pub const POINT_NAMES_LAYER: &str = "POINT_NAMES";
/// 宗地图层
pub const PARCEL_LAYER: &str = "PARSEL";

/// 标注相对测点的偏移
const LABEL_OFFSET: f64 = 0.5;
/// 标注文字高度
const LABEL_HEIGHT: f64 = 1.0;
/// 没有任何面要素时使用的中央子午线
const DEFAULT_ZONE_MERIDIAN: f64 = 33.0;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// 纯文本坐标列表
    Text,
    /// DXF 图纸
    Dxf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Dxf => "dxf",
        }
    }
}

/// 坐标列表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRow {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// 有序坐标列表
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateList {
    pub crs_id: String,
    /// 小数位数
    pub precision: usize,
    pub rows: Vec<CoordinateRow>,
}

impl CoordinateList {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for CoordinateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(
                f,
                "{} {:.*} {:.*}",
                row.name, self.precision, row.x, self.precision, row.y
            )?;
        }
        Ok(())
    }
}

/// 宗地导出结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelExport {
    /// 实际使用的坐标系（自动选择时可能不在注册表中）
    pub crs: CrsDefinition,
    pub document: String,
}

impl ParcelExport {
    /// 建议的文件名：`<图层名>_TM<子午线>.dxf`，名称中非字母数字替换为 `_`
    pub fn file_name(&self, layer_name: &str) -> String {
        let safe: String = layer_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        match self.crs.central_meridian() {
            Some(meridian) => format!("{}_TM{}.dxf", safe, meridian),
            None => format!("{}_{}.dxf", safe, self.crs.id),
        }
    }
}

fn identity_transform(def: &CrsDefinition) -> CoreResult<GeoTransform> {
    GeoTransform::with_crs(def, &AffineGeoConfig::identity(def.id.clone()))
}

/// 测点 -> 坐标列表（保持输入顺序）
pub fn to_coordinate_list(
    registry: &CrsRegistry,
    points: &[RecordedPoint],
    crs_id: &str,
) -> CoreResult<CoordinateList> {
    let def = registry.lookup(crs_id)?;
    let transform = identity_transform(def)?;

    let rows = points
        .iter()
        .map(|p| {
            let planar = transform.from_geographic(p.position());
            CoordinateRow {
                name: p.name.clone(),
                x: planar.x,
                y: planar.y,
            }
        })
        .collect();

    Ok(CoordinateList {
        crs_id: def.id.clone(),
        precision: def.coordinate_precision(),
        rows,
    })
}

/// 测点 -> DXF 文本；没有测点时返回 None
pub fn points_to_dxf(
    registry: &CrsRegistry,
    points: &[RecordedPoint],
    crs_id: &str,
) -> CoreResult<Option<String>> {
    if points.is_empty() {
        return Ok(None);
    }

    let def = registry.lookup(crs_id)?;
    let transform = identity_transform(def)?;
    let mut writer = DxfWriter::new(def.coordinate_precision());

    for point in points {
        let position = transform.from_geographic(point.position());
        let label = Point2::new(position.x + LABEL_OFFSET, position.y + LABEL_OFFSET);
        writer.add_point(POINTS_LAYER, position);
        writer.add_text(POINT_NAMES_LAYER, label, LABEL_HEIGHT, &point.name);
    }

    tracing::info!("Exported {} points to DXF in {}", points.len(), def.id);
    Ok(Some(writer.finish()))
}

/// 自动选择中央子午线：各面要素外环首点经度的平均值，取最近的 3 的倍数
///
/// 恰好居中时向 +∞ 取整（-4.5° 得到 -3°），结果不会是 -0.0。
pub fn select_zone_meridian(features: &FeatureCollection) -> f64 {
    let longitudes: Vec<f64> = features
        .polygons()
        .filter_map(|f| f.geometry.exterior_ring())
        .filter_map(|ring| ring.first())
        .map(|p| p.lng)
        .collect();

    if longitudes.is_empty() {
        return DEFAULT_ZONE_MERIDIAN;
    }

    let average = longitudes.iter().sum::<f64>() / longitudes.len() as f64;
    // 加 0.0 把 -0.0 规范为 0.0，否则坐标系 ID 会变成 TM-0
    (average / 3.0 + 0.5).floor() * 3.0 + 0.0
}

/// 自动选择宗地导出坐标系
pub fn select_parcel_crs(registry: &CrsRegistry, features: &FeatureCollection) -> CrsDefinition {
    registry.transverse_mercator(select_zone_meridian(features))
}

/// 宗地（面要素）-> DXF 文本
///
/// `crs_id` 为 None 时自动选择分带。没有面要素时返回 None。
pub fn parcels_to_dxf(
    registry: &CrsRegistry,
    features: &FeatureCollection,
    crs_id: Option<&str>,
) -> CoreResult<Option<ParcelExport>> {
    if features.polygons().next().is_none() {
        return Ok(None);
    }

    let crs = match crs_id {
        Some(id) => registry.lookup(id)?.clone(),
        None => select_parcel_crs(registry, features),
    };
    let transform = identity_transform(&crs)?;
    // 平面坐标固定 3 位，地理坐标 6 位
    let mut writer = DxfWriter::new(crs.coordinate_precision());

    let mut count = 0usize;
    for ring in features.polygons().filter_map(|f| f.geometry.exterior_ring()) {
        let vertices: Vec<Point2> = ring
            .iter()
            .map(|&ll: &LatLng| transform.from_geographic(ll))
            .collect();
        writer.add_closed_polyline(PARCEL_LAYER, &vertices);
        count += 1;
    }

    tracing::info!("Exported {} parcels to DXF in {}", count, crs.id);
    Ok(Some(ParcelExport {
        crs,
        document: writer.finish(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcad_core::error::CoreError;
    use fieldcad_core::feature::{GeoFeature, GeoGeometry};

    fn points() -> Vec<RecordedPoint> {
        vec![
            RecordedPoint::new("a", "P-1", LatLng::new(41.0082, 28.9784)),
            RecordedPoint::new("b", "P-2", LatLng::new(41.0090, 28.9790)),
        ]
    }

    fn parcel(first_lng: f64, lat: f64) -> GeoFeature {
        GeoFeature::new(GeoGeometry::Polygon(vec![vec![
            LatLng::new(lat, first_lng),
            LatLng::new(lat, first_lng + 0.001),
            LatLng::new(lat + 0.001, first_lng + 0.001),
            LatLng::new(lat, first_lng),
        ]]))
    }

    #[test]
    fn test_wgs84_coordinate_list() {
        let registry = CrsRegistry::builtin();
        let list = to_coordinate_list(&registry, &points(), "WGS84").unwrap();
        assert_eq!(list.precision, 6);
        assert_eq!(
            list.to_string(),
            "P-1 28.978400 41.008200\nP-2 28.979000 41.009000\n"
        );
    }

    #[test]
    fn test_projected_coordinate_list() {
        let registry = CrsRegistry::builtin();
        let list = to_coordinate_list(&registry, &points(), "ITRF96_TM30").unwrap();
        assert_eq!(list.precision, 3);

        let text = list.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let fields: Vec<&str> = lines[0].split(' ').collect();
        assert_eq!(fields[0], "P-1");
        assert_eq!(fields[1].split('.').nth(1).map(str::len), Some(3));
        // 中央子午线以西，东坐标小于 500 000
        let easting: f64 = fields[1].parse().unwrap();
        assert!(easting < 500_000.0 && easting > 300_000.0);
    }

    #[test]
    fn test_empty_exports_are_noops() {
        let registry = CrsRegistry::builtin();
        assert!(to_coordinate_list(&registry, &[], "WGS84").unwrap().is_empty());
        assert!(points_to_dxf(&registry, &[], "WGS84").unwrap().is_none());
        assert!(parcels_to_dxf(&registry, &FeatureCollection::default(), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unknown_crs() {
        let registry = CrsRegistry::builtin();
        assert_eq!(
            to_coordinate_list(&registry, &points(), "EPSG:1").unwrap_err(),
            CoreError::UnknownCrs("EPSG:1".to_string())
        );
    }

    #[test]
    fn test_points_dxf() {
        let registry = CrsRegistry::builtin();
        let doc = points_to_dxf(&registry, &points(), "WGS84").unwrap().unwrap();

        assert!(doc.starts_with("0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1015\n0\nENDSEC\n0\nSECTION\n2\nENTITIES\n"));
        assert!(doc.contains("0\nPOINT\n8\nRECORDED_POINTS\n10\n28.978400\n20\n41.008200\n30\n0.0\n"));
        assert!(doc.contains("0\nTEXT\n8\nPOINT_NAMES\n10\n29.478400\n20\n41.508200\n30\n0.0\n40\n1.0\n1\nP-1\n"));
        assert_eq!(doc.matches("\nPOINT\n").count(), 2);
        assert!(doc.ends_with("0\nENDSEC\n0\nEOF"));
    }

    #[test]
    fn test_zone_selection() {
        let registry = CrsRegistry::builtin();
        let features = FeatureCollection::new(vec![parcel(31.4, 39.0)]);
        assert_eq!(select_zone_meridian(&features), 30.0);
        assert_eq!(select_parcel_crs(&registry, &features).id, "ITRF96_TM30");

        let features = FeatureCollection::new(vec![parcel(35.0, 39.0), parcel(37.0, 39.0)]);
        assert_eq!(select_zone_meridian(&features), 36.0);
        let crs = select_parcel_crs(&registry, &features);
        assert_eq!(crs.id, "ITRF96_TM36");
        assert_eq!(crs.central_meridian(), Some(36.0));

        assert_eq!(select_zone_meridian(&FeatureCollection::default()), 33.0);
    }

    #[test]
    fn test_zone_selection_halves_and_zero() {
        let registry = CrsRegistry::builtin();

        // 居中值向 +∞ 取整
        let features = FeatureCollection::new(vec![parcel(-4.5, 39.0)]);
        assert_eq!(select_zone_meridian(&features), -3.0);
        let features = FeatureCollection::new(vec![parcel(34.5, 39.0)]);
        assert_eq!(select_zone_meridian(&features), 36.0);

        let features = FeatureCollection::new(vec![parcel(-1.0, 51.5)]);
        let meridian = select_zone_meridian(&features);
        assert_eq!(meridian, 0.0);
        assert!(meridian.is_sign_positive());
        assert_eq!(select_parcel_crs(&registry, &features).id, "ITRF96_TM0");
    }

    #[test]
    fn test_parcels_dxf() {
        let registry = CrsRegistry::builtin();
        let features = FeatureCollection::new(vec![
            parcel(31.4, 39.0),
            GeoFeature::new(GeoGeometry::Point(LatLng::new(39.0, 31.4))),
        ]);
        let export = parcels_to_dxf(&registry, &features, None).unwrap().unwrap();

        assert_eq!(export.crs.id, "ITRF96_TM30");
        assert_eq!(export.document.matches("LWPOLYLINE").count(), 1);
        assert!(export.document.contains("0\nLWPOLYLINE\n8\nPARSEL\n90\n4\n70\n1\n"));
        assert_eq!(export.file_name("Parsel Sorgu 12:00"), "Parsel_Sorgu_12_00_TM30.dxf");
    }

    #[test]
    fn test_parcels_explicit_crs() {
        let registry = CrsRegistry::builtin();
        let features = FeatureCollection::new(vec![parcel(31.4, 39.0)]);
        let export = parcels_to_dxf(&registry, &features, Some("ITRF96_TM33"))
            .unwrap()
            .unwrap();
        assert_eq!(export.crs.id, "ITRF96_TM33");
    }
}
