//! GeoJSON 读写
//!
//! 只处理 Point、LineString 和 Polygon，坐标顺序为 `[lng, lat]`。
//! 读取时其余几何类型（及无法解析的坐标）静默跳过。

use crate::error::FileError;
use fieldcad_core::feature::{FeatureCollection, GeoFeature, GeoGeometry, Properties};
use fieldcad_core::math::LatLng;
use serde_json::{json, Map, Value};
use std::path::Path;

/// 要素集合 -> GeoJSON 值
pub fn to_value(features: &FeatureCollection) -> Value {
    let features: Vec<Value> = features.iter().map(feature_to_value).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// 要素集合 -> GeoJSON 文本
pub fn to_string(features: &FeatureCollection) -> Result<String, FileError> {
    Ok(serde_json::to_string_pretty(&to_value(features))?)
}

fn feature_to_value(feature: &GeoFeature) -> Value {
    let (kind, coordinates) = match &feature.geometry {
        GeoGeometry::Point(p) => ("Point", json!(p.to_lng_lat())),
        GeoGeometry::LineString(line) => ("LineString", json!(ring_coords(line))),
        GeoGeometry::Polygon(rings) => {
            let rings: Vec<_> = rings.iter().map(|r| ring_coords(r)).collect();
            ("Polygon", json!(rings))
        }
    };

    let properties: Map<String, Value> = feature
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    json!({
        "type": "Feature",
        "geometry": { "type": kind, "coordinates": coordinates },
        "properties": properties,
    })
}

fn ring_coords(points: &[LatLng]) -> Vec<[f64; 2]> {
    points.iter().map(|p| p.to_lng_lat()).collect()
}

/// 从 GeoJSON 值读取
///
/// 接受 FeatureCollection、单个 Feature 或裸几何对象。
pub fn from_value(value: &Value) -> Result<FeatureCollection, FileError> {
    let kind = value.get("type").and_then(Value::as_str).ok_or_else(|| {
        FileError::InvalidFormat("GeoJSON object without \"type\"".to_string())
    })?;

    let mut skipped = 0usize;
    let mut collect = |feature: Option<GeoFeature>, out: &mut Vec<GeoFeature>| match feature {
        Some(f) => out.push(f),
        None => skipped += 1,
    };

    let mut features = Vec::new();
    match kind {
        "FeatureCollection" => {
            let items = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| FileError::InvalidFormat("FeatureCollection without features".to_string()))?;
            for item in items {
                collect(feature_from_value(item), &mut features);
            }
        }
        "Feature" => collect(feature_from_value(value), &mut features),
        _ => collect(
            geometry_from_value(value).map(GeoFeature::new),
            &mut features,
        ),
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} unsupported GeoJSON features", skipped);
    }

    Ok(FeatureCollection::new(features))
}

/// 从 GeoJSON 文本读取
pub fn from_str(text: &str) -> Result<FeatureCollection, FileError> {
    let value: Value = serde_json::from_str(text)?;
    from_value(&value)
}

/// 从 GeoJSON 文件读取
pub fn load(path: &Path) -> Result<FeatureCollection, FileError> {
    let text = std::fs::read_to_string(path)?;
    let features = from_str(&text)?;
    tracing::info!("Loaded {} features from {}", features.len(), path.display());
    Ok(features)
}

/// 写入 GeoJSON 文件
pub fn save(features: &FeatureCollection, path: &Path) -> Result<(), FileError> {
    std::fs::write(path, to_string(features)?)?;
    tracing::info!("Saved {} features to {}", features.len(), path.display());
    Ok(())
}

fn feature_from_value(value: &Value) -> Option<GeoFeature> {
    let geometry = geometry_from_value(value.get("geometry")?)?;
    let properties: Properties = value
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();
    Some(GeoFeature {
        geometry,
        properties,
    })
}

fn geometry_from_value(value: &Value) -> Option<GeoGeometry> {
    let coordinates = value.get("coordinates")?;
    match value.get("type")?.as_str()? {
        "Point" => position(coordinates).map(GeoGeometry::Point),
        "LineString" => positions(coordinates).map(GeoGeometry::LineString),
        "Polygon" => coordinates
            .as_array()?
            .iter()
            .map(positions)
            .collect::<Option<Vec<_>>>()
            .map(GeoGeometry::Polygon),
        _ => None,
    }
}

fn position(value: &Value) -> Option<LatLng> {
    let coord = value.as_array()?;
    let lng = coord.first()?.as_f64()?;
    let lat = coord.get(1)?.as_f64()?;
    Some(LatLng::new(lat, lng))
}

fn positions(value: &Value) -> Option<Vec<LatLng>> {
    value.as_array()?.iter().map(position).collect()
}
