//! DXF 图纸导入
//!
//! 把 DXF 解析为 [`CadDrawing`]。只保留点、直线、圆、圆弧和多段线，
//! 其余实体类型静默跳过。配准在核心库中单独进行。

use crate::error::FileError;
use fieldcad_core::color::{ColorIndex, BY_LAYER};
use fieldcad_core::drawing::{CadDrawing, LayerInfo};
use fieldcad_core::geometry::{Arc, CadEntity, CadGeometry, Line, Point, Polyline};
use fieldcad_core::math::Point2;
use std::io::Read;
use std::path::Path;

/// 从 DXF 文件导入
pub fn import_file(path: &Path) -> Result<CadDrawing, FileError> {
    let drawing = dxf::Drawing::load_file(path).map_err(|e| FileError::Dxf(e.to_string()))?;
    let result = convert_drawing(&drawing);

    tracing::info!(
        "Imported {} entities, {} layers from {}",
        result.entities.len(),
        result.layers.len(),
        path.display()
    );

    Ok(result)
}

/// 从任意读取器导入
pub fn import_reader<R: Read>(reader: &mut R) -> Result<CadDrawing, FileError> {
    let drawing = dxf::Drawing::load(reader).map_err(|e| FileError::Dxf(e.to_string()))?;
    Ok(convert_drawing(&drawing))
}

/// 从 DXF 文本导入
pub fn import_str(text: &str) -> Result<CadDrawing, FileError> {
    import_reader(&mut text.as_bytes())
}

fn convert_drawing(drawing: &dxf::Drawing) -> CadDrawing {
    let layers = drawing
        .layers()
        .map(|layer| LayerInfo::new(layer.name.clone(), color_index(&layer.color)))
        .collect();

    let mut entities = Vec::new();
    let mut skipped = 0usize;
    for entity in drawing.entities() {
        match convert_dxf_entity(entity) {
            Some(e) => entities.push(e),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} unsupported DXF entities", skipped);
    }

    CadDrawing::new(entities, layers)
}

/// 将 DXF 实体转换为图纸实体
fn convert_dxf_entity(entity: &dxf::entities::Entity) -> Option<CadEntity> {
    let geometry = match &entity.specific {
        dxf::entities::EntityType::ModelPoint(point) => {
            CadGeometry::Point(Point::new(point.location.x, point.location.y))
        }

        dxf::entities::EntityType::Line(line) => {
            let start = Point2::new(line.p1.x, line.p1.y);
            let end = Point2::new(line.p2.x, line.p2.y);
            CadGeometry::Line(Line::new(start, end))
        }

        dxf::entities::EntityType::Circle(circle) => {
            let center = Point2::new(circle.center.x, circle.center.y);
            CadGeometry::Arc(Arc::full_circle(center, circle.radius))
        }

        dxf::entities::EntityType::Arc(arc) => {
            let center = Point2::new(arc.center.x, arc.center.y);
            let start_angle = arc.start_angle.to_radians();
            let end_angle = arc.end_angle.to_radians();
            CadGeometry::Arc(Arc::new(center, arc.radius, start_angle, end_angle))
        }

        // 凸度（bulge）忽略，按直线段连接
        dxf::entities::EntityType::LwPolyline(lwpoly) => {
            let vertices = lwpoly
                .vertices
                .iter()
                .map(|v| Point2::new(v.x, v.y))
                .collect();
            CadGeometry::Polyline(Polyline::new(vertices, lwpoly.is_closed()))
        }

        dxf::entities::EntityType::Polyline(poly) => {
            let vertices = poly
                .vertices()
                .map(|v| Point2::new(v.location.x, v.location.y))
                .collect();
            CadGeometry::Polyline(Polyline::new(vertices, poly.is_closed()))
        }

        _ => return None,
    };

    let mut cad_entity = CadEntity::new(geometry, entity.common.layer.clone())
        .with_color(ColorIndex::from_raw(color_index(&entity.common.color)));

    let handle = entity.common.handle.0;
    if handle != 0 {
        cad_entity = cad_entity.with_handle(format!("{:X}", handle));
    }

    Some(cad_entity)
}

/// DXF 颜色 -> 原始索引；随层为 256，随块及其他未定义值按未设置处理
fn color_index(color: &dxf::Color) -> Option<i16> {
    if color.is_by_layer() {
        Some(BY_LAYER)
    } else {
        color.index().map(i16::from)
    }
}
