//! 子命令实现

use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use fieldcad_core::crs::CrsRegistry;
use fieldcad_core::feature::FeatureCollection;
use fieldcad_core::georef::AffineGeoConfig;
use fieldcad_core::layer::DrawingLayer;
use fieldcad_core::math::LatLng;
use fieldcad_core::snap::{web_mercator_pixels, PointSnapper};
use fieldcad_core::survey::{display_coordinates, MeasurementPath, RecordedPoint, StakeoutReading};
use fieldcad_file::{dxf_io, export, geojson, native, ExportFormat, SurveyProject};
use std::path::{Path, PathBuf};
use tracing::info;

/// 命令行给出的配准参数，覆盖配置文件
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GeorefArgs {
    /// 图纸坐标系 ID
    #[arg(long)]
    pub crs: Option<String>,
    /// 本地坐标系原点 `lat,lng`
    #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true)]
    pub origin: Option<LatLng>,
    #[arg(long, allow_hyphen_values = true)]
    pub offset_x: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub offset_y: Option<f64>,
    #[arg(long)]
    pub scale: Option<f64>,
    /// 逆时针旋转角（度）
    #[arg(long, allow_hyphen_values = true)]
    pub rotation: Option<f64>,
}

impl GeorefArgs {
    pub fn apply(&self, base: &AffineGeoConfig) -> AffineGeoConfig {
        let mut config = base.clone();
        if let Some(crs) = &self.crs {
            config.crs_id = crs.clone();
        }
        if let Some(origin) = self.origin {
            config.origin_lat = origin.lat;
            config.origin_lng = origin.lng;
        }
        if let Some(v) = self.offset_x {
            config.offset_x = v;
        }
        if let Some(v) = self.offset_y {
            config.offset_y = v;
        }
        if let Some(v) = self.scale {
            config.scale = v;
        }
        if let Some(v) = self.rotation {
            config.rotation_degrees = v;
        }
        config
    }
}

/// clap 用的坐标解析
pub fn parse_lat_lng(input: &str) -> Result<LatLng, String> {
    fieldcad_core::input_parser::InputParser::parse_lat_lng(input).map_err(|e| e.to_string())
}

/// 写到文件或标准输出
fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn is_project_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("fcp"))
}

/// 读取测点：`.fcp` 项目文件或 JSON 数组
fn load_points(path: &Path, registry: &CrsRegistry) -> Result<Vec<RecordedPoint>> {
    if is_project_file(path) {
        let project = native::load(path, registry)?;
        return Ok(project.points.points().to_vec());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid point list {}", path.display()))
}

fn load_or_create_project(path: &Path, registry: &CrsRegistry) -> Result<SurveyProject> {
    if path.exists() {
        return Ok(native::load(path, registry)?);
    }
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string());
    info!("Creating new project {}", name);
    Ok(SurveyProject::new(name))
}

pub fn list_crs(registry: &CrsRegistry) -> Result<()> {
    for def in registry.iter() {
        println!("{:<14} {:<26} {}", def.id, def.display_name, def.projection_parameters);
    }
    Ok(())
}

pub fn import(
    registry: &CrsRegistry,
    config: &AppConfig,
    drawing: &Path,
    georef: &GeorefArgs,
    hidden: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let name = drawing
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cad = dxf_io::import_file(drawing)?;
    let mut layer = DrawingLayer::from_drawing(registry, name, cad, georef.apply(&config.georef))
        .context("Invalid georeference")?;

    for sub_layer in hidden {
        layer.sub_layers_mut().set(sub_layer, false);
    }

    let visible: FeatureCollection = layer.visible_features().cloned().collect();
    match output {
        Some(path) => geojson::save(&visible, path)?,
        None => println!("{}", geojson::to_string(&visible)?),
    }
    Ok(())
}

pub fn export_points(
    registry: &CrsRegistry,
    config: &AppConfig,
    points: &Path,
    crs: Option<&str>,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let crs = crs.unwrap_or(config.export_crs.as_str());
    let points = load_points(points, registry)?;
    if points.is_empty() {
        info!("No points to export");
        return Ok(());
    }

    let content = match format {
        ExportFormat::Text => export::to_coordinate_list(registry, &points, crs)?.to_string(),
        ExportFormat::Dxf => match export::points_to_dxf(registry, &points, crs)? {
            Some(doc) => doc,
            None => return Ok(()),
        },
    };
    let output = output.map(|path| with_default_extension(path, format));
    write_output(output.as_deref(), &content)
}

/// 输出文件没有扩展名时按导出格式补上
fn with_default_extension(path: &Path, format: ExportFormat) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(format.extension())
    }
}

pub fn export_parcels(
    registry: &CrsRegistry,
    parcels: &Path,
    crs: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let features = geojson::load(parcels)?;
    let Some(result) = export::parcels_to_dxf(registry, &features, crs)? else {
        info!("No parcel polygons to export");
        return Ok(());
    };

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let stem = parcels
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            parcels.with_file_name(result.file_name(&stem))
        }
    };
    info!("Exporting parcels in {}", result.crs.display_name);
    write_output(Some(&output), &result.document)
}

/// 宗地各边长度，按标注位置输出
pub fn parcel_edges(parcels: &Path) -> Result<()> {
    let features = geojson::load(parcels)?;
    for edge in features.parcel_edge_lengths() {
        println!("{:.6} {:.6} {}", edge.midpoint.lat, edge.midpoint.lng, edge.label());
    }
    Ok(())
}

pub fn stakeout(config: &AppConfig, from: LatLng, to: LatLng) -> Result<()> {
    let reading = StakeoutReading::between(from, to, &config.stakeout);
    println!("Distance: {}", reading.display_distance());
    println!("Bearing:  {}", reading.display_bearing());
    if reading.arrived {
        println!("Arrived");
    }
    Ok(())
}

pub fn measure(points: &[LatLng]) -> Result<()> {
    if points.len() < 2 {
        bail!("Measuring needs at least two points");
    }
    let mut path = MeasurementPath::new();
    for &p in points {
        path.push(p);
    }
    for (i, length) in path.segment_lengths().iter().enumerate() {
        println!("{:>3}: {:.2} m", i + 1, length);
    }
    println!("Total: {}", path.display_total());
    Ok(())
}

pub fn capture(
    registry: &CrsRegistry,
    config: &AppConfig,
    project_path: &Path,
    position: LatLng,
    no_snap: bool,
) -> Result<()> {
    let mut project = load_or_create_project(project_path, registry)?;

    let mut snapper = PointSnapper::new(config.snap.clone());
    if no_snap {
        snapper.config_mut().enabled = false;
    }
    let zoom = config.zoom;
    let resolved = snapper.resolve_click(position, project.points.points(), |ll| {
        web_mercator_pixels(ll, zoom)
    });
    if resolved != position {
        info!("Snapped to existing point at {:.6}, {:.6}", resolved.lat, resolved.lng);
    }

    let point = project.points.capture(resolved);
    println!("{} {:.6} {:.6}", point.name, point.lat, point.lng);

    project.metadata.touch();
    native::save(&project, project_path)?;
    Ok(())
}

pub fn list_points(registry: &CrsRegistry, config: &AppConfig, project_path: &Path) -> Result<()> {
    let project = native::load(project_path, registry)?;
    let crs = if project.export_crs.is_empty() {
        config.export_crs.as_str()
    } else {
        project.export_crs.as_str()
    };
    let geographic = registry.lookup(crs)?.is_geographic();
    let list = export::to_coordinate_list(registry, project.points.points(), crs)?;
    for row in &list.rows {
        println!("{:<8} {}", row.name, display_coordinates(row.x, row.y, geographic));
    }
    Ok(())
}

pub fn add_layer(
    registry: &CrsRegistry,
    config: &AppConfig,
    project_path: &Path,
    source: &Path,
    georef: &GeorefArgs,
) -> Result<()> {
    let mut project = load_or_create_project(project_path, registry)?;
    let name = source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let is_dxf = source
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dxf"));
    let layer = if is_dxf {
        let drawing = dxf_io::import_file(source)?;
        DrawingLayer::from_drawing(registry, name, drawing, georef.apply(&config.georef))?
    } else {
        DrawingLayer::from_features(name, geojson::load(source)?)
    };

    info!("Added layer {} with {} features", layer.name(), layer.features().len());
    project.remove_layer(layer.name());
    project.add_layer(layer);
    project.metadata.touch();
    native::save(&project, project_path)?;
    Ok(())
}
