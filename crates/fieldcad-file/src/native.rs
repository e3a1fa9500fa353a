//! 项目文件格式（.fcp）
//!
//! 基于 MessagePack + Zstd 的紧凑二进制格式：
//! - 16 字节文件头：魔数、版本、标志位、压缩后长度
//! - 之后是压缩后的 MessagePack 数据
//!
//! CAD 图层只保存实体和配准参数，加载时重新配准生成要素。

use crate::error::FileError;
use crate::project::{ProjectMetadata, SurveyProject};
use fieldcad_core::crs::CrsRegistry;
use fieldcad_core::georef::AffineGeoConfig;
use fieldcad_core::layer::{DrawingLayer, LayerSource, SubLayerVisibility};
use fieldcad_core::survey::{PointStore, RecordedPoint};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 文件魔数 "FCAD"
const MAGIC: &[u8; 4] = b"FCAD";

/// 当前文件格式版本
const FORMAT_VERSION: u32 = 1;

/// Zstd 压缩级别（1-22，3 是默认值，平衡速度和压缩比）
const COMPRESSION_LEVEL: i32 = 3;

/// 文件头（16 字节）
#[derive(Debug)]
struct FileHeader {
    /// 魔数 "FCAD"
    magic: [u8; 4],
    /// 格式版本
    version: u32,
    /// 标志位（预留）
    flags: u32,
    /// 压缩后数据长度
    compressed_size: u32,
}

impl FileHeader {
    fn new(compressed_size: u32) -> Self {
        Self {
            magic: *MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            compressed_size,
        }
    }

    fn write(&self, writer: &mut impl Write) -> Result<(), std::io::Error> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        Ok(())
    }

    fn read(reader: &mut impl Read) -> Result<Self, FileError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if &magic != MAGIC {
            return Err(FileError::InvalidFormat(
                "Invalid magic number, not a FieldCAD project".to_string(),
            ));
        }

        let mut buf = [0u8; 4];

        reader.read_exact(&mut buf)?;
        let version = u32::from_le_bytes(buf);

        reader.read_exact(&mut buf)?;
        let flags = u32::from_le_bytes(buf);

        reader.read_exact(&mut buf)?;
        let compressed_size = u32::from_le_bytes(buf);

        Ok(Self {
            magic,
            version,
            flags,
            compressed_size,
        })
    }
}

/// 图层的持久化形式（不含派生要素）
#[derive(Debug, Serialize, Deserialize)]
struct LayerRecord {
    name: String,
    visible: bool,
    config: AffineGeoConfig,
    source: LayerSource,
    sub_layers: SubLayerVisibility,
}

impl LayerRecord {
    fn from_layer(layer: &DrawingLayer) -> Self {
        Self {
            name: layer.name().to_string(),
            visible: layer.visible,
            config: layer.config().clone(),
            source: layer.source().clone(),
            sub_layers: layer.sub_layers().clone(),
        }
    }
}

/// 可序列化的文件内容
#[derive(Debug, Serialize, Deserialize)]
struct FileContent {
    metadata: ProjectMetadata,
    export_crs: String,
    points: Vec<RecordedPoint>,
    layers: Vec<LayerRecord>,
}

/// 项目 -> 文件字节
pub fn to_bytes(project: &SurveyProject) -> Result<Vec<u8>, FileError> {
    let content = FileContent {
        metadata: project.metadata.clone(),
        export_crs: project.export_crs.clone(),
        points: project.points.points().to_vec(),
        layers: project.layers.iter().map(LayerRecord::from_layer).collect(),
    };

    // 序列化为 MessagePack
    let msgpack_data = rmp_serde::to_vec(&content)?;

    // 使用 Zstd 压缩
    let compressed_data = zstd::encode_all(msgpack_data.as_slice(), COMPRESSION_LEVEL)?;
    let compressed_size = u32::try_from(compressed_data.len())
        .map_err(|_| FileError::InvalidFormat("Project too large".to_string()))?;

    let mut bytes = Vec::with_capacity(16 + compressed_data.len());
    FileHeader::new(compressed_size).write(&mut bytes)?;
    bytes.extend_from_slice(&compressed_data);
    Ok(bytes)
}

/// 从读取器加载项目，CAD 图层重新配准
pub fn from_reader(reader: &mut impl Read, registry: &CrsRegistry) -> Result<SurveyProject, FileError> {
    // 读取文件头
    let header = FileHeader::read(reader)?;

    // 版本检查
    if header.version > FORMAT_VERSION {
        return Err(FileError::UnsupportedVersion(format!(
            "File version {} is newer than supported version {}",
            header.version, FORMAT_VERSION
        )));
    }

    // 读取压缩数据
    let mut compressed_data = vec![0u8; header.compressed_size as usize];
    reader.read_exact(&mut compressed_data)?;

    // 解压缩
    let msgpack_data = zstd::decode_all(compressed_data.as_slice())?;

    // 反序列化
    let content: FileContent = rmp_serde::from_slice(&msgpack_data)?;

    let layers = content
        .layers
        .into_iter()
        .map(|record| {
            DrawingLayer::restore(
                registry,
                record.name,
                record.source,
                record.config,
                record.sub_layers,
                record.visible,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SurveyProject {
        metadata: content.metadata,
        export_crs: content.export_crs,
        points: PointStore::from_points(content.points),
        layers,
    })
}

/// 保存项目到文件
pub fn save(project: &SurveyProject, path: &Path) -> Result<(), FileError> {
    let bytes = to_bytes(project)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;

    tracing::info!(
        "Saved {} points, {} layers to {} ({} bytes)",
        project.points.len(),
        project.layers.len(),
        path.display(),
        bytes.len()
    );

    Ok(())
}

/// 从文件加载项目
pub fn load(path: &Path, registry: &CrsRegistry) -> Result<SurveyProject, FileError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let project = from_reader(&mut reader, registry)?;

    tracing::info!(
        "Loaded {} points, {} layers from {}",
        project.points.len(),
        project.layers.len(),
        path.display()
    );

    Ok(project)
}
