//! FieldCAD 文件格式处理
//!
//! 支持：
//! - `.dxf` 导入（图纸叠加）与导出（测点、宗地）
//! - 测点坐标列表导出
//! - GeoJSON 读写（宗地查询结果、配准后的图层）
//! - `.fcp` 项目文件

pub mod dxf_io;
pub mod dxf_writer;
pub mod error;
pub mod export;
pub mod geojson;
pub mod native;
pub mod project;

pub use error::FileError;
pub use export::{
    parcels_to_dxf, points_to_dxf, select_parcel_crs, select_zone_meridian, to_coordinate_list,
    CoordinateList, ExportFormat, ParcelExport,
};
pub use project::{ProjectMetadata, SurveyProject};
