//! FieldCAD 核心引擎
//!
//! 提供 CAD 图纸的地理配准、坐标系注册表、测点与放样、量测和捕捉。
//!
//! # 架构设计
//!
//! 数据按所有权分层：
//! - `CadDrawing`: 解析后的图纸，导入后不再改变
//! - `DrawingLayer`: 图纸 + 配准参数 + 派生的地理要素
//! - `PointStore`: 采集的测点与当前放样会话
//!
//! 参数变化时从图纸重新派生要素，不重新解析文件。
//!
//! # 示例
//!
//! ```rust
//! use fieldcad_core::prelude::*;
//!
//! let registry = CrsRegistry::builtin();
//! let config = AffineGeoConfig::identity(WGS84_ID);
//! let geo = to_geographic(&registry, 28.9784, 41.0082, &config).unwrap();
//! println!("{:?}", geo.lat_lng());
//! ```

pub mod color;
pub mod crs;
pub mod drawing;
pub mod error;
pub mod feature;
pub mod geodesic;
pub mod geometry;
pub mod georef;
pub mod input_parser;
pub mod layer;
pub mod math;
pub mod snap;
pub mod survey;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::color::ColorIndex;
    pub use crate::crs::{CrsDefinition, CrsKind, CrsRegistry, LOCAL_ID, WGS84_ID};
    pub use crate::drawing::{CadDrawing, LayerInfo};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::feature::{FeatureCollection, GeoFeature, GeoGeometry};
    pub use crate::geodesic::EdgeLength;
    pub use crate::geometry::{Arc, CadEntity, CadGeometry, Line, Point, Polyline};
    pub use crate::georef::{from_geographic, to_geographic, AffineGeoConfig, GeoOutcome, GeoTransform};
    pub use crate::input_parser::{InputParser, ParseError};
    pub use crate::layer::{DrawingLayer, LayerSource, SubLayerVisibility};
    pub use crate::math::{GeoBounds, LatLng, Point2, Vector2};
    pub use crate::snap::{PointSnapper, SnapConfig};
    pub use crate::survey::{
        MeasurementPath, PointStore, RecordedPoint, StakeoutConfig, StakeoutReading, StakeoutSession,
    };
}
