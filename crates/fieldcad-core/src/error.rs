//! 核心错误定义

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown CRS: {0}")]
    UnknownCrs(String),

    #[error("Invalid scale {0}: scale must be positive")]
    InvalidScale(f64),

    #[error("Projection setup failed for {crs}: {message}")]
    Projection { crs: String, message: String },

    #[error("Recorded point not found: {0}")]
    PointNotFound(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
