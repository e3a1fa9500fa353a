//! 坐标输入解析器
//!
//! 支持的格式：
//! - 逗号分隔: `41.0082,28.9784`、`41.0082, 28.9784`
//! - 空白分隔: `41.0082 28.9784`
//!
//! 顺序总是 纬度, 经度。

use crate::math::LatLng;

/// 解析错误
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 无效格式
    InvalidFormat(String),
    /// 数值超出范围
    OutOfRange(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            ParseError::OutOfRange(msg) => write!(f, "Out of range: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// 输入解析器
pub struct InputParser;

impl InputParser {
    /// 解析两个数值
    pub fn parse_pair(input: &str) -> Result<(f64, f64), ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::InvalidFormat("Empty input".to_string()));
        }

        let parts: Vec<&str> = if input.contains(',') {
            input.split(',').map(str::trim).collect()
        } else {
            input.split_whitespace().collect()
        };

        let [first, second] = parts.as_slice() else {
            return Err(ParseError::InvalidFormat(format!(
                "Expected two values, got '{}'",
                input
            )));
        };

        let a = first
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidFormat(format!("Invalid number: {}", first)))?;
        let b = second
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidFormat(format!("Invalid number: {}", second)))?;

        Ok((a, b))
    }

    /// 解析 `纬度,经度`
    pub fn parse_lat_lng(input: &str) -> Result<LatLng, ParseError> {
        let (lat, lng) = Self::parse_pair(input)?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(ParseError::OutOfRange(format!("latitude {}", lat)));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ParseError::OutOfRange(format!("longitude {}", lng)));
        }

        Ok(LatLng::new(lat, lng))
    }
}
