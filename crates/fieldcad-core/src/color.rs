//! CAD 索引颜色（ACI）解析
//!
//! 只保留前 10 个索引的固定调色板，与常见 CAD 软件的显示一致。
//! 调色板之外的索引统一显示为默认蓝色。

use serde::{Deserialize, Serialize};

/// "随层" 哨兵值
pub const BY_LAYER: i16 = 256;

/// 图层未指定颜色时的索引（白色）
pub const DEFAULT_LAYER_INDEX: i16 = 7;

/// 调色板之外的默认颜色
pub const DEFAULT_HEX: &str = "#3b82f6";

const PALETTE: [&str; 10] = [
    "#ffffff", // 0
    "#ff0000", // 1 红
    "#ffff00", // 2 黄
    "#00ff00", // 3 绿
    "#00ffff", // 4 青
    "#0000ff", // 5 蓝
    "#ff00ff", // 6 品红
    "#ffffff", // 7 白
    "#808080", // 8 灰
    "#c0c0c0", // 9 浅灰
];

/// 实体或图层的颜色引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorIndex {
    /// 未指定，继承图层颜色
    Unset,
    /// 原始索引值（256 为随层）
    Index(i16),
}

impl ColorIndex {
    pub fn from_raw(raw: Option<i16>) -> Self {
        raw.map_or(ColorIndex::Unset, ColorIndex::Index)
    }

    /// 解析为十六进制颜色
    ///
    /// `layer_index` 是所属图层的颜色索引，图层缺失时传 `None`（按 7 处理）。
    pub fn resolve(&self, layer_index: Option<i16>) -> &'static str {
        let index = match self {
            ColorIndex::Index(i) if *i != BY_LAYER => *i,
            _ => layer_index.unwrap_or(DEFAULT_LAYER_INDEX),
        };
        palette_hex(index)
    }
}

impl Default for ColorIndex {
    fn default() -> Self {
        ColorIndex::Unset
    }
}

/// 索引 -> 十六进制颜色，超出调色板返回默认色
pub fn palette_hex(index: i16) -> &'static str {
    usize::try_from(index)
        .ok()
        .and_then(|i| PALETTE.get(i))
        .copied()
        .unwrap_or(DEFAULT_HEX)
}
