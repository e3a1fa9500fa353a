//! 最小 DXF 文本写入器
//!
//! 导出只需要 HEADER 和 ENTITIES 两个段，输出完全由输入决定：
//! ```text
//! 0
//! SECTION
//! 2
//! HEADER
//! 9
//! $ACADVER
//! 1
//! AC1015
//! 0
//! ENDSEC
//! 0
//! SECTION
//! 2
//! ENTITIES
//! ...
//! 0
//! ENDSEC
//! 0
//! EOF
//! ```
//!
//! 常用组码：
//! - 0: 实体类型
//! - 8: 图层名
//! - 10, 20, 30: X, Y, Z 坐标
//! - 40: 文字高度
//! - 1: 文字内容
//! - 90: 顶点数
//! - 70: 标志（多段线 1 = 闭合）

use crate::error::FileError;
use fieldcad_core::math::Point2;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// AutoCAD 2000
const ACAD_VERSION: &str = "AC1015";

/// DXF 写入器
pub struct DxfWriter {
    output: Vec<String>,
    /// 坐标小数位数
    precision: usize,
}

impl DxfWriter {
    /// 创建写入器并写好 HEADER 段，打开 ENTITIES 段
    pub fn new(precision: usize) -> Self {
        let mut writer = Self {
            output: Vec::new(),
            precision,
        };
        writer.begin_section("HEADER");
        writer.write_pair(9, "$ACADVER");
        writer.write_pair(1, ACAD_VERSION);
        writer.end_section();
        writer.begin_section("ENTITIES");
        writer
    }

    /// 写入组码-值对
    ///
    /// 值中的换行替换为空格，一个值只能占一行。
    pub fn write_pair(&mut self, code: i32, value: impl std::fmt::Display) {
        let value = value.to_string();
        self.output.push(code.to_string());
        if value.contains(['\n', '\r']) {
            self.output.push(value.replace("\r\n", " ").replace(['\n', '\r'], " "));
        } else {
            self.output.push(value);
        }
    }

    fn write_coord(&mut self, code: i32, value: f64) {
        let text = format!("{:.*}", self.precision, value);
        self.write_pair(code, text);
    }

    /// 写入点坐标（Z = 0）
    pub fn write_point(&mut self, base_code: i32, point: Point2) {
        self.write_coord(base_code, point.x);
        self.write_coord(base_code + 10, point.y);
        self.write_pair(base_code + 20, "0.0");
    }

    /// 写入 SECTION 开始
    pub fn begin_section(&mut self, name: &str) {
        self.write_pair(0, "SECTION");
        self.write_pair(2, name);
    }

    /// 写入 SECTION 结束
    pub fn end_section(&mut self) {
        self.write_pair(0, "ENDSEC");
    }

    /// POINT 实体
    pub fn add_point(&mut self, layer: &str, position: Point2) {
        self.write_pair(0, "POINT");
        self.write_pair(8, layer);
        self.write_point(10, position);
    }

    /// TEXT 实体
    pub fn add_text(&mut self, layer: &str, position: Point2, height: f64, content: &str) {
        self.write_pair(0, "TEXT");
        self.write_pair(8, layer);
        self.write_point(10, position);
        self.write_pair(40, format!("{:.1}", height));
        self.write_pair(1, content);
    }

    /// 闭合 LWPOLYLINE 实体
    pub fn add_closed_polyline(&mut self, layer: &str, vertices: &[Point2]) {
        self.write_pair(0, "LWPOLYLINE");
        self.write_pair(8, layer);
        self.write_pair(90, vertices.len());
        self.write_pair(70, 1);
        for v in vertices {
            self.write_coord(10, v.x);
            self.write_coord(20, v.y);
        }
    }

    /// 结束 ENTITIES 段并获取输出
    pub fn finish(mut self) -> String {
        self.end_section();
        self.write_pair(0, "EOF");
        self.output.join("\n")
    }

    /// 保存到文件
    pub fn save_to_file(self, path: &Path) -> Result<(), FileError> {
        let content = self.finish();
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}
