// ==========================================
// Tover - CSV 解析器
// ==========================================
// 职责: 上传内容 → Vec<RawRow>
// 约定: 表头 trim + 小写；去 BOM；跳过全空行；行号 = 文件行号
// ==========================================

use crate::domain::import::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;

const UTF8_BOM: char = '\u{feff}';

/// 解析结果：表头 + 数据行
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 解析原始字节（必须是 UTF-8）
    pub fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedCsv> {
        let text = std::str::from_utf8(bytes)?;
        self.parse(text)
    }

    /// 解析 CSV 文本
    ///
    /// # 返回
    /// - Ok(ParsedCsv): 表头与数据行
    /// - Err(ImportError::CsvParse): 无法分词的输入
    pub fn parse(&self, text: &str) -> ImportResult<ParsedCsv> {
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        // 读取所有行
        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;

            // 跳过完全空白的行
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);

            // 多出的列丢弃，缺少的列不出现在行内
            let fields = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect();

            rows.push(RawRow::new(row_number, fields));
        }

        Ok(ParsedCsv { headers, rows })
    }
}

impl ParsedCsv {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
