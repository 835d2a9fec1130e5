// ==========================================
// Tover - 字段清洗器
// ==========================================
// 职责: TRIM / 空值缺省 / 数值与日期解析 / 币种标准化
// 约定: 解析失败返回 None，由行校验器决定错误文案
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// 无时区时间戳格式（按 UTC 解释）
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// 纯日期格式（按 UTC 零点解释）
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

pub struct FieldCleaner;

impl FieldCleaner {
    /// TRIM；缺列视为空串
    pub fn clean_text(&self, value: Option<&str>) -> String {
        value.map(str::trim).unwrap_or("").to_string()
    }

    /// 空值标准化（空串 → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 空值时使用缺省文本
    pub fn text_or_default(&self, value: Option<&str>, default: &str) -> String {
        self.normalize_null(value)
            .unwrap_or_else(|| default.to_string())
    }

    /// 解析有限浮点数（拒绝 NaN / inf）
    pub fn parse_number(&self, value: Option<&str>) -> Option<f64> {
        let v = value?.trim();
        if v.is_empty() {
            return None;
        }
        v.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// 解析数值；空值取缺省
    pub fn parse_number_or(&self, value: Option<&str>, default: f64) -> Option<f64> {
        match self.normalize_null(value) {
            None => Some(default),
            Some(v) => self.parse_number(Some(&v)),
        }
    }

    /// 解析非负数值
    pub fn parse_non_negative(&self, value: Option<&str>) -> Option<f64> {
        self.parse_number(value).filter(|n| *n >= 0.0)
    }

    /// 解析非负数值；空值取 0
    pub fn parse_non_negative_or_zero(&self, value: Option<&str>) -> Option<f64> {
        self.parse_number_or(value, 0.0).filter(|n| *n >= 0.0)
    }

    /// 解析正整数（严格：不接受小数与尾随字符）
    pub fn parse_positive_int(&self, value: Option<&str>) -> Option<i64> {
        let v = value?.trim();
        v.parse::<i64>().ok().filter(|n| *n > 0)
    }

    /// 解析时间戳并统一到 UTC
    ///
    /// 支持 RFC 3339、无时区日期时间（按 UTC）、纯日期（UTC 零点）
    pub fn parse_timestamp(&self, value: &str) -> Option<DateTime<Utc>> {
        let v = value.trim();
        if v.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
            return Some(dt.with_timezone(&Utc));
        }

        for fmt in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(v, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        self.parse_plain_date(v)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    /// 解析日期；带时间的输入取其 UTC 日期
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let v = value.trim();
        self.parse_plain_date(v)
            .or_else(|| self.parse_timestamp(v).map(|dt| dt.date_naive()))
    }

    fn parse_plain_date(&self, v: &str) -> Option<NaiveDate> {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
    }

    /// 币种标准化：TRIM + UPPER，必须恰好 3 个字母
    ///
    /// # 返回
    /// - Ok(code): 标准化后的币种
    /// - Err(None): 空值
    /// - Err(Some(v)): 非 3 位字母
    pub fn normalize_currency(&self, value: Option<&str>) -> Result<String, Option<String>> {
        let upper = self.clean_text(value).to_uppercase();
        if upper.is_empty() {
            return Err(None);
        }
        if upper.len() == 3 && upper.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(upper)
        } else {
            Err(Some(upper))
        }
    }
}
