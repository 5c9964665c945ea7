//! 边界层日期处理：ISO-8601 字符串解析与业务时区下的“今天”

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::error::{AppError, AppResult};

/// 解析 `YYYY-MM-DD`、RFC 3339 或不带时区的日期时间，只保留日期部分。
///
/// 带时区的时间取其书写时的本地日期，不做时区换算。
pub fn parse_iso_date(input: &str) -> AppResult<NaiveDate> {
    let s = input.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(AppError::ValidationError(format!(
        "Invalid date '{input}', expected ISO-8601 (YYYY-MM-DD)"
    )))
}

pub fn parse_optional_date(input: Option<&str>) -> AppResult<Option<NaiveDate>> {
    input
        .filter(|s| !s.trim().is_empty())
        .map(parse_iso_date)
        .transpose()
}

/// 超出范围的偏移按 UTC 处理
pub fn business_offset(utc_offset_hours: i32) -> FixedOffset {
    utc_offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

pub fn to_business_date(ts: DateTime<Utc>, utc_offset_hours: i32) -> NaiveDate {
    ts.with_timezone(&business_offset(utc_offset_hours))
        .date_naive()
}

/// 每个请求只调用一次，结果作为 `today` 传给计算函数
pub fn today_in(utc_offset_hours: i32) -> NaiveDate {
    to_business_date(Utc::now(), utc_offset_hours)
}

/// 请求可通过 `today` 参数覆盖当前日期（便于核对历史数据）
pub fn resolve_today(requested: Option<&str>, utc_offset_hours: i32) -> AppResult<NaiveDate> {
    Ok(parse_optional_date(requested)?.unwrap_or_else(|| today_in(utc_offset_hours)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_iso_date_formats() {
        assert_eq!(parse_iso_date("2024-01-31").unwrap(), date("2024-01-31"));
        assert_eq!(parse_iso_date(" 2024-01-31 ").unwrap(), date("2024-01-31"));
        assert_eq!(
            parse_iso_date("2024-01-31T23:30:00+08:00").unwrap(),
            date("2024-01-31")
        );
        assert_eq!(
            parse_iso_date("2024-01-31T23:30:00.123Z").unwrap(),
            date("2024-01-31")
        );
        assert_eq!(
            parse_iso_date("2024-01-31T08:00:00").unwrap(),
            date("2024-01-31")
        );
        assert_eq!(
            parse_iso_date("2024-01-31 08:00:00").unwrap(),
            date("2024-01-31")
        );
    }

    #[test]
    fn test_parse_iso_date_rejects_garbage() {
        assert!(parse_iso_date("31/01/2024").is_err());
        assert!(parse_iso_date("2024-02-30").is_err());
        assert!(parse_iso_date("").is_err());
    }

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert_eq!(parse_optional_date(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_optional_date(Some("2024-06-01")).unwrap(),
            Some(date("2024-06-01"))
        );
        assert!(parse_optional_date(Some("nope")).is_err());
    }

    #[test]
    fn test_to_business_date_crosses_midnight() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 31, 18, 0, 0).unwrap();
        assert_eq!(to_business_date(ts, 0), date("2024-01-31"));
        assert_eq!(to_business_date(ts, 8), date("2024-02-01"));
        assert_eq!(to_business_date(ts, -20), date("2024-01-30"));
        // 非法偏移回落到 UTC
        assert_eq!(to_business_date(ts, 99), date("2024-01-31"));
    }

    #[test]
    fn test_business_offset_extreme_values() {
        assert_eq!(business_offset(i32::MAX), Utc.fix());
        assert_eq!(business_offset(i32::MIN), Utc.fix());
        assert_eq!(business_offset(-12).local_minus_utc(), -12 * 3600);
    }

    #[test]
    fn test_resolve_today_override() {
        assert_eq!(
            resolve_today(Some("2024-01-10"), 8).unwrap(),
            date("2024-01-10")
        );
    }
}
