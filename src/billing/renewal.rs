use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{SESSION_INTERVAL_DAYS, shift_days};

/// 新订阅周期的起止日期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RenewalWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// 续费/新购套餐时计算新周期。
///
/// 开始日：显式指定 > 上期结束日后一周 > 今天。
/// 结束日：每周一节课，N 节课跨 N-1 周；`session_count <= 0` 时结束日等于开始日
/// （参数合法性由上层校验）。
///
/// 超出日期上限时截断到 `NaiveDate::MAX`，保证 `end >= start`。
pub fn roll_renewal(
    previous_end: Option<NaiveDate>,
    session_count: i32,
    start_override: Option<NaiveDate>,
    today: NaiveDate,
) -> RenewalWindow {
    let start = start_override
        .or_else(|| previous_end.map(|end| clamped_shift(end, SESSION_INTERVAL_DAYS)))
        .unwrap_or(today);

    let intervals = i64::from(session_count.max(1) - 1);
    let end = clamped_shift(start, intervals * SESSION_INTERVAL_DAYS);

    RenewalWindow { start, end }
}

fn clamped_shift(date: NaiveDate, days: i64) -> NaiveDate {
    shift_days(date, days).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_roll_with_history() {
        let w = roll_renewal(Some(date("2024-03-01")), 4, None, date("2024-01-01"));
        assert_eq!(w.start, date("2024-03-08"));
        assert_eq!(w.end, date("2024-03-29"));
    }

    #[test]
    fn test_roll_without_history() {
        let w = roll_renewal(None, 1, None, date("2024-06-01"));
        assert_eq!(w.start, date("2024-06-01"));
        assert_eq!(w.end, date("2024-06-01"));
    }

    #[test]
    fn test_override_wins() {
        let w = roll_renewal(
            Some(date("2024-03-01")),
            8,
            Some(date("2024-04-02")),
            date("2024-01-01"),
        );
        assert_eq!(w.start, date("2024-04-02"));
        assert_eq!(w.end, date("2024-05-21"));
    }

    #[test]
    fn test_degenerate_session_count() {
        for n in [0, -3] {
            let w = roll_renewal(None, n, None, date("2024-06-01"));
            assert_eq!(w.start, w.end);
        }
    }

    #[test]
    fn test_end_never_before_start() {
        for n in 1..=52 {
            let w = roll_renewal(Some(date("2024-12-20")), n, None, date("2024-01-01"));
            assert!(w.end >= w.start);
            assert_eq!((w.end - w.start).num_days(), i64::from(n - 1) * 7);
        }
    }

    #[test]
    fn test_repeated_calls_are_stable() {
        let a = roll_renewal(Some(date("2024-02-26")), 12, None, date("2024-02-01"));
        let b = roll_renewal(Some(date("2024-02-26")), 12, None, date("2024-02-01"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_clamps_at_date_limit() {
        let w = roll_renewal(None, 52, Some(NaiveDate::MAX), date("2024-01-01"));
        assert_eq!(w.start, NaiveDate::MAX);
        assert_eq!(w.end, NaiveDate::MAX);

        let w = roll_renewal(Some(NaiveDate::MAX), 4, None, date("2024-01-01"));
        assert_eq!(w.start, NaiveDate::MAX);
        assert!(w.end >= w.start);

        let near = NaiveDate::MAX.checked_sub_days(chrono::Days::new(10)).unwrap();
        let w = roll_renewal(None, i32::MAX, Some(near), date("2024-01-01"));
        assert_eq!(w.start, near);
        assert_eq!(w.end, NaiveDate::MAX);
    }

    #[test]
    fn test_huge_session_count_is_clamped() {
        let w = roll_renewal(None, i32::MAX, None, date("2024-01-01"));
        assert_eq!(w.start, date("2024-01-01"));
        assert_eq!(w.end, NaiveDate::MAX);
    }
}
