//! 课程套餐的日期计算（纯函数，不访问数据库与系统时钟）
//!
//! - `due_date`：下次缴费日与套餐名义结束日
//! - `status`：红/黄/绿 紧急程度分类
//! - `renewal`：续费周期的起止日期
//!
//! 所有函数都显式接收 `today`，由请求边界统一构造一次。

use chrono::{Days, NaiveDate};

pub mod due_date;
pub mod renewal;
pub mod status;

pub use due_date::*;
pub use renewal::*;
pub use status::*;

/// 订阅周期 ID
pub type PeriodId = i64;

/// 套餐未知或未配置天数时的默认时长
pub const DEFAULT_DURATION_DAYS: i64 = 30;

/// 课程每周一次
pub const SESSION_INTERVAL_DAYS: i64 = 7;

/// 单次输入的天数上限（约十年）；顺延、时长与指定开课日都在边界层按此校验
pub const MAX_DAY_SPAN: i64 = 3650;

/// 日期平移，超出 `NaiveDate` 可表示范围时返回 `None`
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let span = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(span)
    } else {
        date.checked_sub_days(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_days_within_range() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        assert_eq!(shift_days(d, 3), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(shift_days(d, -27), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(shift_days(d, 0), Some(d));
    }

    #[test]
    fn test_shift_days_out_of_range() {
        assert_eq!(shift_days(NaiveDate::MAX, 1), None);
        assert_eq!(shift_days(NaiveDate::MIN, -1), None);
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(shift_days(d, i64::MAX), None);
        assert_eq!(shift_days(d, i64::MIN), None);
    }
}
