use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::PaymentStatus;

/// 距到期日不超过该天数（含）视为即将到期
pub const DUE_SOON_WINDOW_DAYS: i64 = 7;

/// 缴费紧急程度，仅用于后台列表排序与着色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// 已逾期
    Red,
    /// 7 天内到期（含当天）
    Yellow,
    Green,
}

impl Urgency {
    pub fn is_urgent(self) -> bool {
        matches!(self, Urgency::Red | Urgency::Yellow)
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Red => write!(f, "red"),
            Urgency::Yellow => write!(f, "yellow"),
            Urgency::Green => write!(f, "green"),
        }
    }
}

/// 已缴清或没有到期日的记录不分类。
pub fn classify(
    due_date: Option<NaiveDate>,
    today: NaiveDate,
    status: &PaymentStatus,
) -> Option<Urgency> {
    if *status == PaymentStatus::Paid {
        return None;
    }
    let days_until_due = (due_date? - today).num_days();
    Some(if days_until_due < 0 {
        Urgency::Red
    } else if days_until_due <= DUE_SOON_WINDOW_DAYS {
        Urgency::Yellow
    } else {
        Urgency::Green
    })
}
