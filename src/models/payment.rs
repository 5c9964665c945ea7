use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::billing::Urgency;
use crate::entities::{PaymentStatus, payment_entity as payments};

/// 缴费列表查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PaymentQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
    pub status: Option<PaymentStatus>,
    /// 覆盖“今天” (YYYY-MM-DD)
    pub today: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UrgentPaymentQuery {
    /// 只看某一档（red / yellow），缺省两档都返回
    pub bucket: Option<Urgency>,
    pub today: Option<String>,
}

/// 带计算结果的缴费记录
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentDueResponse {
    pub id: i64,
    pub student_id: i64,
    pub period_id: i64,
    pub amount_cents: i64,
    pub method: String,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    /// 下次缴费日
    pub due_date: Option<NaiveDate>,
    /// 套餐名义结束日（仅展示）
    pub package_end_date: Option<NaiveDate>,
    pub urgency: Option<Urgency>,
    pub days_until_due: Option<i64>,
}

impl PaymentDueResponse {
    pub fn from_model(
        m: payments::Model,
        due_date: Option<NaiveDate>,
        package_end_date: Option<NaiveDate>,
        urgency: Option<Urgency>,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            period_id: m.period_id,
            amount_cents: m.amount_cents,
            method: m.method,
            status: m.status,
            paid_at: m.paid_at,
            period_start: m.period_start,
            period_end: m.period_end,
            due_date,
            package_end_date,
            urgency,
            days_until_due: due_date.map(|d| (d - today).num_days()),
        }
    }
}

/// 标记缴清时的查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct MarkPaidQuery {
    /// 覆盖“今天” (YYYY-MM-DD)，影响返回的紧急程度
    pub today: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct MarkPaidRequest {
    /// 缺省为当前时间
    pub paid_at: Option<DateTime<Utc>>,
    pub method: Option<String>,
}

/// 无状态计算接口：直接给出字段，不查库
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct DueDateRequest {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub paid_at: Option<String>,
    pub extension_days: Option<i64>,
    pub duration_days: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub today: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DueDateResponse {
    pub today: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub package_end_date: Option<NaiveDate>,
    pub urgency: Option<Urgency>,
}
