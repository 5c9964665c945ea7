use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::billing::RenewalWindow;
use crate::entities::{
    PeriodStatus, period_extension_entity as extensions, subscription_period_entity as periods,
};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RenewSubscriptionRequest {
    pub student_id: i64,
    pub package_id: i64,
    /// 显式指定开课日 (YYYY-MM-DD)，缺省按上期结束日推算
    pub start_date: Option<String>,
    /// 缴费方式，默认 "cash"
    pub method: Option<String>,
    pub today: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionPeriodResponse {
    pub id: i64,
    pub student_id: i64,
    pub package_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub total_sessions: i32,
    pub status: PeriodStatus,
    pub created_at: DateTime<Utc>,
}

impl From<periods::Model> for SubscriptionPeriodResponse {
    fn from(m: periods::Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            package_id: m.package_id,
            start_date: m.start_date,
            end_date: m.end_date,
            total_sessions: m.total_sessions,
            status: m.status,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenewSubscriptionResponse {
    pub period: SubscriptionPeriodResponse,
    pub payment_id: i64,
    pub amount_cents: i64,
    pub window: RenewalWindow,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct GrantExtensionRequest {
    /// 顺延天数，1 ~ 3650 天
    pub days: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExtensionResponse {
    pub id: i64,
    pub period_id: i64,
    pub days: i32,
    pub reason: Option<String>,
    /// 该期累计顺延天数
    pub total_extension_days: i64,
}

impl ExtensionResponse {
    pub fn from_model(m: extensions::Model, total_extension_days: i64) -> Self {
        Self {
            id: m.id,
            period_id: m.period_id,
            days: m.days,
            reason: m.reason,
            total_extension_days,
        }
    }
}
