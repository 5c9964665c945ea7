use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ReminderQuery {
    pub today: Option<String>,
}

/// 一次提醒批次的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReminderSummary {
    pub sent: u32,
    pub failed: u32,
    /// 无手机号或号码无效
    pub skipped: u32,
}
