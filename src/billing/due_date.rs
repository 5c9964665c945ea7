use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DEFAULT_DURATION_DAYS, PeriodId, shift_days};
use crate::entities::PaymentStatus;

/// 套餐元数据（按订阅周期批量查询得到）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PackageMeta {
    pub duration_days: Option<i64>,
}

/// 按订阅周期 ID 预取的两张旁表。
///
/// 缺失的键一律回落到默认值：补课天数为 0，套餐时长为 30 天。
/// 批量查询失败时调用方传入空表即可。
#[derive(Debug, Clone, Default)]
pub struct PeriodLookups {
    pub extension_days: HashMap<PeriodId, i64>,
    pub package_meta: HashMap<PeriodId, PackageMeta>,
}

impl PeriodLookups {
    pub fn new(
        extension_days: HashMap<PeriodId, i64>,
        package_meta: HashMap<PeriodId, PackageMeta>,
    ) -> Self {
        Self {
            extension_days,
            package_meta,
        }
    }

    /// 补课天数只会累加，负值按 0 处理
    pub fn extension_days_for(&self, period_id: PeriodId) -> i64 {
        self.extension_days
            .get(&period_id)
            .copied()
            .unwrap_or(0)
            .max(0)
    }

    pub fn duration_days_for(&self, period_id: PeriodId) -> i64 {
        self.configured_duration_days(period_id)
            .unwrap_or(DEFAULT_DURATION_DAYS)
    }

    fn configured_duration_days(&self, period_id: PeriodId) -> Option<i64> {
        self.package_meta
            .get(&period_id)
            .and_then(|m| m.duration_days)
    }
}

/// 计算所需的缴费记录字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueRecord {
    pub period_id: PeriodId,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub paid_at: Option<NaiveDate>,
    pub status: PaymentStatus,
}

/// 下次缴费日。
///
/// `period_end` 存在时以它为准（忽略 `paid_at` 与套餐时长）；
/// 否则用 `paid_at + 套餐天数`；两者都没有时返回 `None`。
/// 补课天数在两种情况下都叠加。结果超出可表示的日期范围时同样返回 `None`。
pub fn next_due_date(record: &DueRecord, lookups: &PeriodLookups) -> Option<NaiveDate> {
    let extension = lookups.extension_days_for(record.period_id);

    let base = match (record.period_end, record.paid_at) {
        (Some(end), _) => end,
        (None, Some(paid_at)) => {
            shift_days(paid_at, lookups.duration_days_for(record.period_id))?
        }
        (None, None) => return None,
    };
    shift_days(base, extension)
}

/// 套餐名义结束日，仅用于展示，不参与紧急程度分类。
///
/// 不看 `period_end`；开始日或套餐天数缺失时返回 `None`（此处没有 30 天默认值）。
pub fn package_end_date(record: &DueRecord, lookups: &PeriodLookups) -> Option<NaiveDate> {
    let start = record.period_start?;
    let duration = lookups.configured_duration_days(record.period_id)?;
    let end = shift_days(start, duration)?;
    shift_days(end, lookups.extension_days_for(record.period_id))
}
