use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::billing::{
    DueRecord, MAX_DAY_SPAN, PackageMeta, PeriodId, PeriodLookups, Urgency, classify,
    next_due_date, package_end_date,
};
use crate::entities::{
    PaymentStatus, package_entity as packages, payment_entity as payments,
    period_extension_entity as extensions, subscription_period_entity as periods,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{parse_optional_date, to_business_date};

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    utc_offset_hours: i32,
}

impl PaymentService {
    pub fn new(pool: DatabaseConnection, utc_offset_hours: i32) -> Self {
        Self {
            pool,
            utc_offset_hours,
        }
    }

    /// 分页列出缴费记录，并附上到期日与紧急程度
    pub async fn list_due(
        &self,
        query: &PaymentQuery,
        today: NaiveDate,
    ) -> AppResult<PaginatedResponse<PaymentDueResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base = payments::Entity::find();
        if let Some(status) = &query.status {
            base = base.filter(payments::Column::Status.eq(status.clone()));
        }

        let total = base.clone().count(&self.pool).await? as i64;

        let rows = base
            .order_by_desc(payments::Column::CreatedAt)
            .order_by_desc(payments::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let data = self.evaluate(rows, today).await;
        Ok(PaginatedResponse::new(data, &params, total))
    }

    /// 未缴清且已逾期/即将到期的记录，按到期日升序
    pub async fn urgent(
        &self,
        bucket: Option<Urgency>,
        today: NaiveDate,
    ) -> AppResult<Vec<PaymentDueResponse>> {
        let rows = payments::Entity::find()
            .filter(payments::Column::Status.ne(PaymentStatus::Paid))
            .all(&self.pool)
            .await?;

        let mut items: Vec<PaymentDueResponse> = self
            .evaluate(rows, today)
            .await
            .into_iter()
            .filter(|p| match (p.urgency, bucket) {
                (Some(u), Some(wanted)) => u == wanted,
                (Some(u), None) => u.is_urgent(),
                (None, _) => false,
            })
            .collect();

        items.sort_by_key(|p| (p.due_date, p.id));
        Ok(items)
    }

    /// 标记已缴费；重复调用直接返回当前状态
    pub async fn mark_paid(
        &self,
        staff_id: i64,
        payment_id: i64,
        req: MarkPaidRequest,
        today: NaiveDate,
    ) -> AppResult<PaymentDueResponse> {
        let payment = payments::Entity::find_by_id(payment_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

        let payment = if payment.status == PaymentStatus::Paid {
            payment
        } else {
            let mut am = payment.into_active_model();
            am.status = Set(PaymentStatus::Paid);
            am.paid_at = Set(Some(req.paid_at.unwrap_or_else(Utc::now)));
            if let Some(method) = req.method.filter(|m| !m.trim().is_empty()) {
                am.method = Set(method);
            }
            am.updated_at = Set(Some(Utc::now()));
            let updated = am.update(&self.pool).await?;
            log::info!("Payment {payment_id} marked as paid by staff {staff_id}");
            updated
        };

        self.evaluate(vec![payment], today)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InternalError("Payment evaluation failed".into()))
    }

    /// 不查库的到期日计算，供后台表单预览
    pub fn calculate(req: &DueDateRequest, today: NaiveDate) -> AppResult<DueDateResponse> {
        if req
            .extension_days
            .is_some_and(|d| !(0..=MAX_DAY_SPAN).contains(&d))
        {
            return Err(AppError::ValidationError(format!(
                "extension_days must be between 0 and {MAX_DAY_SPAN}"
            )));
        }
        if req
            .duration_days
            .is_some_and(|d| !(1..=MAX_DAY_SPAN).contains(&d))
        {
            return Err(AppError::ValidationError(format!(
                "duration_days must be between 1 and {MAX_DAY_SPAN}"
            )));
        }

        let record = DueRecord {
            period_id: 0,
            period_start: parse_optional_date(req.period_start.as_deref())?,
            period_end: parse_optional_date(req.period_end.as_deref())?,
            paid_at: parse_optional_date(req.paid_at.as_deref())?,
            status: req.status.clone().unwrap_or(PaymentStatus::Pending),
        };

        let mut lookups = PeriodLookups::default();
        if let Some(days) = req.extension_days {
            lookups.extension_days.insert(0, days);
        }
        if req.duration_days.is_some() {
            lookups.package_meta.insert(
                0,
                PackageMeta {
                    duration_days: req.duration_days,
                },
            );
        }

        let due_date = next_due_date(&record, &lookups);
        Ok(DueDateResponse {
            today,
            due_date,
            package_end_date: package_end_date(&record, &lookups),
            urgency: classify(due_date, today, &record.status),
        })
    }

    /// 批量预取旁表。查询失败时退化为空表（0 天顺延 / 30 天默认时长）
    pub async fn lookups_for(&self, period_ids: &[PeriodId]) -> PeriodLookups {
        if period_ids.is_empty() {
            return PeriodLookups::default();
        }

        let extension_days = match self.fetch_extension_days(period_ids).await {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Failed to load extension days, using defaults: {e:?}");
                HashMap::new()
            }
        };
        let package_meta = match self.fetch_package_meta(period_ids).await {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Failed to load package meta, using defaults: {e:?}");
                HashMap::new()
            }
        };

        PeriodLookups::new(extension_days, package_meta)
    }

    async fn fetch_extension_days(
        &self,
        period_ids: &[PeriodId],
    ) -> AppResult<HashMap<PeriodId, i64>> {
        let rows: Vec<(i64, Option<i64>)> = extensions::Entity::find()
            .select_only()
            .column(extensions::Column::PeriodId)
            .column_as(Expr::col(extensions::Column::Days).sum(), "total_days")
            .filter(extensions::Column::PeriodId.is_in(period_ids.iter().copied()))
            .group_by(extensions::Column::PeriodId)
            .into_tuple()
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(period_id, total)| (period_id, total.unwrap_or(0)))
            .collect())
    }

    async fn fetch_package_meta(
        &self,
        period_ids: &[PeriodId],
    ) -> AppResult<HashMap<PeriodId, PackageMeta>> {
        let period_rows = periods::Entity::find()
            .filter(periods::Column::Id.is_in(period_ids.iter().copied()))
            .all(&self.pool)
            .await?;

        let package_ids: BTreeSet<i64> = period_rows.iter().map(|p| p.package_id).collect();
        if package_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let package_rows: HashMap<i64, packages::Model> = packages::Entity::find()
            .filter(packages::Column::Id.is_in(package_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(period_rows
            .into_iter()
            .filter_map(|period| {
                package_rows
                    .get(&period.package_id)
                    .map(|pkg| (period.id, pkg.meta()))
            })
            .collect())
    }

    async fn evaluate(
        &self,
        rows: Vec<payments::Model>,
        today: NaiveDate,
    ) -> Vec<PaymentDueResponse> {
        let period_ids: Vec<PeriodId> = rows
            .iter()
            .map(|p| p.period_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let lookups = self.lookups_for(&period_ids).await;

        rows.into_iter()
            .map(|m| {
                let record = self.due_record(&m);
                let due_date = next_due_date(&record, &lookups);
                let package_end = package_end_date(&record, &lookups);
                let urgency = classify(due_date, today, &m.status);
                PaymentDueResponse::from_model(m, due_date, package_end, urgency, today)
            })
            .collect()
    }

    fn due_record(&self, m: &payments::Model) -> DueRecord {
        DueRecord {
            period_id: m.period_id,
            period_start: m.period_start,
            period_end: m.period_end,
            paid_at: m
                .paid_at
                .map(|ts| to_business_date(ts, self.utc_offset_hours)),
            status: m.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_calculate_default_duration() {
        let req = DueDateRequest {
            paid_at: Some("2024-01-01T10:00:00+08:00".into()),
            ..Default::default()
        };
        let resp = PaymentService::calculate(&req, date("2024-01-25")).unwrap();
        assert_eq!(resp.due_date, Some(date("2024-01-31")));
        assert_eq!(resp.urgency, Some(Urgency::Yellow));
        assert_eq!(resp.package_end_date, None);
    }

    #[test]
    fn test_calculate_period_end_with_extension() {
        let req = DueDateRequest {
            period_start: Some("2024-01-01".into()),
            period_end: Some("2024-03-01".into()),
            paid_at: Some("2023-06-01".into()),
            extension_days: Some(7),
            duration_days: Some(56),
            ..Default::default()
        };
        let resp = PaymentService::calculate(&req, date("2024-01-10")).unwrap();
        assert_eq!(resp.due_date, Some(date("2024-03-08")));
        assert_eq!(resp.package_end_date, Some(date("2024-03-04")));
        assert_eq!(resp.urgency, Some(Urgency::Green));
    }

    #[test]
    fn test_calculate_paid_is_unclassified() {
        let req = DueDateRequest {
            period_end: Some("2024-01-01".into()),
            status: Some(PaymentStatus::Paid),
            ..Default::default()
        };
        let resp = PaymentService::calculate(&req, date("2024-01-10")).unwrap();
        assert_eq!(resp.due_date, Some(date("2024-01-01")));
        assert_eq!(resp.urgency, None);
    }

    #[test]
    fn test_calculate_validation() {
        let today = date("2024-01-10");
        let negative = DueDateRequest {
            extension_days: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            PaymentService::calculate(&negative, today),
            Err(AppError::ValidationError(_))
        ));

        let bad_date = DueDateRequest {
            period_end: Some("2024-13-01".into()),
            ..Default::default()
        };
        assert!(PaymentService::calculate(&bad_date, today).is_err());

        let empty = PaymentService::calculate(&DueDateRequest::default(), today).unwrap();
        assert_eq!(empty.due_date, None);
        assert_eq!(empty.urgency, None);
    }

    #[test]
    fn test_calculate_rejects_oversized_day_counts() {
        let today = date("2024-01-10");
        let huge_extension = DueDateRequest {
            period_end: Some("2024-01-01".into()),
            extension_days: Some(1_000_000_000),
            ..Default::default()
        };
        assert!(matches!(
            PaymentService::calculate(&huge_extension, today),
            Err(AppError::ValidationError(_))
        ));

        let huge_duration = DueDateRequest {
            paid_at: Some("2024-01-01".into()),
            duration_days: Some(i64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            PaymentService::calculate(&huge_duration, today),
            Err(AppError::ValidationError(_))
        ));

        let at_limit = DueDateRequest {
            paid_at: Some("2024-01-01".into()),
            duration_days: Some(MAX_DAY_SPAN),
            extension_days: Some(MAX_DAY_SPAN),
            ..Default::default()
        };
        let resp = PaymentService::calculate(&at_limit, today).unwrap();
        assert_eq!(resp.due_date, Some(date("2043-12-27")));
        assert_eq!(resp.urgency, Some(Urgency::Green));
    }
}
