use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::billing::{MAX_DAY_SPAN, RenewalWindow, roll_renewal};
use crate::entities::{
    PaymentStatus, PeriodStatus, package_entity as packages, payment_entity as payments,
    period_extension_entity as extensions, student_entity as students,
    subscription_period_entity as periods,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::parse_optional_date;

const DEFAULT_PAYMENT_METHOD: &str = "cash";

#[derive(Clone)]
pub struct SubscriptionService {
    pool: DatabaseConnection,
}

impl SubscriptionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 续费/新购套餐
    ///
    /// 逻辑:
    /// 1. 校验学员与套餐（套餐需启用且至少 1 节课）
    /// 2. 取该学员最近一期的结束日（未记录结束日时按课时推算）
    /// 3. 计算新周期起止日
    /// 4. 同一事务内写入新周期与一条待缴费记录（带显式周期）
    pub async fn renew(
        &self,
        staff_id: i64,
        req: RenewSubscriptionRequest,
        today: NaiveDate,
    ) -> AppResult<RenewSubscriptionResponse> {
        let start_override = parse_optional_date(req.start_date.as_deref())?;
        validate_start_date(start_override, today)?;

        let txn = self.pool.begin().await?;

        students::Entity::find_by_id(req.student_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".into()))?;

        let package = packages::Entity::find_by_id(req.package_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Package not found".into()))?;
        if !package.is_active {
            return Err(AppError::ValidationError("Package is not available".into()));
        }
        if package.session_count < 1 {
            return Err(AppError::ValidationError(
                "Package must contain at least one session".into(),
            ));
        }

        let previous_end = Self::latest_period_end(&txn, req.student_id, today).await?;
        let window = roll_renewal(previous_end, package.session_count, start_override, today);

        let period = periods::ActiveModel {
            student_id: Set(req.student_id),
            package_id: Set(package.id),
            start_date: Set(window.start),
            end_date: Set(Some(window.end)),
            total_sessions: Set(package.session_count),
            status: Set(PeriodStatus::Active),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let method = req
            .method
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
        let payment = payments::ActiveModel {
            student_id: Set(req.student_id),
            period_id: Set(period.id),
            amount_cents: Set(package.price_cents),
            method: Set(method),
            status: Set(PaymentStatus::Pending),
            paid_at: Set(None),
            period_start: Set(Some(window.start)),
            period_end: Set(Some(window.end)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "Staff {staff_id} renewed package {} for student {}: {} ~ {} (period {}, payment {})",
            package.id,
            req.student_id,
            window.start,
            window.end,
            period.id,
            payment.id
        );

        Ok(RenewSubscriptionResponse {
            period: period.into(),
            payment_id: payment.id,
            amount_cents: payment.amount_cents,
            window,
        })
    }

    /// 为某一期增加补课顺延天数
    pub async fn grant_extension(
        &self,
        staff_id: i64,
        period_id: i64,
        req: GrantExtensionRequest,
    ) -> AppResult<ExtensionResponse> {
        validate_extension_days(req.days)?;

        let txn = self.pool.begin().await?;
        periods::Entity::find_by_id(period_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription period not found".into()))?;

        let created = extensions::ActiveModel {
            period_id: Set(period_id),
            days: Set(req.days),
            reason: Set(req.reason.filter(|r| !r.trim().is_empty())),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let total: Option<i64> = extensions::Entity::find()
            .select_only()
            .column_as(Expr::col(extensions::Column::Days).sum(), "total_days")
            .filter(extensions::Column::PeriodId.eq(period_id))
            .into_tuple()
            .one(&txn)
            .await?
            .flatten();
        let total = total.unwrap_or(0);

        // 累计顺延同样受上限约束，超出时事务随 txn 析构回滚
        if total > MAX_DAY_SPAN {
            return Err(AppError::ValidationError(format!(
                "Total extension days for period {period_id} would exceed {MAX_DAY_SPAN}"
            )));
        }

        txn.commit().await?;

        log::info!(
            "Staff {staff_id} granted {} extension days to period {period_id} (total {total})",
            created.days
        );
        Ok(ExtensionResponse::from_model(created, total))
    }

    /// 最近一期（按开课日）的结束日；未记录时用同样的每周节奏推算
    async fn latest_period_end<C: ConnectionTrait>(
        conn: &C,
        student_id: i64,
        today: NaiveDate,
    ) -> AppResult<Option<NaiveDate>> {
        let latest = periods::Entity::find()
            .filter(periods::Column::StudentId.eq(student_id))
            .order_by_desc(periods::Column::StartDate)
            .order_by_desc(periods::Column::Id)
            .one(conn)
            .await?;

        Ok(latest.map(|p| {
            p.end_date.unwrap_or_else(|| {
                let RenewalWindow { end, .. } =
                    roll_renewal(None, p.total_sessions, Some(p.start_date), today);
                end
            })
        }))
    }
}

fn validate_extension_days(days: i32) -> AppResult<()> {
    if !(1..=MAX_DAY_SPAN).contains(&i64::from(days)) {
        return Err(AppError::ValidationError(format!(
            "Extension days must be between 1 and {MAX_DAY_SPAN}"
        )));
    }
    Ok(())
}

/// 指定开课日与今天的距离不得超过上限
fn validate_start_date(start: Option<NaiveDate>, today: NaiveDate) -> AppResult<()> {
    match start {
        Some(start) if (start - today).num_days().abs() > MAX_DAY_SPAN => {
            Err(AppError::ValidationError(format!(
                "start_date must be within {MAX_DAY_SPAN} days of today"
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_extension_days_bounds() {
        assert!(validate_extension_days(1).is_ok());
        assert!(validate_extension_days(MAX_DAY_SPAN as i32).is_ok());
        for days in [0, -3, MAX_DAY_SPAN as i32 + 1, i32::MAX] {
            assert!(matches!(
                validate_extension_days(days),
                Err(AppError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_start_date_bounds() {
        let today = date("2024-01-10");
        assert!(validate_start_date(None, today).is_ok());
        assert!(validate_start_date(Some(date("2024-03-01")), today).is_ok());
        assert!(validate_start_date(Some(date("2020-01-01")), today).is_ok());
        assert!(matches!(
            validate_start_date(Some(NaiveDate::MAX), today),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            validate_start_date(Some(date("9999-12-31")), today),
            Err(AppError::ValidationError(_))
        ));
    }
}
