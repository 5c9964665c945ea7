use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::student_entity as students;
use crate::error::{AppError, AppResult};
use crate::external::{SmsService, payment_reminder_body};
use crate::models::ReminderSummary;
use crate::services::PaymentService;
use crate::utils::normalize_phone;

#[derive(Clone)]
pub struct ReminderService {
    pool: DatabaseConnection,
    payment_service: PaymentService,
    sms_service: SmsService,
}

impl ReminderService {
    pub fn new(
        pool: DatabaseConnection,
        payment_service: PaymentService,
        sms_service: SmsService,
    ) -> Self {
        Self {
            pool,
            payment_service,
            sms_service,
        }
    }

    /// 给逾期/即将到期的学员发送缴费提醒，每位学员每批次最多一条（取最早到期的一笔）。
    /// 单条发送失败只计数，不中断整批。
    pub async fn send_due_reminders(&self, today: NaiveDate) -> AppResult<ReminderSummary> {
        if !self.sms_service.is_enabled() {
            return Err(AppError::ExternalApiError(
                "SMS gateway is not configured".into(),
            ));
        }

        let urgent = self.payment_service.urgent(None, today).await?;
        if urgent.is_empty() {
            return Ok(ReminderSummary::default());
        }

        let student_ids: HashSet<i64> = urgent.iter().map(|p| p.student_id).collect();
        let student_rows: HashMap<i64, students::Model> = students::Entity::find()
            .filter(students::Column::Id.is_in(student_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let mut summary = ReminderSummary::default();
        let mut notified = HashSet::new();

        for payment in urgent {
            if !notified.insert(payment.student_id) {
                continue;
            }
            let (Some(due_date), Some(urgency)) = (payment.due_date, payment.urgency) else {
                continue;
            };
            let Some(student) = student_rows.get(&payment.student_id) else {
                summary.skipped += 1;
                continue;
            };
            let Some(phone) = student.phone.as_deref().and_then(normalize_phone) else {
                log::debug!("Student {} has no valid phone, skip reminder", student.id);
                summary.skipped += 1;
                continue;
            };

            let body = payment_reminder_body(&student.name, due_date, urgency);
            match self.sms_service.send(&phone, &body).await {
                Ok(_) => {
                    log::debug!(
                        "Sent {urgency} reminder for payment {} to student {}",
                        payment.id,
                        student.id
                    );
                    summary.sent += 1;
                }
                Err(e) => {
                    log::error!(
                        "Failed to send reminder for payment {} to student {}: {e:?}",
                        payment.id,
                        student.id
                    );
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
