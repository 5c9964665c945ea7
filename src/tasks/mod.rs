//! Background scheduled tasks for the application.
//!
//! Currently a single job: the payment reminder batch. Call `spawn_all` once during startup.

use crate::config::BillingConfig;
use crate::services::ReminderService;
use crate::utils::today_in;

/// Spawn all background tasks.
///
/// The reminder loop computes "today" once per run in the configured business timezone.
/// Disabled unless `billing.reminders_enabled` is set.
pub fn spawn_all(reminder_service: ReminderService, billing: BillingConfig) {
    if !billing.reminders_enabled {
        log::info!("Payment reminders disabled, background job not started");
        return;
    }

    // 缴费提醒（默认每 24 小时）
    let interval_secs = billing.reminder_interval_hours.max(1) * 3600;
    tokio::spawn(async move {
        loop {
            let today = today_in(billing.utc_offset_hours);
            match reminder_service.send_due_reminders(today).await {
                Ok(s) if s.sent + s.failed > 0 => log::info!(
                    "Payment reminders for {today}: sent={} failed={} skipped={}",
                    s.sent,
                    s.failed,
                    s.skipped
                ),
                Ok(_) => {}
                Err(e) => log::error!("Failed to send payment reminders: {e:?}"),
            }
            tokio::time::sleep(std::time::Duration::from_secs(interval_secs)).await;
        }
    });
}
