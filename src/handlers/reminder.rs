use crate::config::BillingConfig;
use crate::models::*;
use crate::services::ReminderService;
use crate::utils::resolve_today;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/admin/reminders/send",
    tag = "reminder",
    params(
        ("today" = Option<String>, Query, description = "覆盖当前日期 (YYYY-MM-DD)")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "提醒批次完成", body = ReminderSummary),
        (status = 502, description = "短信网关不可用"),
        (status = 401, description = "未授权")
    )
)]
/// 立即给逾期/即将到期的学员发送缴费提醒短信
pub async fn send_reminders(
    service: web::Data<ReminderService>,
    billing: web::Data<BillingConfig>,
    query: web::Query<ReminderQuery>,
) -> Result<HttpResponse> {
    let today = match resolve_today(query.today.as_deref(), billing.utc_offset_hours) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    match service.send_due_reminders(today).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            summary,
            "缴费提醒已发送",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn reminder_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/reminders").route("/send", web::post().to(send_reminders)));
}
