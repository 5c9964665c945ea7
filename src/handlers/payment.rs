use crate::config::BillingConfig;
use crate::middlewares::StaffId;
use crate::models::*;
use crate::services::PaymentService;
use crate::utils::resolve_today;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};

fn get_staff_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<StaffId>().map(|s| s.0)
}

#[utoipa::path(
    get,
    path = "/admin/payments",
    tag = "payment",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)"),
        ("status" = Option<String>, Query, description = "paid / pending / failed / refunded"),
        ("today" = Option<String>, Query, description = "覆盖当前日期 (YYYY-MM-DD)")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取缴费列表成功", body = PaginatedResponse<PaymentDueResponse>),
        (status = 400, description = "请求参数错误"),
        (status = 401, description = "未授权")
    )
)]
/// 缴费列表（附下次缴费日与红/黄/绿状态）
pub async fn list_payments(
    service: web::Data<PaymentService>,
    billing: web::Data<BillingConfig>,
    query: web::Query<PaymentQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let today = match resolve_today(query.today.as_deref(), billing.utc_offset_hours) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_due(&query, today).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/payments/urgent",
    tag = "payment",
    params(
        ("bucket" = Option<String>, Query, description = "red / yellow / green，缺省返回 red + yellow"),
        ("today" = Option<String>, Query, description = "覆盖当前日期 (YYYY-MM-DD)")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取待催缴列表成功", body = [PaymentDueResponse]),
        (status = 401, description = "未授权")
    )
)]
/// 逾期与 7 天内到期的未缴费记录，按到期日升序
pub async fn list_urgent_payments(
    service: web::Data<PaymentService>,
    billing: web::Data<BillingConfig>,
    query: web::Query<UrgentPaymentQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let today = match resolve_today(query.today.as_deref(), billing.utc_offset_hours) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    match service.urgent(query.bucket, today).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/payments/{id}/mark-paid",
    tag = "payment",
    params(
        ("id" = i64, Path, description = "缴费记录ID"),
        ("today" = Option<String>, Query, description = "覆盖当前日期 (YYYY-MM-DD)")
    ),
    request_body = MarkPaidRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已标记为缴清", body = PaymentDueResponse),
        (status = 404, description = "缴费记录不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn mark_paid(
    service: web::Data<PaymentService>,
    billing: web::Data<BillingConfig>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<MarkPaidQuery>,
    request: Option<web::Json<MarkPaidRequest>>,
) -> Result<HttpResponse> {
    let staff_id = get_staff_id_from_request(&req).unwrap_or(0);
    let today = match resolve_today(query.today.as_deref(), billing.utc_offset_hours) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    match service
        .mark_paid(staff_id, path.into_inner(), request, today)
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/billing/due-date",
    tag = "payment",
    request_body = DueDateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "计算成功", body = DueDateResponse),
        (status = 400, description = "请求参数错误")
    )
)]
/// 按给定字段预览下次缴费日与状态（不读写数据库）
pub async fn calculate_due_date(
    billing: web::Data<BillingConfig>,
    request: web::Json<DueDateRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let result = resolve_today(request.today.as_deref(), billing.utc_offset_hours)
        .and_then(|today| PaymentService::calculate(&request, today));
    match result {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("", web::get().to(list_payments))
            .route("/urgent", web::get().to(list_urgent_payments))
            .route("/{id}/mark-paid", web::post().to(mark_paid)),
    )
    .route("/billing/due-date", web::post().to(calculate_due_date));
}
