use crate::config::BillingConfig;
use crate::middlewares::StaffId;
use crate::models::*;
use crate::services::SubscriptionService;
use crate::utils::resolve_today;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};

fn get_staff_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<StaffId>().map(|s| s.0)
}

#[utoipa::path(
    post,
    path = "/admin/subscriptions/renew",
    tag = "subscription",
    request_body = RenewSubscriptionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "续费成功，生成新周期与待缴费记录", body = RenewSubscriptionResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "学员或套餐不存在"),
        (status = 401, description = "未授权")
    )
)]
/// 续费/新购套餐：
/// 1. 有指定开课日则直接使用
/// 2. 否则从上期结束日顺延一周
/// 3. 没有历史记录则从今天开始
pub async fn renew_subscription(
    service: web::Data<SubscriptionService>,
    billing: web::Data<BillingConfig>,
    req: HttpRequest,
    request: web::Json<RenewSubscriptionRequest>,
) -> Result<HttpResponse> {
    let staff_id = get_staff_id_from_request(&req).unwrap_or(0);
    let request = request.into_inner();
    let today = match resolve_today(request.today.as_deref(), billing.utc_offset_hours) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    match service.renew(staff_id, request, today).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/subscriptions/{id}/extensions",
    tag = "subscription",
    params(("id" = i64, Path, description = "订阅周期ID")),
    request_body = GrantExtensionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "补课顺延已记录", body = ExtensionResponse),
        (status = 400, description = "天数无效"),
        (status = 404, description = "订阅周期不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn grant_extension(
    service: web::Data<SubscriptionService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<GrantExtensionRequest>,
) -> Result<HttpResponse> {
    let staff_id = get_staff_id_from_request(&req).unwrap_or(0);
    match service
        .grant_extension(staff_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/subscriptions")
            .route("/renew", web::post().to(renew_subscription))
            .route("/{id}/extensions", web::post().to(grant_extension)),
    );
}
