use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::billing::{PackageMeta, RenewalWindow, Urgency};
use crate::entities::{PaymentStatus, PeriodStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::payment::list_payments,
        handlers::payment::list_urgent_payments,
        handlers::payment::mark_paid,
        handlers::payment::calculate_due_date,
        handlers::subscription::renew_subscription,
        handlers::subscription::grant_extension,
        handlers::reminder::send_reminders,
    ),
    components(
        schemas(
            PaymentStatus,
            PeriodStatus,
            Urgency,
            PackageMeta,
            RenewalWindow,
            PaymentDueResponse,
            MarkPaidRequest,
            MarkPaidQuery,
            DueDateRequest,
            DueDateResponse,
            RenewSubscriptionRequest,
            RenewSubscriptionResponse,
            SubscriptionPeriodResponse,
            GrantExtensionRequest,
            ExtensionResponse,
            ReminderSummary,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "payment", description = "Payment due dates and status API"),
        (name = "subscription", description = "Subscription renewal API"),
        (name = "reminder", description = "Payment reminder API"),
    ),
    info(
        title = "Atelier Back-office API",
        version = "1.0.0",
        description = "Art-course back-office billing REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
