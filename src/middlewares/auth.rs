use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            // 完全匹配的公开路径
            exact_paths: vec![
                "/health",
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
            ],
            // 前缀匹配的公开路径
            prefix_paths: vec!["/swagger-ui/", "/api-docs/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// 通过鉴权的后台操作员 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffId(pub i64);

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        if self.public_paths.is_public_path(req.path()) {
            return Box::pin(self.service.call(req));
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::to_owned);

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        match self.jwt_service.verify_admin_token(&token) {
            Ok(claims) => {
                // 将操作员ID添加到请求扩展中
                req.extensions_mut()
                    .insert(StaffId(claims.sub.parse::<i64>().unwrap_or(0)));
                Box::pin(self.service.call(req))
            }
            Err(AppError::Forbidden) => Box::pin(async move { Err(AppError::Forbidden.into()) }),
            Err(_) => {
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Claims;
    use actix_web::test::{
        TestRequest, call_service, init_service, read_body_json, try_call_service,
    };
    use actix_web::{App, HttpResponse, http::StatusCode, web};
    use chrono::{Duration, Utc};

    fn token(svc: &JwtService, role: &str) -> String {
        let now = Utc::now();
        svc.issue(&Claims {
            sub: "3".into(),
            role: role.into(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        })
        .unwrap()
    }

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/health"));
        assert!(paths.is_public_path("/swagger-ui/index.html"));
        assert!(paths.is_public_path("/api-docs/openapi.json"));
        assert!(!paths.is_public_path("/api/v1/admin/payments"));
        assert!(!paths.is_public_path("/healthz"));
    }

    #[actix_web::test]
    async fn test_guarded_route() {
        let jwt = JwtService::new("secret");
        let app = init_service(
            App::new().wrap(AuthMiddleware::new(jwt.clone())).route(
                "/api/v1/admin/ping",
                web::get().to(|req: actix_web::HttpRequest| async move {
                    let staff = req.extensions().get::<StaffId>().copied();
                    HttpResponse::Ok().json(staff.map(|s| s.0))
                }),
            ),
        )
        .await;

        let req = TestRequest::get().uri("/api/v1/admin/ping").to_request();
        let resp = try_call_service(&app, req).await;
        assert!(resp.is_err());

        let req = TestRequest::get()
            .uri("/api/v1/admin/ping")
            .insert_header(("Authorization", format!("Bearer {}", token(&jwt, "admin"))))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Option<i64> = read_body_json(resp).await;
        assert_eq!(body, Some(3));

        let req = TestRequest::get()
            .uri("/api/v1/admin/ping")
            .insert_header(("Authorization", format!("Bearer {}", token(&jwt, "student"))))
            .to_request();
        let err = try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
    }
}
