use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use atelier_backend::{
    config::Config,
    database::create_pool,
    external::SmsService,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池（表结构由托管数据库维护）
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    let jwt_service = JwtService::new(&config.jwt.secret);
    let sms_service = SmsService::new(config.sms.clone());
    if !sms_service.is_enabled() {
        log::warn!("SMS gateway credentials missing, reminders will fail until configured");
    }

    // 创建服务
    let billing = config.billing.clone();
    let payment_service = PaymentService::new(pool.clone(), billing.utc_offset_hours);
    let subscription_service = SubscriptionService::new(pool.clone());
    let reminder_service =
        ReminderService::new(pool.clone(), payment_service.clone(), sms_service);

    // 启动后台任务
    tasks::spawn_all(reminder_service.clone(), billing.clone());

    let allowed_origins = config.server.allowed_origins.clone();

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors(&allowed_origins))
            .app_data(web::Data::new(billing.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(subscription_service.clone()))
            .app_data(web::Data::new(reminder_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api/v1/admin")
                    .configure(handlers::payment_config)
                    .configure(handlers::subscription_config)
                    .configure(handlers::reminder_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
