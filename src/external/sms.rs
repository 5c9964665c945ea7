use crate::billing::Urgency;
use crate::config::SmsConfig;
use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SendSmsResponse {
    pub sid: String,
    pub status: String,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
}

/// Twilio 兼容的短信网关
#[derive(Clone)]
pub struct SmsService {
    client: Client,
    config: SmsConfig,
}

impl SmsService {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    pub async fn send(&self, to: &str, body: &str) -> AppResult<SendSmsResponse> {
        if !self.is_enabled() {
            return Err(AppError::ExternalApiError(
                "SMS gateway is not configured".to_string(),
            ));
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid
        );

        let params = [
            ("To", to),
            ("From", self.config.from_phone.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let parsed: SendSmsResponse = response.json().await?;
            log::info!("SMS sent to {to}: sid={} status={}", parsed.sid, parsed.status);
            Ok(parsed)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("SMS failed to send: {to}, Error: {error_text}");
            Err(AppError::ExternalApiError(format!(
                "SMS sending failed: {error_text}"
            )))
        }
    }
}

/// 缴费提醒短信正文
pub fn payment_reminder_body(student_name: &str, due_date: NaiveDate, urgency: Urgency) -> String {
    let due = due_date.format("%Y-%m-%d");
    match urgency {
        Urgency::Red => format!(
            "[Atelier] {student_name}'s course package payment was due on {due}. Please renew to keep the weekly class slot."
        ),
        _ => format!(
            "[Atelier] {student_name}'s course package payment is due on {due}. Reply or contact us to renew."
        ),
    }
}
