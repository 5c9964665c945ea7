use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许跨域的后台前端地址，为空表示不限制
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// 后台令牌由外部登录系统签发，这里只负责校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
    #[serde(default = "default_sms_base_url")]
    pub base_url: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_phone: String::new(),
            base_url: default_sms_base_url(),
        }
    }
}

impl SmsConfig {
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_phone.is_empty()
    }
}

fn default_sms_base_url() -> String {
    "https://api.twilio.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// 业务时区相对 UTC 的小时偏移，用于确定“今天”
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default)]
    pub reminders_enabled: bool,
    #[serde(default = "default_reminder_interval_hours")]
    pub reminder_interval_hours: u64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            reminders_enabled: false,
            reminder_interval_hours: default_reminder_interval_hours(),
        }
    }
}

fn default_utc_offset_hours() -> i32 {
    8
}

fn default_reminder_interval_hours() -> u64 {
    24
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;
                Self::from_env_defaults(database_url)
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("解析配置文件失败: {e}").into())
    }

    fn from_env_defaults(database_url: String) -> Self {
        Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
                allowed_origins: Vec::new(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
            },
            sms: SmsConfig::default(),
            billing: BillingConfig::default(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }

        // 短信网关
        if let Ok(v) = env::var("SMS_ACCOUNT_SID") {
            self.sms.account_sid = v;
        }
        if let Ok(v) = env::var("SMS_AUTH_TOKEN") {
            self.sms.auth_token = v;
        }
        if let Ok(v) = env::var("SMS_FROM_PHONE") {
            self.sms.from_phone = v;
        }
        if let Ok(v) = env::var("SMS_BASE_URL") {
            self.sms.base_url = v;
        }

        if let Ok(v) = env::var("BILLING_UTC_OFFSET_HOURS")
            && let Ok(n) = v.parse()
        {
            self.billing.utc_offset_hours = n;
        }
        if let Ok(v) = env::var("BILLING_REMINDERS_ENABLED")
            && let Ok(b) = v.parse()
        {
            self.billing.reminders_enabled = b;
        }
        if let Ok(v) = env::var("BILLING_REMINDER_INTERVAL_HOURS")
            && let Ok(n) = v.parse()
        {
            self.billing.reminder_interval_hours = n;
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/atelier"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.server.allowed_origins.is_empty());
        assert_eq!(config.billing.utc_offset_hours, 8);
        assert_eq!(config.billing.reminder_interval_hours, 24);
        assert!(!config.billing.reminders_enabled);
        assert!(!config.sms.is_configured());
        assert_eq!(config.sms.base_url, "https://api.twilio.com");
    }

    #[test]
    fn test_parse_billing_section() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/atelier"
            max_connections = 10

            [jwt]
            secret = "s3cret"

            [sms]
            account_sid = "AC123"
            auth_token = "token"
            from_phone = "+8613800000000"

            [billing]
            utc_offset_hours = -5
            reminders_enabled = true
            "#,
        )
        .unwrap();
        assert!(config.sms.is_configured());
        assert_eq!(config.billing.utc_offset_hours, -5);
        assert!(config.billing.reminders_enabled);
    }

    #[test]
    fn test_parse_rejects_missing_section() {
        assert!(Config::parse("[server]\nhost = \"x\"\nport = 1\n").is_err());
    }
}
