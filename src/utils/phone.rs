use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AppError, AppResult};

fn e164_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("valid E.164 regex"))
}

/// 验证 E.164 手机号格式（+国家码 + 号码）
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !e164_regex().is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number, expected E.164 format (+xxxxxxxxxxx)".to_string(),
        ));
    }
    Ok(())
}

/// 规范化后台录入的手机号。
///
/// 去掉空格、括号、连字符；11 位以 1 开头的大陆手机号补 +86，`00` 前缀换成 `+`。
pub fn normalize_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    let candidate = if trimmed.starts_with('+') {
        format!("+{digits}")
    } else if let Some(rest) = digits.strip_prefix("00") {
        format!("+{rest}")
    } else if digits.len() == 11 && digits.starts_with('1') {
        format!("+86{digits}")
    } else {
        return None;
    };

    validate_phone(&candidate).ok().map(|_| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+8613800138000").is_ok());
        assert!(validate_phone("+12345678901").is_ok());
        assert!(validate_phone("13800138000").is_err());
        assert!(validate_phone("+0123456789").is_err());
        assert!(validate_phone("+1234").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(
            normalize_phone("138 0013 8000").as_deref(),
            Some("+8613800138000")
        );
        assert_eq!(
            normalize_phone("+1 (234) 567-8901").as_deref(),
            Some("+12345678901")
        );
        assert_eq!(
            normalize_phone("0044 20 7946 0958").as_deref(),
            Some("+442079460958")
        );
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone(""), None);
    }
}
