use crate::error::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// 后台令牌声明，由外部登录系统使用同一密钥签发
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // staff id
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

const ADMIN_ROLES: [&str; 2] = ["admin", "staff"];

#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    #[cfg(test)]
    secret: String,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            #[cfg(test)]
            secret: secret.to_string(),
        }
    }

    /// 测试中模拟外部登录系统签发令牌
    #[cfg(test)]
    pub fn issue(&self, claims: &Claims) -> AppResult<String> {
        use jsonwebtoken::{EncodingKey, Header, encode};
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    /// 校验签名与有效期，并要求后台角色
    pub fn verify_admin_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if !ADMIN_ROLES.contains(&claims.role.as_str()) {
            return Err(AppError::Forbidden);
        }

        Ok(claims)
    }
}
