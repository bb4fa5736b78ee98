//! Owner token middleware
//!
//! 每个客户端由签名 cookie `token` 标识。缺失或签名不对时生成新的 UUID，
//! 通过 `Set-Cookie` 下发；token 放进 request extensions，handler 通过 `OwnerToken` 提取。

use std::future::{Ready, ready};

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    body::MessageBody,
    cookie::{Cookie, CookieJar, Key},
    dev::{Payload, ServiceRequest, ServiceResponse},
    error::ErrorInternalServerError,
    middleware::Next,
    web,
};
use tracing::{debug, warn};
use uuid::Uuid;

pub const TOKEN_COOKIE: &str = "token";

/// cookie 签名密钥
#[derive(Clone)]
pub struct TokenKey(Key);

impl TokenKey {
    /// 密钥至少 64 字节；未配置或太短时使用随机密钥（重启后旧 cookie 全部失效）
    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret.filter(|s| !s.is_empty()) {
            Some(secret) => match Key::try_from(secret.as_bytes()) {
                Ok(key) => Self(key),
                Err(_) => {
                    warn!("cookie_secret is shorter than 64 bytes, using a random signing key");
                    Self::generate()
                }
            },
            None => Self::generate(),
        }
    }

    pub fn generate() -> Self {
        Self(Key::generate())
    }

    /// 校验签名，返回 token 原值
    pub fn verify(&self, cookie: Cookie<'static>) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(cookie);
        jar.signed(&self.0)
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_owned())
    }

    /// 生成带签名的 cookie
    pub fn sign(&self, token: &str) -> Option<Cookie<'static>> {
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.0).add(
            Cookie::build(TOKEN_COOKIE, token.to_owned())
                .path("/")
                .http_only(true)
                .finish(),
        );
        jar.get(TOKEN_COOKIE).cloned()
    }
}

/// 当前请求所属用户的 token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerToken(pub String);

impl OwnerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for OwnerToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<OwnerToken>()
                .cloned()
                .ok_or_else(|| ErrorInternalServerError("owner token middleware is not installed")),
        )
    }
}

/// 用 `actix_web::middleware::from_fn(owner_token)` 注册
pub async fn owner_token(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let key = req
        .app_data::<web::Data<TokenKey>>()
        .cloned()
        .ok_or_else(|| ErrorInternalServerError("token key is not configured"))?;

    let existing = req.cookie(TOKEN_COOKIE).and_then(|c| key.verify(c));
    let (token, issued) = match existing {
        Some(token) => (token, None),
        None => {
            let token = Uuid::new_v4().to_string();
            debug!("Issuing new owner token");
            let cookie = key.sign(&token);
            (token, cookie)
        }
    };

    req.extensions_mut().insert(OwnerToken(token));
    let mut res = next.call(req).await?;

    if let Some(cookie) = issued {
        res.response_mut().add_cookie(&cookie)?;
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let key = TokenKey::generate();
        let cookie = key.sign("abc").unwrap();
        assert_ne!(cookie.value(), "abc");
        assert_eq!(key.verify(cookie).as_deref(), Some("abc"));
    }

    #[test]
    fn test_tampered_or_foreign_cookie_is_rejected() {
        let key = TokenKey::generate();
        let other = TokenKey::generate();

        let foreign = other.sign("abc").unwrap();
        assert!(key.verify(foreign).is_none());

        let plain = Cookie::new(TOKEN_COOKIE, "abc");
        assert!(key.verify(plain).is_none());
    }

    #[test]
    fn test_short_secret_falls_back_to_random_key() {
        let a = TokenKey::from_secret(Some("short"));
        let b = TokenKey::from_secret(Some("short"));
        let cookie = a.sign("t").unwrap();
        assert!(b.verify(cookie).is_none());

        let secret = "s".repeat(64);
        let a = TokenKey::from_secret(Some(&secret));
        let b = TokenKey::from_secret(Some(&secret));
        let cookie = a.sign("t").unwrap();
        assert_eq!(b.verify(cookie).as_deref(), Some("t"));
    }
}
