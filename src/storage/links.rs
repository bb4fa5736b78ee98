//! 短链接格式化与解析：`{base_url}/{short_id}`

use crate::errors::{Result, ShortenerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.strip_suffix('/').unwrap_or(&base_url).to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn link(&self, short_id: u64) -> String {
        format!("{}/{}", self.base_url, short_id)
    }

    /// 解析短标识
    ///
    /// 接受纯数字标识或带 base_url 前缀的完整链接。
    /// 非整数 → InvalidIdentifier；小于 1 → NotFound。
    pub fn parse_identifier(&self, raw: &str) -> Result<u64> {
        let raw = raw.trim();
        let bare = raw
            .strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(raw);

        let value: i64 = bare.parse().map_err(|_| {
            ShortenerError::invalid_identifier(format!("not a numeric short id: '{}'", raw))
        })?;

        if value < 1 {
            return Err(ShortenerError::not_found(format!(
                "short id out of range: {}",
                value
            )));
        }

        Ok(value as u64)
    }
}
