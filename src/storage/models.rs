use serde::{Deserialize, Serialize};

/// 一条存储记录
///
/// `full_url` 在同一个存储内唯一，`short_id` 从 1 开始按插入顺序连续分配，
/// `owner_token` 写入后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub short_id: u64,
    pub full_url: String,
    pub owner_token: String,
    pub correlation_id: Option<String>,
}

/// 批量缩短的输入项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

impl BatchItem {
    pub fn new(correlation_id: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            original_url: original_url.into(),
        }
    }
}

/// 批量缩短的输出项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub correlation_id: String,
    pub short_url: String,
}

/// 用户链接列表中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUrl {
    pub short_url: String,
    pub original_url: String,
}

/// 行日志文件中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub full_url: String,
    #[serde(default)]
    pub short_url: String,
    #[serde(default)]
    pub user_token: String,
    #[serde(default)]
    pub correlation_id: String,
}

impl LogRecord {
    /// 以行号作为标识还原为 Entry，文件中的 short_url 只做展示用途
    pub fn into_entry(self, short_id: u64) -> Entry {
        Entry {
            short_id,
            full_url: self.full_url,
            owner_token: self.user_token,
            correlation_id: if self.correlation_id.is_empty() {
                None
            } else {
                Some(self.correlation_id)
            },
        }
    }
}
