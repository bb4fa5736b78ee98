//! 存储抽象与三个可互换的后端
//!
//! - `memory`: 进程内存，重启即丢失
//! - `file`: 追加写的行日志文件（每行一个 JSON 记录，行号即标识）
//! - `database`: SeaORM（SQLite / PostgreSQL），自增主键即标识
//!
//! 三个后端的去重、标识分配和按用户过滤语义完全一致，
//! 由 `Repository` 在启动时按配置选择其中一个。

use async_trait::async_trait;
use strum::{AsRefStr, Display};

use crate::errors::Result;

pub mod assigner;
pub mod database;
pub mod file;
pub mod links;
pub mod memory;
pub mod models;
mod repository;

pub use assigner::{Assignment, UrlIndex};
pub use database::DatabaseStore;
pub use file::LineLogStore;
pub use links::LinkBuilder;
pub use memory::MemoryStore;
pub use models::{BatchItem, BatchResult, Entry, LogRecord, UserUrl};
pub use repository::{Repository, StorageFactory};

/// 当前使用的后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Memory,
    File,
    Database,
}

/// 后端统一契约
///
/// 后端只处理数字标识，短链接字符串由 `Repository` 在边界处统一生成。
#[async_trait]
pub trait UrlStore: Send + Sync {
    /// 已存在则返回原标识（不修改 owner），否则插入并返回新标识
    async fn store(&self, url: &str, owner_token: &str) -> Result<u64>;

    /// 标识不存在时返回 NotFound
    async fn find(&self, short_id: u64) -> Result<String>;

    /// 按插入顺序返回该用户的全部记录
    async fn get_by_user(&self, owner_token: &str) -> Result<Vec<Entry>>;

    /// 每个输入项对应一个 (correlation_id, short_id)，顺序与输入一致
    async fn batch(&self, items: &[BatchItem], owner_token: &str) -> Result<Vec<(String, u64)>>;

    /// 健康检查，错误只记录日志不向上抛
    async fn ping(&self) -> bool;

    fn backend_kind(&self) -> BackendKind;
}
