use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::assigner::{Assignment, UrlIndex};
use super::models::{BatchItem, Entry};
use super::{BackendKind, UrlStore};
use crate::errors::{Result, ShortenerError};

#[derive(Default)]
struct MemoryState {
    entries: Vec<Entry>,
    index: UrlIndex,
}

impl MemoryState {
    fn insert(&mut self, url: &str, owner_token: &str, correlation_id: Option<&str>) -> u64 {
        let assignment = self.index.assign(url);
        if let Assignment::Created(id) = assignment {
            self.entries.push(Entry {
                short_id: id,
                full_url: url.to_owned(),
                owner_token: owner_token.to_owned(),
                correlation_id: correlation_id.map(str::to_owned),
            });
        }
        assignment.id()
    }
}

/// 进程内存存储
///
/// 查重和追加在同一把写锁内完成，并发 store 同一个 URL 只会产生一条记录。
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    async fn store(&self, url: &str, owner_token: &str) -> Result<u64> {
        let id = self.state.write().insert(url, owner_token, None);
        debug!("Memory store: {} -> {}", url, id);
        Ok(id)
    }

    async fn find(&self, short_id: u64) -> Result<String> {
        let state = self.state.read();
        // 标识从 1 开始且连续，直接按下标取
        short_id
            .checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| state.entries.get(idx))
            .map(|entry| entry.full_url.clone())
            .ok_or_else(|| ShortenerError::not_found(format!("short id {} not found", short_id)))
    }

    async fn get_by_user(&self, owner_token: &str) -> Result<Vec<Entry>> {
        let state = self.state.read();
        Ok(state
            .entries
            .iter()
            .filter(|entry| entry.owner_token == owner_token)
            .cloned()
            .collect())
    }

    async fn batch(&self, items: &[BatchItem], owner_token: &str) -> Result<Vec<(String, u64)>> {
        let mut state = self.state.write();
        let results: Vec<(String, u64)> = items
            .iter()
            .map(|item| {
                let id = state.insert(
                    &item.original_url,
                    owner_token,
                    Some(item.correlation_id.as_str()),
                );
                (item.correlation_id.clone(), id)
            })
            .collect();

        debug!("Memory batch stored {} items", results.len());
        Ok(results)
    }

    async fn ping(&self) -> bool {
        true
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Memory
    }
}
