use std::sync::Arc;

use tracing::info;

use super::links::LinkBuilder;
use super::models::{BatchItem, BatchResult, UserUrl};
use super::{BackendKind, DatabaseStore, LineLogStore, MemoryStore, UrlStore};
use crate::config::StorageConfig;
use crate::errors::Result;

/// 存储门面
///
/// 持有一个后端，把数字标识转换成 `{base_url}/{id}` 形式的短链接。
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn UrlStore>,
    links: LinkBuilder,
}

impl Repository {
    pub fn new(store: Arc<dyn UrlStore>, links: LinkBuilder) -> Self {
        Self { store, links }
    }

    /// 保存 URL，返回完整短链接（已存在时返回原链接）
    pub async fn store(&self, url: &str, owner_token: &str) -> Result<String> {
        let id = self.store.store(url, owner_token).await?;
        Ok(self.links.link(id))
    }

    /// 按短标识（纯数字或完整链接）查找原始 URL
    pub async fn find(&self, short_id: &str) -> Result<String> {
        let id = self.links.parse_identifier(short_id)?;
        self.store.find(id).await
    }

    pub async fn get_by_user(&self, owner_token: &str) -> Result<Vec<UserUrl>> {
        let entries = self.store.get_by_user(owner_token).await?;
        Ok(entries
            .into_iter()
            .map(|entry| UserUrl {
                short_url: self.links.link(entry.short_id),
                original_url: entry.full_url,
            })
            .collect())
    }

    pub async fn batch(&self, items: &[BatchItem], owner_token: &str) -> Result<Vec<BatchResult>> {
        let pairs = self.store.batch(items, owner_token).await?;
        Ok(pairs
            .into_iter()
            .map(|(correlation_id, id)| BatchResult {
                correlation_id,
                short_url: self.links.link(id),
            })
            .collect())
    }

    /// 存储是否可用
    pub async fn health_check(&self) -> bool {
        self.store.ping().await
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.store.backend_kind()
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }
}

pub struct StorageFactory;

impl StorageFactory {
    /// 按配置选择后端：DSN 优先，其次文件路径，否则内存
    pub async fn create(config: &StorageConfig, base_url: &str) -> Result<Repository> {
        let links = LinkBuilder::new(base_url);

        let store: Arc<dyn UrlStore> = if !config.database_dsn.is_empty() {
            Arc::new(DatabaseStore::connect(config).await?)
        } else if !config.file_storage_path.is_empty() {
            Arc::new(LineLogStore::open(&config.file_storage_path, links.clone())?)
        } else {
            Arc::new(MemoryStore::new())
        };

        info!("Using storage backend: {}", store.backend_kind());
        Ok(Repository::new(store, links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShortenerError;
    use tempfile::TempDir;

    const BASE: &str = "http://localhost:8080";

    fn memory_repo() -> Repository {
        Repository::new(Arc::new(MemoryStore::new()), LinkBuilder::new(BASE))
    }

    #[tokio::test]
    async fn test_factory_selection() {
        let repo = StorageFactory::create(&StorageConfig::default(), BASE)
            .await
            .unwrap();
        assert_eq!(repo.backend_kind(), BackendKind::Memory);

        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            file_storage_path: dir.path().join("urls.log").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let repo = StorageFactory::create(&config, BASE).await.unwrap();
        assert_eq!(repo.backend_kind(), BackendKind::File);

        // DSN 优先于文件路径
        let config = StorageConfig {
            database_dsn: "sqlite::memory:".to_string(),
            ..config
        };
        let repo = StorageFactory::create(&config, BASE).await.unwrap();
        assert_eq!(repo.backend_kind(), BackendKind::Database);
    }

    #[tokio::test]
    async fn test_factory_rejects_unsupported_dsn() {
        let config = StorageConfig {
            database_dsn: "mysql://root@localhost/urls".to_string(),
            ..StorageConfig::default()
        };
        assert!(matches!(
            StorageFactory::create(&config, BASE).await,
            Err(ShortenerError::DatabaseConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_links_and_lookup() {
        let repo = memory_repo();
        let link = repo.store("https://example.com/a", "t1").await.unwrap();
        assert_eq!(link, "http://localhost:8080/1");

        assert_eq!(repo.find("1").await.unwrap(), "https://example.com/a");
        assert_eq!(repo.find(&link).await.unwrap(), "https://example.com/a");
        assert!(matches!(
            repo.find("nope").await,
            Err(ShortenerError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            repo.find("0").await,
            Err(ShortenerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_user_urls_and_batch() {
        let repo = memory_repo();
        repo.store("https://x.com", "alice").await.unwrap();

        let results = repo
            .batch(
                &[
                    BatchItem::new("1", "https://y.com"),
                    BatchItem::new("2", "https://x.com"),
                ],
                "bob",
            )
            .await
            .unwrap();
        assert_eq!(results[0].short_url, "http://localhost:8080/2");
        assert_eq!(results[1].short_url, "http://localhost:8080/1");
        assert_eq!(results[1].correlation_id, "2");

        let bob = repo.get_by_user("bob").await.unwrap();
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].original_url, "https://y.com");
        assert!(repo.health_check().await);
    }
}
