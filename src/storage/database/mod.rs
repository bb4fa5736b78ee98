//! SeaORM 关系型后端（SQLite / PostgreSQL）
//!
//! 标识即自增主键；`full_url` 上的唯一索引负责去重。
//! 所有操作经过 `retry::with_retry`，丢弃返回的 future 即取消。

pub mod connection;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, info, warn};

use super::models::{BatchItem, Entry};
use super::{BackendKind, UrlStore};
use crate::config::StorageConfig;
use crate::errors::{Result, ShortenerError};
use retry::{RetryPolicy, is_unique_violation, with_retry};

use migration::entities::url_record;

const PING_TIMEOUT: Duration = Duration::from_secs(1);

pub struct DatabaseStore {
    db: DatabaseConnection,
    backend_name: &'static str,
    policy: RetryPolicy,
}

fn to_short_id(id: i64) -> Result<u64> {
    u64::try_from(id)
        .map_err(|_| ShortenerError::storage_io(format!("negative primary key in urls: {}", id)))
}

fn to_entry(model: url_record::Model) -> Result<Entry> {
    Ok(Entry {
        short_id: to_short_id(model.id)?,
        full_url: model.full_url,
        owner_token: model.user_token.unwrap_or_default(),
        correlation_id: model.correlation_id.filter(|c| !c.is_empty()),
    })
}

async fn lookup_id<C>(db: &C, url: &str) -> std::result::Result<Option<i64>, DbErr>
where
    C: sea_orm::ConnectionTrait,
{
    url_record::Entity::find()
        .select_only()
        .column(url_record::Column::Id)
        .filter(url_record::Column::FullUrl.eq(url))
        .into_tuple::<i64>()
        .one(db)
        .await
}

/// 批量中的单条：已存在的行只更新 correlation_id，不改 owner
///
/// 先查再插：PostgreSQL 的 ON CONFLICT 也会消耗序列值，已存在的 URL 不能走 INSERT。
/// ON CONFLICT 只用来兜住查询和插入之间的并发写入（这条竞争路径仍可能留下空洞）。
async fn batch_item(
    txn: &DatabaseTransaction,
    item: &BatchItem,
    owner_token: &str,
) -> std::result::Result<i64, DbErr> {
    if let Some(id) = lookup_id(txn, &item.original_url).await? {
        url_record::Entity::update_many()
            .col_expr(
                url_record::Column::CorrelationId,
                Expr::value(item.correlation_id.clone()),
            )
            .filter(url_record::Column::Id.eq(id))
            .exec(txn)
            .await?;
        return Ok(id);
    }

    let model = url_record::ActiveModel {
        id: NotSet,
        full_url: Set(item.original_url.clone()),
        user_token: Set(Some(owner_token.to_owned())),
        correlation_id: Set(Some(item.correlation_id.clone())),
    };
    url_record::Entity::insert(model)
        .on_conflict(
            OnConflict::column(url_record::Column::FullUrl)
                .update_column(url_record::Column::CorrelationId)
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

    lookup_id(txn, &item.original_url)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("row for '{}' vanished", item.original_url)))
}

impl DatabaseStore {
    /// 连接数据库并建表
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let (db, backend_name) = connection::connect(config).await?;
        info!("Relational storage initialized ({})", backend_name);
        Ok(Self {
            db,
            backend_name,
            policy: RetryPolicy::from(config),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    async fn insert_new(&self, url: &str, owner_token: &str) -> std::result::Result<i64, DbErr> {
        let db = &self.db;
        with_retry(&format!("insert({})", url), self.policy, move || async move {
            let model = url_record::ActiveModel {
                id: NotSet,
                full_url: Set(url.to_owned()),
                user_token: Set(Some(owner_token.to_owned())),
                correlation_id: NotSet,
            };
            url_record::Entity::insert(model)
                .exec(db)
                .await
                .map(|res| res.last_insert_id)
        })
        .await
    }

    async fn find_id(&self, url: &str) -> Result<Option<i64>> {
        let db = &self.db;
        let id = with_retry(&format!("lookup({})", url), self.policy, move || async move {
            lookup_id(db, url).await
        })
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl UrlStore for DatabaseStore {
    async fn store(&self, url: &str, owner_token: &str) -> Result<u64> {
        if let Some(id) = self.find_id(url).await? {
            return to_short_id(id);
        }

        match self.insert_new(url, owner_token).await {
            Ok(id) => {
                debug!("Database store: {} -> {}", url, id);
                to_short_id(id)
            }
            // 并发插入同一个 URL：另一方已写入，读回它的标识
            Err(e) if is_unique_violation(&e) => match self.find_id(url).await? {
                Some(id) => to_short_id(id),
                None => Err(ShortenerError::constraint_violation(format!(
                    "unique violation on '{}' but no row found on re-read: {}",
                    url, e
                ))),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, short_id: u64) -> Result<String> {
        let not_found = || ShortenerError::not_found(format!("short id {} not found", short_id));
        let Ok(id) = i64::try_from(short_id) else {
            return Err(not_found());
        };

        let db = &self.db;
        let model = with_retry(&format!("find({})", id), self.policy, move || async move {
            url_record::Entity::find_by_id(id).one(db).await
        })
        .await?;

        model.map(|m| m.full_url).ok_or_else(not_found)
    }

    async fn get_by_user(&self, owner_token: &str) -> Result<Vec<Entry>> {
        let db = &self.db;
        let models = with_retry("get_by_user", self.policy, move || async move {
            url_record::Entity::find()
                .filter(url_record::Column::UserToken.eq(owner_token))
                .order_by_asc(url_record::Column::Id)
                .all(db)
                .await
        })
        .await?;

        models.into_iter().map(to_entry).collect()
    }

    async fn batch(&self, items: &[BatchItem], owner_token: &str) -> Result<Vec<(String, u64)>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let db = &self.db;
        let ids = with_retry("batch", self.policy, move || async move {
            let txn = db.begin().await?;
            let mut ids = Vec::with_capacity(items.len());

            for item in items {
                ids.push(batch_item(&txn, item, owner_token).await?);
            }

            txn.commit().await?;
            Ok::<_, DbErr>(ids)
        })
        .await?;

        info!("Database batch stored {} items", ids.len());
        items
            .iter()
            .zip(ids)
            .map(|(item, id)| Ok((item.correlation_id.clone(), to_short_id(id)?)))
            .collect()
    }

    async fn ping(&self) -> bool {
        match tokio::time::timeout(PING_TIMEOUT, self.db.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Database ping failed: {}", e);
                false
            }
            Err(_) => {
                warn!("Database ping timed out after {:?}", PING_TIMEOUT);
                false
            }
        }
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Database
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> DatabaseStore {
        let config = StorageConfig {
            database_dsn: "sqlite::memory:".to_string(),
            ..StorageConfig::default()
        };
        DatabaseStore::connect(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_store_dedups_and_keeps_owner() {
        let store = memory_db().await;
        assert_eq!(store.store("https://a.com", "u1").await.unwrap(), 1);
        assert_eq!(store.store("https://b.com", "u1").await.unwrap(), 2);
        assert_eq!(store.store("https://a.com", "u2").await.unwrap(), 1);

        assert!(store.get_by_user("u2").await.unwrap().is_empty());
        let mine = store.get_by_user("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].short_id, 1);
        assert_eq!(mine[1].full_url, "https://b.com");
    }

    #[tokio::test]
    async fn test_find_missing_and_oversized_ids() {
        let store = memory_db().await;
        store.store("https://a.com", "u1").await.unwrap();

        assert_eq!(store.find(1).await.unwrap(), "https://a.com");
        assert!(matches!(store.find(2).await, Err(ShortenerError::NotFound(_))));
        assert!(matches!(
            store.find(u64::MAX).await,
            Err(ShortenerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_upserts_and_preserves_order() {
        let store = memory_db().await;
        store.store("https://x.com", "u1").await.unwrap();

        let items = vec![
            BatchItem::new("a", "https://y.com"),
            BatchItem::new("b", "https://x.com"),
            BatchItem::new("c", "https://y.com"),
        ];
        let result = store.batch(&items, "u2").await.unwrap();
        assert_eq!(
            result,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 1),
                ("c".to_string(), 2),
            ]
        );

        // 冲突行不换 owner
        let owned = store.get_by_user("u1").await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].correlation_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_batch_never_reinserts_existing_urls() {
        use sea_orm::ConnectionTrait;

        let store = memory_db().await;
        store.store("https://x.com", "u1").await.unwrap();

        // 对已存在的 URL 发起 INSERT 会消耗 PostgreSQL 序列值；这里让它直接失败
        store
            .db
            .execute_unprepared(
                "CREATE TRIGGER reject_reinsert BEFORE INSERT ON urls \
                 WHEN NEW.full_url = 'https://x.com' \
                 BEGIN SELECT RAISE(ABORT, 'existing url inserted again'); END;",
            )
            .await
            .unwrap();

        let items = vec![
            BatchItem::new("a", "https://y.com"),
            BatchItem::new("b", "https://x.com"),
            BatchItem::new("c", "https://z.com"),
        ];
        let result = store.batch(&items, "u2").await.unwrap();
        assert_eq!(
            result,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 1),
                ("c".to_string(), 3),
            ]
        );
        assert_eq!(store.store("https://w.com", "u2").await.unwrap(), 4);

        let owned = store.get_by_user("u1").await.unwrap();
        assert_eq!(owned[0].correlation_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_ping() {
        let store = memory_db().await;
        assert!(store.ping().await);
        assert_eq!(store.backend_kind(), BackendKind::Database);
        assert_eq!(store.backend_name(), "sqlite");
    }
}
