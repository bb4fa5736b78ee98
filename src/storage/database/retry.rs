//! 数据库操作重试
//!
//! 可重试错误（连接获取失败、死锁、SQLite BUSY 等）按指数退避 + 抖动重试；
//! 每次尝试都有独立超时，超时也视为可重试。唯一约束冲突永远不重试，交给调用方处理。

use std::future::Future;
use std::time::Duration;

use sea_orm::{DbErr, SqlErr};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::StorageConfig;

/// 重试配置
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// 单次尝试超时
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&StorageConfig> for RetryPolicy {
    fn from(config: &StorageConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
            attempt_timeout: Duration::from_millis(config.operation_timeout_ms.max(1)),
        }
    }
}

/// 是否唯一约束冲突
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// 判断数据库错误是否可重试
pub fn is_retryable(err: &DbErr) -> bool {
    if is_unique_violation(err) {
        return false;
    }
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => {
            is_retryable_message(&runtime_err.to_string().to_lowercase())
        }
        _ => false,
    }
}

/// PostgreSQL 序列化失败 / 死锁，SQLite BUSY / LOCKED
fn is_retryable_message(message: &str) -> bool {
    message.contains("deadlock")
        || message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("could not serialize access")
        || message.contains("serialization failure")
}

/// 指数退避（带 0-25% 随机抖动）
fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    use rand::RngExt;
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp_delay.min(max_ms);
    let jitter = rand::rng().random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}

/// 执行数据库操作，按策略重试
///
/// 丢弃返回的 future 即取消操作（包括正在等待的退避）。
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        let outcome = match tokio::time::timeout(policy.attempt_timeout, operation()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(DbErr::ConnectionAcquire(
                sea_orm::error::ConnAcquireErr::Timeout,
            )),
        };

        match outcome {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        "Operation '{}' succeeded after {} retries",
                        operation_name, attempt
                    );
                }
                return Ok(value);
            }
            Err(e) if is_retryable(&e) && attempt < policy.max_retries => {
                attempt += 1;
                let delay = backoff_delay(attempt, policy.base_delay_ms, policy.max_delay_ms);
                warn!(
                    "Operation '{}' failed (attempt {}/{}): {}; retrying in {} ms",
                    operation_name,
                    attempt,
                    policy.max_retries + 1,
                    e,
                    delay
                );
                sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => {
                debug!("Operation '{}' failed: {}", operation_name, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::{ConnAcquireErr, RuntimeErr};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 5,
            attempt_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_classification() {
        assert!(is_retryable(&DbErr::ConnectionAcquire(
            ConnAcquireErr::Timeout
        )));
        assert!(is_retryable(&DbErr::Query(RuntimeErr::Internal(
            "database is locked".to_string()
        ))));
        assert!(is_retryable(&DbErr::Exec(RuntimeErr::Internal(
            "deadlock detected".to_string()
        ))));
        assert!(!is_retryable(&DbErr::RecordNotFound("x".to_string())));
        assert!(!is_retryable(&DbErr::Custom("boom".to_string())));
    }

    #[test]
    fn test_backoff_is_capped() {
        let first = backoff_delay(1, 100, 2000);
        assert!((100..=125).contains(&first));

        let late = backoff_delay(12, 100, 2000);
        assert!((2000..=2500).contains(&late));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("flaky", fast_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result = with_retry("broken", fast_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u8, _>(DbErr::Custom("syntax".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_retryable_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempt_timeout: Duration::from_millis(10),
            ..fast_policy(1)
        };
        let result = with_retry("slow", policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                sleep(Duration::from_millis(200)).await;
                Ok::<_, DbErr>(1)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
