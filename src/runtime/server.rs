//! Server mode
//!
//! 选择存储后端、注册路由并启动 HTTP 服务，收到关闭信号后退出。

use actix_web::{
    App, HttpServer,
    middleware::{Compress, from_fn},
    web,
};
use anyhow::Result;
use tracing::{info, warn};

use crate::api::{TokenKey, owner_token, shortener_routes};
use crate::config::StaticConfig;
use crate::errors::ShortenerError;
use crate::storage::{Repository, StorageFactory};
use crate::system::signal::listen_for_shutdown;

/// 按配置创建存储
pub async fn build_repository(config: &StaticConfig) -> Result<Repository, ShortenerError> {
    StorageFactory::create(&config.storage, &config.server.base_url).await
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: StaticConfig, repo: Repository) -> Result<()> {
    let key = TokenKey::from_secret(config.server.cookie_secret.as_deref());
    if config.server.cookie_secret.is_none() {
        warn!("cookie_secret is not set; owner tokens will not survive a restart");
    }

    let workers = config.server.workers.clamp(1, 32);
    info!(
        "Starting server at http://{} ({} workers, {} storage, base url {})",
        config.server.address,
        workers,
        repo.backend_kind(),
        repo.links().base_url()
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(from_fn(owner_token))
            .wrap(Compress::default())
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(key.clone()))
            .configure(shortener_routes)
    })
    .workers(workers)
    .disable_signals()
    .bind(&config.server.address)?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        listen_for_shutdown().await;
        handle.stop(true).await;
    });

    server.await?;
    warn!("Server stopped");

    Ok(())
}
