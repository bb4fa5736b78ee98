pub mod health;
pub mod redirect;
pub mod shorten;

pub use health::HealthService;
pub use redirect::RedirectService;
pub use shorten::{ShortenRequest, ShortenResponse, ShortenService};

use actix_web::web;

/// 全部路由；`/ping` 和 `/api` 必须先于 `/{id}` 注册
pub fn shortener_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ping", web::get().to(HealthService::ping))
        .service(
            web::scope("/api")
                .route("/shorten", web::post().to(ShortenService::shorten_json))
                .route("/shorten/batch", web::post().to(ShortenService::shorten_batch))
                .route("/user/urls", web::get().to(ShortenService::user_urls)),
        )
        .route("/", web::post().to(ShortenService::shorten_text))
        .route("/{id}", web::get().to(RedirectService::handle_redirect));
}
