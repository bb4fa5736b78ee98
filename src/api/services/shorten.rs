use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::OwnerToken;
use crate::errors::{Result, ShortenerError};
use crate::storage::{BatchItem, Repository};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// 只拒绝空白输入；URL 原样保存，不做 trim
fn require_url(raw: &str) -> Result<&str> {
    if raw.trim().is_empty() {
        return Err(ShortenerError::validation("url must not be empty"));
    }
    Ok(raw)
}

pub struct ShortenService;

impl ShortenService {
    /// `POST /`，请求体是原始 URL
    pub async fn shorten_text(
        body: String,
        owner: OwnerToken,
        repo: web::Data<Repository>,
    ) -> Result<HttpResponse> {
        let url = require_url(&body)?;
        let link = repo.store(url, owner.as_str()).await?;
        debug!("Shortened {} -> {}", url, link);

        Ok(HttpResponse::Created()
            .content_type(ContentType::plaintext())
            .body(link))
    }

    /// `POST /api/shorten`
    pub async fn shorten_json(
        req: web::Json<ShortenRequest>,
        owner: OwnerToken,
        repo: web::Data<Repository>,
    ) -> Result<HttpResponse> {
        let url = require_url(&req.url)?;
        let link = repo.store(url, owner.as_str()).await?;
        debug!("Shortened {} -> {}", url, link);

        Ok(HttpResponse::Created().json(ShortenResponse { result: link }))
    }

    /// `POST /api/shorten/batch`
    pub async fn shorten_batch(
        req: web::Json<Vec<BatchItem>>,
        owner: OwnerToken,
        repo: web::Data<Repository>,
    ) -> Result<HttpResponse> {
        let items: Vec<BatchItem> = req
            .into_inner()
            .into_iter()
            .map(|item| {
                let url = require_url(&item.original_url)?.to_owned();
                Ok(BatchItem::new(item.correlation_id, url))
            })
            .collect::<Result<_>>()?;

        let results = repo.batch(&items, owner.as_str()).await?;
        debug!("Batch shortened {} urls", results.len());

        Ok(HttpResponse::Created().json(results))
    }

    /// `GET /api/user/urls`，没有记录时返回 204
    pub async fn user_urls(
        owner: OwnerToken,
        repo: web::Data<Repository>,
    ) -> Result<HttpResponse> {
        let urls = repo.get_by_user(owner.as_str()).await?;
        if urls.is_empty() {
            return Ok(HttpResponse::NoContent().finish());
        }
        Ok(HttpResponse::Ok().json(urls))
    }
}
