use actix_web::http::header;
use actix_web::{HttpResponse, web};
use tracing::debug;

use crate::errors::Result;
use crate::storage::Repository;

pub struct RedirectService;

impl RedirectService {
    /// `GET /{id}` → 307 到原始 URL
    pub async fn handle_redirect(
        path: web::Path<String>,
        repo: web::Data<Repository>,
    ) -> Result<HttpResponse> {
        let id = path.into_inner();
        let target = repo.find(&id).await?;
        debug!("Redirect {} -> {}", id, target);

        Ok(HttpResponse::TemporaryRedirect()
            .insert_header((header::LOCATION, target))
            .finish())
    }
}
