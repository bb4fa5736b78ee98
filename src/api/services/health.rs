use actix_web::{HttpResponse, Responder, web};
use tracing::{error, trace};

use crate::storage::Repository;

pub struct HealthService;

impl HealthService {
    /// 存储可用返回 200，否则 500
    pub async fn ping(repo: web::Data<Repository>) -> impl Responder {
        trace!("Received ping request");
        if repo.health_check().await {
            HttpResponse::Ok().finish()
        } else {
            error!("Storage health check failed ({})", repo.backend_kind());
            HttpResponse::InternalServerError().finish()
        }
    }
}
