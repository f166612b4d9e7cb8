use actix_web::HttpResponse;
use serde::Serialize;

use crate::server::error::LedgerServerError;

#[derive(Serialize)]
struct IndexBody {
    name: &'static str,
    version: &'static str,
}

pub async fn index() -> actix_web::Result<HttpResponse, LedgerServerError> {
    let body = IndexBody {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };

    Ok(HttpResponse::Ok().json(body))
}
