use std::net::SocketAddr;

use actix_web::error::JsonPayloadError;
use actix_web::http::header;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde::Serialize;

use crate::error::PlacementError;
use crate::export::{render_document, suggested_filename};
use crate::model::{ClassificationResult, Locale, Provenance, Query};
use crate::service::PlacementService;

#[derive(Debug, Serialize)]
struct PlacementResponse {
    name: String,
    nis: String,
    school: String,
    category: &'static str,
    class: &'static str,
    source: &'static str,
    provenance: Provenance,
}

impl PlacementResponse {
    fn new(result: ClassificationResult, locale: Locale) -> Self {
        Self {
            category: result.category.label(locale),
            class: result.class.label(locale),
            source: result.provenance.description(locale),
            provenance: result.provenance,
            name: result.name,
            nis: result.nis,
            school: result.school,
        }
    }
}

// Placement is CPU-bound, keep it off the async workers.
async fn place_blocking(
    service: web::Data<PlacementService>,
    query: Query,
) -> Result<ClassificationResult, PlacementError> {
    web::block(move || service.place(query))
        .await
        .map_err(|e| PlacementError::UnexpectedFailure(e.to_string()))?
}

async fn classify(
    req: web::Json<Query>,
    service: web::Data<PlacementService>,
) -> Result<HttpResponse, PlacementError> {
    let locale = service.locale();
    let result = place_blocking(service, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PlacementResponse::new(result, locale)))
}

async fn export(
    req: web::Json<Query>,
    service: web::Data<PlacementService>,
) -> Result<HttpResponse, PlacementError> {
    let locale = service.locale();
    let result = place_blocking(service, req.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", suggested_filename(&result)),
        ))
        .body(render_document(&result, locale)))
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Class placement API is running!")
}

// Bodies serde rejects still answer with the JSON error shape. A null
// field is treated like an absent one.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = err.to_string();
    match err {
        JsonPayloadError::Deserialize(ref e) if e.to_string().starts_with("invalid type: null") => {
            PlacementError::MissingInput(e.to_string()).into()
        }
        _ => PlacementError::InvalidInput(message).into(),
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/classify", web::post().to(classify))
        .route("/export", web::post().to(export))
        .route("/health", web::get().to(health_check));
}

pub async fn start_api(service: PlacementService, bind: SocketAddr) -> std::io::Result<()> {
    let service = web::Data::new(service);

    HttpServer::new(move || App::new().app_data(service.clone()).configure(routes))
        .bind(bind)?
        .run()
        .await
}
