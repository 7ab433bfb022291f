use actix_multipart::Multipart;
use actix_web::{
    error::InternalError, get, http::header, post, web, HttpRequest, HttpResponse, Responder,
    Result as WebResult,
};
use futures_util::StreamExt as _;
use tracing::{error, warn};

use crate::api::models::{AskRequest, AskResponse, ErrorResponse, UploadResponse};
use crate::ask::AskService;
use crate::storage::{DocumentStorePtr, StorageError};
use crate::upload::{UploadError, UploadService};

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/favicon.ico")]
pub async fn favicon() -> impl Responder {
    HttpResponse::NoContent().finish()
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

// --- Documents ---

#[post("/upload")]
pub async fn upload_file(
    uploads: web::Data<UploadService>,
    req: HttpRequest,
    payload: Multipart,
) -> WebResult<HttpResponse> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false);
    if !is_multipart {
        return Ok(upload_failure(UploadError::NoFilePart));
    }

    match receive_file(&uploads, payload).await {
        Ok(id) => Ok(HttpResponse::Ok().json(UploadResponse::uploaded(id))),
        Err(e) => Ok(upload_failure(e)),
    }
}

/// Streams the first `file` field of the form to storage, enforcing name
/// rules before the body is read and the size limit chunk by chunk.
async fn receive_file(uploads: &UploadService, mut payload: Multipart) -> Result<String, UploadError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| UploadError::Multipart(e.to_string()))?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().unwrap_or_default().to_string(),
            ),
            None => continue,
        };
        if name != "file" {
            continue;
        }

        let mut pending = uploads.begin(&filename).await?;
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| UploadError::Multipart(e.to_string()))?;
            pending.write(&chunk).await?;
        }

        let uploaded = pending.finish().await?;
        return Ok(uploaded.id);
    }

    Err(UploadError::NoFilePart)
}

fn upload_failure(err: UploadError) -> HttpResponse {
    let mut response = match &err {
        UploadError::TooLarge(_) => HttpResponse::PayloadTooLarge(),
        UploadError::Multipart(_) => HttpResponse::BadRequest(),
        UploadError::Storage(e) => {
            error!("Upload could not be stored: {}", e);
            HttpResponse::InternalServerError()
        }
        _ => HttpResponse::Ok(),
    };
    response.json(UploadResponse::failed(err.to_string()))
}

#[get("/uploads/{id}")]
pub async fn download_file(
    store: web::Data<DocumentStorePtr>,
    id: web::Path<String>,
) -> WebResult<HttpResponse> {
    let id = id.into_inner();

    match store.load(&id).await {
        Ok(content) => {
            let mime = mime_guess::from_path(&id).first_or_octet_stream();
            Ok(HttpResponse::Ok().content_type(mime.essence_str()).body(content))
        }
        Err(StorageError::NotFound(_)) => Ok(HttpResponse::NotFound().finish()),
        Err(e) => {
            error!("Failed to read {}: {}", id, e);
            Ok(HttpResponse::InternalServerError().body(e.to_string()))
        }
    }
}

// --- Questions ---

#[post("/ask")]
pub async fn ask_question(
    ask: web::Data<AskService>,
    req: web::Json<AskRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    let question = req.question.unwrap_or_default();
    let file_ids = req.file_ids.unwrap_or_default();

    let answer = ask.ask(&question, &file_ids).await;

    Ok(HttpResponse::Ok().json(AskResponse { answer }))
}

/// Malformed JSON bodies get a structured 400 instead of the default text.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!("Rejected request body: {}", err);
        let body = ErrorResponse {
            error: format!("Invalid request body: {}", err),
        };
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(index)
        .service(favicon)
        .service(health)
        .service(upload_file)
        .service(download_file)
        .service(ask_question);
}
