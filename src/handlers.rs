// src/handlers.rs

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::services::report_service::ReportFile;

pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod inventory;
pub mod lookups;
pub mod reports;
pub mod stock;
pub mod system;
pub mod users;

// Resposta de download com o nome do arquivo no Content-Disposition
pub fn file_download(file: ReportFile) -> Response {
    let headers = [
        (header::CONTENT_TYPE, file.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.filename),
        ),
    ];
    (headers, file.bytes).into_response()
}
