// src/handlers/documents.rs

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::file_download,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{Administrador, RequireRole},
    },
    models::{
        auth::MessageResponse,
        documents::{
            Attachment, CreateServicePayload, DocumentCreatedResponse, DocumentHistoryEntry, GeneratedDocument,
            Service,
        },
    },
    services::report_service::{ReportFile, PDF_CONTENT_TYPE},
};

// ---
// Serviços
// ---

#[utoipa::path(
    get,
    path = "/api/servicos",
    tag = "Documentos",
    responses((status = 200, description = "Serviços cadastrados", body = Vec<Service>)),
    security(("api_jwt" = []))
)]
pub async fn list_services(State(app_state): State<AppState>) -> Result<Json<Vec<Service>>, AppError> {
    let services = app_state.document_service.list_services().await?;
    Ok(Json(services))
}

#[utoipa::path(
    post,
    path = "/api/servicos",
    tag = "Documentos",
    request_body = CreateServicePayload,
    responses(
        (status = 201, description = "Serviço criado", body = Service),
        (status = 403, description = "Requer Administrador"),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    _guard: RequireRole<Administrador>,
    Json(payload): Json<CreateServicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let service = app_state
        .document_service
        .create_service(&payload.name, payload.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    get,
    path = "/api/servicos/{id}",
    tag = "Documentos",
    params(("id" = i32, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Serviço", body = Service),
        (status = 404, description = "Serviço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_service(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Service>, AppError> {
    let service = app_state.document_service.get_service(id).await?;
    Ok(Json(service))
}

// ---
// Documentos
// ---

#[utoipa::path(
    get,
    path = "/api/servicos/{id}/documentos",
    tag = "Documentos",
    params(("id" = i32, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Versões geradas, a mais nova primeiro", body = Vec<DocumentHistoryEntry>),
        (status = 404, description = "Serviço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn document_history(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<DocumentHistoryEntry>>, AppError> {
    let history = app_state.document_service.history(id).await?;
    Ok(Json(history))
}

#[utoipa::path(
    post,
    path = "/api/servicos/{id}/documentos",
    tag = "Documentos",
    params(("id" = i32, Path, description = "ID do serviço")),
    request_body(
        content_type = "multipart/form-data",
        description = "`dados_formulario` (JSON) e zero ou mais `anexos` (PDF)"
    ),
    responses(
        (status = 201, description = "Documento gerado", body = DocumentCreatedResponse),
        (status = 400, description = "Formulário ou anexo inválido"),
        (status = 404, description = "Serviço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_document(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form_text: Option<String> = None;
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("dados_formulario") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form_text = Some(text);
            }
            Some("anexos") => {
                let filename = field.file_name().unwrap_or("anexo.pdf").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // Campo de arquivo vazio no formulário: ignora
                if bytes.is_empty() {
                    continue;
                }
                if !bytes.starts_with(b"%PDF") {
                    return Err(AppError::BadRequest(format!("O anexo '{}' não é um PDF.", filename)));
                }
                attachments.push(Attachment { filename, bytes: bytes.to_vec() });
            }
            _ => {}
        }
    }

    let form_text = form_text
        .ok_or_else(|| AppError::BadRequest("O campo dados_formulario é obrigatório.".into()))?;
    let form: serde_json::Value = serde_json::from_str(&form_text)
        .map_err(|e| AppError::BadRequest(format!("dados_formulario não é um JSON válido: {}", e)))?;

    let document = app_state
        .document_service
        .generate(id, user.id, form, attachments)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DocumentCreatedResponse {
            message: "Documento gerado com sucesso!".to_string(),
            id: document.id,
            version: document.version,
            download_path: format!("/api/documentos/{}/pdf", document.id),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/documentos/{id}",
    tag = "Documentos",
    params(("id" = i32, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "Documento com os dados do formulário", body = GeneratedDocument),
        (status = 404, description = "Documento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_document(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GeneratedDocument>, AppError> {
    let document = app_state.document_service.get_document(id).await?;
    Ok(Json(document))
}

#[utoipa::path(
    get,
    path = "/api/documentos/{id}/pdf",
    tag = "Documentos",
    params(("id" = i32, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "PDF final", content_type = "application/pdf"),
        (status = 404, description = "Documento ou arquivo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_document(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let (filename, bytes) = app_state.document_service.read_pdf(id).await?;
    Ok(file_download(ReportFile { filename, content_type: PDF_CONTENT_TYPE, bytes }))
}

#[utoipa::path(
    delete,
    path = "/api/documentos/{id}",
    tag = "Documentos",
    params(("id" = i32, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "Documento excluído", body = MessageResponse),
        (status = 403, description = "Requer Administrador"),
        (status = 404, description = "Documento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_document(
    State(app_state): State<AppState>,
    _guard: RequireRole<Administrador>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.document_service.delete_document(id).await?;
    Ok(Json(MessageResponse::new("Documento excluído com sucesso!")))
}
