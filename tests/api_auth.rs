// Testes do router sem banco: o pool é preguiçoso e nenhuma rota aqui chega a usá-lo.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use tower::ServiceExt;

use estoque_api::{
    config::{AppState, Config},
    models::auth::{User, ROLE_ADMIN, ROLE_STANDARD},
};

fn test_config(version_file: PathBuf) -> Config {
    Config {
        database_url: "postgres://localhost/estoque_test".into(),
        jwt_secret: "segredo-de-teste".into(),
        bind_addr: "127.0.0.1:0".into(),
        db_max_connections: 1,
        jwt_expiration_hours: 8,
        fonts_dir: "./fonts".into(),
        font_family: "Roboto".into(),
        documents_dir: std::env::temp_dir().join("estoque_docs_teste"),
        version_file,
    }
}

fn test_state(version_file: PathBuf) -> AppState {
    let config = test_config(version_file);
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("URL de teste inválida");
    AppState::with_pool(pool, config)
}

fn token_for(state: &AppState, role: &str) -> String {
    let user = User {
        id: 7,
        name: "Teste".into(),
        login: "teste".into(),
        password_hash: String::new(),
        role: role.into(),
        active: true,
        created_at: Utc::now(),
    };
    state.auth_service.create_token(&user).unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = estoque_api::app(test_state("versao.json".into()));
    let response = app.oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let app = estoque_api::app(test_state("versao.json".into()));
    let (status, body) = call(app, get("/api/produtos", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = estoque_api::app(test_state("versao.json".into()));
    let (status, _) = call(app, get("/api/estoque/saldos", Some("nao.e.um.jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn standard_user_cannot_list_users() {
    let state = test_state("versao.json".into());
    let token = token_for(&state, ROLE_STANDARD);
    let app = estoque_api::app(state);

    let (status, body) = call(app, get("/api/usuarios", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Acesso negado: requer permissão de Administrador.");
}

#[tokio::test]
async fn standard_user_cannot_delete_documents() {
    let state = test_state("versao.json".into());
    let token = token_for(&state, ROLE_STANDARD);
    let app = estoque_api::app(state);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/documentos/1")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_passes_guard_and_hits_validation() {
    let state = test_state("versao.json".into());
    let token = token_for(&state, ROLE_ADMIN);
    let app = estoque_api::app(state);

    let body = json!({ "name": "Ana", "login": "ana", "password": "segredo1", "role": "Gerente" });
    let (status, body) = call(app, post_json("/api/usuarios", &token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["role"].is_array());
}

#[tokio::test]
async fn exit_with_zero_quantity_is_rejected_before_touching_stock() {
    let state = test_state("versao.json".into());
    let token = token_for(&state, ROLE_STANDARD);
    let app = estoque_api::app(state);

    let body = json!({ "productId": 1, "quantity": 0, "reason": "Venda" });
    let (status, body) = call(app, post_json("/api/estoque/saida", &token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["quantity"].is_array());
}

#[tokio::test]
async fn inverted_report_window_is_bad_request() {
    let state = test_state("versao.json".into());
    let token = token_for(&state, ROLE_STANDARD);
    let app = estoque_api::app(state);

    let uri = "/api/relatorios/movimentacoes?dataInicio=2025-03-10&dataFim=2025-03-01";
    let (status, _) = call(app, get(uri, Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_query_parameters_use_error_envelope() {
    let state = test_state("versao.json".into());
    let token = token_for(&state, ROLE_STANDARD);

    for uri in [
        "/api/relatorios/movimentacoes?tipo=Transferencia",
        "/api/relatorios/movimentacoes?dataInicio=10-03-2025",
        "/api/relatorios/inventario?formato=docx",
    ] {
        let (status, body) = call(estoque_api::app(state.clone()), get(uri, Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        let message = body["error"].as_str().unwrap_or_default();
        assert!(message.starts_with("Parâmetros de consulta inválidos"), "{}: {}", uri, body);
    }
}

#[tokio::test]
async fn version_document_is_served_as_is() {
    let path = std::env::temp_dir().join(format!("versao_teste_{}.json", std::process::id()));
    std::fs::write(&path, r#"{"versao": "1.4.0", "url_download": "https://exemplo.com/app"}"#).unwrap();

    let app = estoque_api::app(test_state(path.clone()));
    let (status, body) = call(app, get("/api/versao", None)).await;
    std::fs::remove_file(&path).ok();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["versao"], "1.4.0");
}

#[tokio::test]
async fn missing_version_file_is_not_found() {
    let app = estoque_api::app(test_state("/nao/existe/versao.json".into()));
    let (status, _) = call(app, get("/api/versao", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_lists_stock_routes() {
    let app = estoque_api::app(test_state("versao.json".into()));
    let (status, body) = call(app, get("/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/estoque/saida"].is_object());
    assert!(body["components"]["securitySchemes"]["api_jwt"].is_object());
}
