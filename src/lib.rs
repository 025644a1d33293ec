// src/lib.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod client;
pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

// CSV e anexos PDF passam do limite padrão do axum (2 MB)
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Monta o router completo da API.
pub fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/versao", get(handlers::system::get_version))
        .route("/health", get(handlers::system::health));

    let user_routes = Router::new()
        .route("/usuario/me", get(handlers::auth::get_me))
        .route("/usuario/mudar-senha", post(handlers::auth::change_password))
        .route(
            "/usuarios",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/usuarios/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::toggle_user),
        );

    let product_routes = Router::new()
        .route(
            "/produtos",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route("/produtos/importar", post(handlers::inventory::import_products))
        .route("/produtos/etiquetas", post(handlers::inventory::print_labels))
        .route("/produtos/codigo/{code}", get(handlers::inventory::get_product_by_code))
        .route(
            "/produtos/{id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        .route("/produtos/{id}/estoque", get(handlers::inventory::get_product_balance))
        .route("/produtos/{id}/fornecedores", post(handlers::inventory::link_supplier))
        .route(
            "/produtos/{id}/fornecedores/{supplier_id}",
            delete(handlers::inventory::unlink_supplier),
        )
        .route("/produtos/{id}/naturezas", post(handlers::inventory::link_category))
        .route(
            "/produtos/{id}/naturezas/{category_id}",
            delete(handlers::inventory::unlink_category),
        )
        .route("/formularios/produto_data", get(handlers::inventory::product_form_data));

    let lookup_routes = Router::new()
        .route(
            "/fornecedores",
            get(handlers::lookups::list_suppliers).post(handlers::lookups::create_supplier),
        )
        .route(
            "/fornecedores/{id}",
            get(handlers::lookups::get_supplier)
                .put(handlers::lookups::update_supplier)
                .delete(handlers::lookups::delete_supplier),
        )
        .route(
            "/naturezas",
            get(handlers::lookups::list_categories).post(handlers::lookups::create_category),
        )
        .route(
            "/naturezas/{id}",
            get(handlers::lookups::get_category)
                .put(handlers::lookups::update_category)
                .delete(handlers::lookups::delete_category),
        );

    let stock_routes = Router::new()
        .route("/estoque/entrada", post(handlers::stock::stock_entry))
        .route("/estoque/saida", post(handlers::stock::stock_exit))
        .route("/estoque/saldos", get(handlers::stock::list_balances))
        .route("/movimentacoes", get(handlers::stock::list_movements));

    let document_routes = Router::new()
        .route(
            "/servicos",
            get(handlers::documents::list_services).post(handlers::documents::create_service),
        )
        .route("/servicos/{id}", get(handlers::documents::get_service))
        .route(
            "/servicos/{id}/documentos",
            get(handlers::documents::document_history).post(handlers::documents::generate_document),
        )
        .route(
            "/documentos/{id}",
            get(handlers::documents::get_document).delete(handlers::documents::delete_document),
        )
        .route("/documentos/{id}/pdf", get(handlers::documents::download_document));

    let report_routes = Router::new()
        .route("/dashboard/kpis", get(handlers::dashboard::get_kpis))
        .route("/relatorios/inventario", get(handlers::reports::inventory_report))
        .route("/relatorios/movimentacoes", get(handlers::reports::movement_report));

    // Tudo abaixo exige token válido
    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(product_routes)
        .merge(lookup_routes)
        .merge(stock_routes)
        .merge(document_routes)
        .merge(report_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
