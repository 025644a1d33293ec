// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Sistema ---
        handlers::system::get_version,
        handlers::system::health,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::change_password,

        // --- Usuários ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::toggle_user,

        // --- Produtos ---
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::get_product_by_code,
        handlers::inventory::get_product_balance,
        handlers::inventory::link_supplier,
        handlers::inventory::unlink_supplier,
        handlers::inventory::link_category,
        handlers::inventory::unlink_category,
        handlers::inventory::product_form_data,
        handlers::inventory::import_products,
        handlers::inventory::print_labels,

        // --- Fornecedores / Naturezas ---
        handlers::lookups::list_suppliers,
        handlers::lookups::create_supplier,
        handlers::lookups::get_supplier,
        handlers::lookups::update_supplier,
        handlers::lookups::delete_supplier,
        handlers::lookups::list_categories,
        handlers::lookups::create_category,
        handlers::lookups::get_category,
        handlers::lookups::update_category,
        handlers::lookups::delete_category,

        // --- Estoque ---
        handlers::stock::stock_entry,
        handlers::stock::stock_exit,
        handlers::stock::list_balances,
        handlers::stock::list_movements,

        // --- Documentos ---
        handlers::documents::list_services,
        handlers::documents::create_service,
        handlers::documents::get_service,
        handlers::documents::document_history,
        handlers::documents::generate_document,
        handlers::documents::get_document,
        handlers::documents::download_document,
        handlers::documents::delete_document,

        // --- Dashboard / Relatórios ---
        handlers::dashboard::get_kpis,
        handlers::reports::inventory_report,
        handlers::reports::movement_report,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::ChangePasswordPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::MessageResponse,

            // --- Inventory ---
            models::inventory::Product,
            models::inventory::ProductListItem,
            models::inventory::NamedRef,
            models::inventory::ProductDetail,
            models::inventory::ProductPayload,
            models::inventory::ProductCreatedResponse,
            models::inventory::Supplier,
            models::inventory::Category,
            models::inventory::NamePayload,
            models::inventory::SupplierLinkPayload,
            models::inventory::CategoryLinkPayload,
            models::inventory::ProductFormData,
            models::inventory::ProductFormProduct,
            models::inventory::MovementType,
            models::inventory::StockMovement,
            models::inventory::MovementHistoryEntry,
            models::inventory::StockEntryPayload,
            models::inventory::StockExitPayload,
            models::inventory::MovementResponse,
            models::inventory::ProductBalance,
            models::inventory::BalanceEntry,
            services::import_service::ImportSummary,

            // --- Documentos ---
            models::documents::Service,
            models::documents::CreateServicePayload,
            models::documents::GeneratedDocument,
            models::documents::DocumentHistoryEntry,
            models::documents::DocumentCreatedResponse,

            // --- Dashboard / Relatórios ---
            models::dashboard::DashboardKpis,
            models::reports::ReportFormat,
            models::reports::InventoryReportRow,
            models::reports::MovementReportRow,
            models::reports::LabelRequest,
        )
    ),
    tags(
        (name = "Sistema", description = "Versão e saúde do servidor"),
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Usuários e senha"),
        (name = "Produtos", description = "Cadastro de produtos, importação e etiquetas"),
        (name = "Fornecedores", description = "Cadastro de fornecedores"),
        (name = "Naturezas", description = "Cadastro de naturezas (categorias)"),
        (name = "Estoque", description = "Entradas, saídas e saldos"),
        (name = "Documentos", description = "Serviços e documentação técnica versionada"),
        (name = "Dashboard", description = "Indicadores"),
        (name = "Relatórios", description = "Inventário e movimentações em PDF/XLSX")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
