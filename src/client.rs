// src/client.rs
//
// Cliente HTTP tipado da API, usado pelo `estoque-cli`.

use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::{
    models::{
        auth::{AuthResponse, MessageResponse},
        dashboard::DashboardKpis,
        documents::{DocumentCreatedResponse, DocumentHistoryEntry, Service},
        inventory::{
            BalanceEntry, Category, MovementHistoryEntry, MovementResponse, MovementType, ProductBalance,
            ProductCreatedResponse, ProductDetail, ProductListItem, ProductPayload, Supplier,
        },
        reports::{MovementReportRow, ReportFormat},
    },
    services::import_service::ImportSummary,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Falha de conexão com o servidor: {0}")]
    Connection(String),

    // Mensagem do servidor repassada como veio
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Resposta inesperada do servidor: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Connection(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Perfil devolvido por `/usuario/me` (o hash da senha nunca é enviado).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub login: String,
    pub role: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_inicio: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_fim: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<MovementType>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}/api{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // Erros HTTP viram ClientError::Api com a mensagem do corpo `{"error": ...}`
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| if text.is_empty() { status.to_string() } else { text });
        Err(ClientError::Api { status, message })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(builder.send().await?).await?;
        response.json::<T>().await.map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_bytes(&self, builder: RequestBuilder) -> Result<Vec<u8>, ClientError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // --- AUTH ---

    /// Autentica e guarda o token para as próximas chamadas.
    pub async fn login(&mut self, login: &str, password: &str) -> Result<String, ClientError> {
        let body = json!({ "login": login, "password": password });
        let auth: AuthResponse = self.send(self.request(Method::POST, "/login").json(&body)).await?;
        self.token = Some(auth.access_token.clone());
        Ok(auth.access_token)
    }

    pub async fn me(&self) -> Result<Profile, ClientError> {
        self.send(self.request(Method::GET, "/usuario/me")).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<MessageResponse, ClientError> {
        let body = json!({
            "currentPassword": current_password,
            "newPassword": new_password,
            "confirmation": confirmation,
        });
        self.send(self.request(Method::POST, "/usuario/mudar-senha").json(&body)).await
    }

    pub async fn version(&self) -> Result<serde_json::Value, ClientError> {
        self.send(self.request(Method::GET, "/versao")).await
    }

    // --- PRODUTOS ---

    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<ProductListItem>, ClientError> {
        let mut builder = self.request(Method::GET, "/produtos");
        if let Some(search) = search {
            builder = builder.query(&[("search", search)]);
        }
        self.send(builder).await
    }

    pub async fn get_product(&self, id: i32) -> Result<ProductDetail, ClientError> {
        self.send(self.request(Method::GET, &format!("/produtos/{}", id))).await
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<ProductCreatedResponse, ClientError> {
        self.send(self.request(Method::POST, "/produtos").json(payload)).await
    }

    pub async fn delete_product(&self, id: i32) -> Result<MessageResponse, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/produtos/{}", id))).await
    }

    pub async fn product_balance(&self, id: i32) -> Result<ProductBalance, ClientError> {
        self.send(self.request(Method::GET, &format!("/produtos/{}/estoque", id))).await
    }

    pub async fn import_csv(&self, filename: &str, bytes: Vec<u8>) -> Result<ImportSummary, ClientError> {
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);
        self.send(self.request(Method::POST, "/produtos/importar").multipart(form)).await
    }

    pub async fn labels(&self, product_ids: &[i32]) -> Result<Vec<u8>, ClientError> {
        let body = json!({ "productIds": product_ids });
        self.send_bytes(self.request(Method::POST, "/produtos/etiquetas").json(&body)).await
    }

    // --- FORNECEDORES / NATUREZAS ---

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, ClientError> {
        self.send(self.request(Method::GET, "/fornecedores")).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        self.send(self.request(Method::GET, "/naturezas")).await
    }

    // --- ESTOQUE ---

    pub async fn record_entry(
        &self,
        product_id: i32,
        quantity: i32,
        reason: Option<&str>,
    ) -> Result<MovementResponse, ClientError> {
        let body = json!({ "productId": product_id, "quantity": quantity, "reason": reason });
        self.send(self.request(Method::POST, "/estoque/entrada").json(&body)).await
    }

    pub async fn record_exit(
        &self,
        product_id: i32,
        quantity: i32,
        reason: &str,
    ) -> Result<MovementResponse, ClientError> {
        let body = json!({ "productId": product_id, "quantity": quantity, "reason": reason });
        self.send(self.request(Method::POST, "/estoque/saida").json(&body)).await
    }

    pub async fn balances(&self, search: Option<&str>) -> Result<Vec<BalanceEntry>, ClientError> {
        let mut builder = self.request(Method::GET, "/estoque/saldos");
        if let Some(search) = search {
            builder = builder.query(&[("search", search)]);
        }
        self.send(builder).await
    }

    pub async fn movements(&self, tipo: Option<MovementType>) -> Result<Vec<MovementHistoryEntry>, ClientError> {
        let filter = MovementFilter { tipo, ..Default::default() };
        self.send(self.request(Method::GET, "/movimentacoes").query(&filter)).await
    }

    pub async fn dashboard(&self) -> Result<DashboardKpis, ClientError> {
        self.send(self.request(Method::GET, "/dashboard/kpis")).await
    }

    // --- DOCUMENTOS ---

    pub async fn list_services(&self) -> Result<Vec<Service>, ClientError> {
        self.send(self.request(Method::GET, "/servicos")).await
    }

    pub async fn document_history(&self, service_id: i32) -> Result<Vec<DocumentHistoryEntry>, ClientError> {
        self.send(self.request(Method::GET, &format!("/servicos/{}/documentos", service_id)))
            .await
    }

    pub async fn generate_document(
        &self,
        service_id: i32,
        form: &serde_json::Value,
        attachments: Vec<(String, Vec<u8>)>,
    ) -> Result<DocumentCreatedResponse, ClientError> {
        let mut multipart_form = multipart::Form::new().text("dados_formulario", form.to_string());
        for (filename, bytes) in attachments {
            let part = multipart::Part::bytes(bytes)
                .file_name(filename)
                .mime_str("application/pdf")
                .map_err(|e| ClientError::Decode(e.to_string()))?;
            multipart_form = multipart_form.part("anexos", part);
        }
        self.send(
            self.request(Method::POST, &format!("/servicos/{}/documentos", service_id))
                .multipart(multipart_form),
        )
        .await
    }

    pub async fn download_document(&self, document_id: i32) -> Result<Vec<u8>, ClientError> {
        self.send_bytes(self.request(Method::GET, &format!("/documentos/{}/pdf", document_id)))
            .await
    }

    // --- RELATÓRIOS ---

    pub async fn inventory_report(&self, format: ReportFormat) -> Result<Vec<u8>, ClientError> {
        self.send_bytes(
            self.request(Method::GET, "/relatorios/inventario")
                .query(&[("formato", format)]),
        )
        .await
    }

    pub async fn movement_report_rows(&self, filter: &MovementFilter) -> Result<Vec<MovementReportRow>, ClientError> {
        self.send(self.request(Method::GET, "/relatorios/movimentacoes").query(filter))
            .await
    }

    pub async fn movement_report_file(
        &self,
        filter: &MovementFilter,
        format: ReportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        self.send_bytes(
            self.request(Method::GET, "/relatorios/movimentacoes")
                .query(filter)
                .query(&[("formato", format)]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/", None).unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
        assert!(client.token().is_none());
    }

    #[test]
    fn movement_filter_serializes_camel_case_and_skips_empty() {
        let filter = MovementFilter {
            data_inicio: chrono::NaiveDate::from_ymd_opt(2025, 1, 31),
            data_fim: None,
            tipo: Some(MovementType::Saida),
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value, json!({ "dataInicio": "2025-01-31", "tipo": "Saida" }));
    }

    #[test]
    fn api_error_shows_server_message_verbatim() {
        let err = ClientError::Api {
            status: StatusCode::BAD_REQUEST,
            message: "Estoque insuficiente. Saldo atual: 5".into(),
        };
        assert_eq!(err.to_string(), "Estoque insuficiente. Saldo atual: 5");
    }
}
