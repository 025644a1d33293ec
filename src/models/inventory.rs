// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

// --- 1. Produtos ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "PRF-001")]
    pub code: String,
    pub code_b: Option<String>,
    pub code_c: Option<String>,
    #[schema(example = "Parafuso sextavado M8")]
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64, example = 1.25)]
    pub price: Decimal,
}

// Linha da listagem: fornecedores e naturezas já vêm como "A, B" ordenados
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListItem {
    pub id: i32,
    pub code: String,
    pub code_b: Option<String>,
    pub code_c: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[schema(example = "Acme, Metalúrgica Sul")]
    pub suppliers: String,
    pub categories: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}

// Detalhe do produto com as associações completas
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub suppliers: Vec<NamedRef>,
    pub categories: Vec<NamedRef>,
}

// Preço aceita número JSON ou texto com vírgula decimal ("12,50")
fn deserialize_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    match RawPrice::deserialize(deserializer)? {
        RawPrice::Number(n) => Decimal::try_from(n)
            .map(|d| d.round_dp(2))
            .map_err(serde::de::Error::custom),
        RawPrice::Text(s) => parse_price(&s).map_err(serde::de::Error::custom),
    }
}

/// Converte o preço digitado (vírgula ou ponto) em `Decimal`. Vazio vira zero.
pub fn parse_price(raw: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&trimmed.replace(',', "."))
        .map(|d| d.round_dp(2))
        .map_err(|_| format!("Preço inválido: '{}'", trimmed))
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O preço não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("O campo não pode ficar em branco.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(
        length(max = 20, message = "O código deve ter no máximo 20 caracteres."),
        custom(function = "validate_not_blank")
    )]
    pub code: String,
    #[validate(
        length(max = 100, message = "O nome deve ter no máximo 100 caracteres."),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default, deserialize_with = "deserialize_price")]
    #[schema(value_type = f64, example = "12,50")]
    pub price: Decimal,
    #[validate(length(max = 20, message = "O código B deve ter no máximo 20 caracteres."))]
    pub code_b: Option<String>,
    #[validate(length(max = 20, message = "O código C deve ter no máximo 20 caracteres."))]
    pub code_c: Option<String>,
    // Quando presentes, substituem as associações existentes
    pub supplier_ids: Option<Vec<i32>>,
    pub category_ids: Option<Vec<i32>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreatedResponse {
    pub message: String,
    pub id: i32,
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct SearchQuery {
    /// Filtra por nome ou qualquer um dos códigos
    pub search: Option<String>,
}

// --- 2. Fornecedores e Naturezas ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i32,
    #[schema(example = "Acme Ltda")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    #[schema(example = "Fixadores")]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct NamePayload {
    #[validate(
        length(max = 100, message = "O nome deve ter no máximo 100 caracteres."),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierLinkPayload {
    pub supplier_id: i32,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLinkPayload {
    pub category_id: i32,
}

// Dados para montar o formulário de produto no cliente
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductFormData {
    pub suppliers: Vec<Supplier>,
    pub categories: Vec<Category>,
    pub product: Option<ProductFormProduct>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductFormProduct {
    #[serde(flatten)]
    pub product: Product,
    pub supplier_ids: Vec<i32>,
    pub category_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductFormQuery {
    pub produto_id: Option<i32>,
}

// --- 3. Movimentações ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "movement_type")]
pub enum MovementType {
    Entrada,
    Saida,
}

impl MovementType {
    /// Sinal da quantidade no saldo.
    pub fn signed(self, quantity: i32) -> i64 {
        match self {
            MovementType::Entrada => i64::from(quantity),
            MovementType::Saida => -i64::from(quantity),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: i32,
    pub product_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub reason: Option<String>,
}

// Histórico com os nomes já resolvidos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementHistoryEntry {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub reason: Option<String>,
    pub product_id: i32,
    pub product_code: String,
    pub product_name: String,
    pub user_name: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockEntryPayload {
    pub product_id: i32,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    #[validate(length(max = 200, message = "O motivo deve ter no máximo 200 caracteres."))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockExitPayload {
    pub product_id: i32,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    #[validate(
        length(max = 200, message = "O motivo deve ter no máximo 200 caracteres."),
        custom(function = "validate_not_blank")
    )]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementResponse {
    pub message: String,
    pub new_balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductBalance {
    pub product_id: i32,
    pub balance: i64,
}

// Linha da tela de saldos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub product_id: i32,
    pub code: String,
    pub code_b: Option<String>,
    pub code_c: Option<String>,
    pub name: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub balance: i64,
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct MovementQuery {
    /// "Entrada" ou "Saida"; outros valores são ignorados
    pub tipo: Option<String>,
}

impl MovementQuery {
    pub fn movement_type(&self) -> Option<MovementType> {
        match self.tipo.as_deref() {
            Some("Entrada") => Some(MovementType::Entrada),
            Some("Saida") => Some(MovementType::Saida),
            _ => None,
        }
    }
}

// ---
// Regras puras de saldo
// ---

/// Soma com sinal das movimentações (Entrada +, Saida −). Sem movimentações, zero.
pub fn balance_of<I>(movements: I) -> i64
where
    I: IntoIterator<Item = (MovementType, i32)>,
{
    movements
        .into_iter()
        .map(|(kind, quantity)| kind.signed(quantity))
        .sum()
}

/// Valida uma saída contra o saldo atual e devolve o saldo resultante.
pub fn apply_withdrawal(current_balance: i64, quantity: i32) -> Result<i64, i64> {
    let quantity = i64::from(quantity);
    if quantity > current_balance {
        return Err(current_balance);
    }
    Ok(current_balance - quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use MovementType::{Entrada, Saida};

    #[test]
    fn balance_without_movements_is_zero() {
        assert_eq!(balance_of(Vec::new()), 0);
    }

    #[test]
    fn balance_is_signed_sum() {
        let movements = vec![(Entrada, 10), (Saida, 3), (Entrada, 5), (Saida, 2)];
        assert_eq!(balance_of(movements), 10 - 3 + 5 - 2);
    }

    #[test]
    fn balance_does_not_depend_on_order() {
        let mut movements = vec![(Entrada, 7), (Saida, 4), (Entrada, 1), (Saida, 1)];
        let forward = balance_of(movements.clone());
        movements.reverse();
        assert_eq!(forward, balance_of(movements.clone()));
        movements.rotate_left(2);
        assert_eq!(forward, balance_of(movements));
    }

    #[test]
    fn withdrawal_above_balance_is_rejected() {
        assert_eq!(apply_withdrawal(5, 6), Err(5));
    }

    #[test]
    fn withdrawal_of_whole_balance_is_allowed() {
        assert_eq!(apply_withdrawal(5, 5), Ok(0));
        assert_eq!(apply_withdrawal(5, 2), Ok(3));
    }

    #[test]
    fn price_accepts_decimal_comma() {
        assert_eq!(parse_price("12,50").unwrap(), Decimal::new(1250, 2));
        assert_eq!(parse_price(" 3.1 ").unwrap(), Decimal::new(31, 1));
        assert_eq!(parse_price("").unwrap(), Decimal::ZERO);
        assert!(parse_price("doze").is_err());
    }

    #[test]
    fn product_payload_reads_price_as_text_or_number() {
        let from_text: ProductPayload =
            serde_json::from_str(r#"{"code":"A1","name":"Item","price":"7,30"}"#).unwrap();
        assert_eq!(from_text.price, Decimal::new(730, 2));

        let from_number: ProductPayload =
            serde_json::from_str(r#"{"code":"A1","name":"Item","price":7.3}"#).unwrap();
        assert_eq!(from_number.price, Decimal::new(73, 1));

        let missing: ProductPayload =
            serde_json::from_str(r#"{"code":"A1","name":"Item"}"#).unwrap();
        assert_eq!(missing.price, Decimal::ZERO);
    }

    #[test]
    fn blank_code_fails_validation() {
        let payload: ProductPayload =
            serde_json::from_str(r#"{"code":"  ","name":"Item"}"#).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn exit_requires_reason() {
        let payload = StockExitPayload { product_id: 1, quantity: 1, reason: " ".into() };
        assert!(payload.validate().is_err());
    }
}
