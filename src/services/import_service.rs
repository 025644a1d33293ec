// src/services/import_service.rs

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::{
    common::{db_utils::split_names, error::AppError},
    db::{InventoryRepository, Lookup, StockRepository},
    models::inventory::{parse_price, MovementType, ProductPayload},
};

pub const IMPORT_ENTRY_REASON: &str = "Balanço Inicial via Importação";

// Uma linha do CSV já validada
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub line: usize,
    pub product: ProductRow,
    pub supplier_names: Vec<String>,
    pub category_names: Vec<String>,
    pub initial_quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: rust_decimal::Decimal,
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub rows: Vec<ImportRow>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub message: String,
    pub imported: usize,
    pub errors: Vec<String>,
}

// ---
// Parte pura: bytes -> linhas validadas
// ---

/// UTF-8 quando possível; senão Latin-1 (cada byte é um code point).
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    if header.contains(';') { b';' } else { b',' }
}

/// Lê o CSV e separa linhas válidas de erros por linha.
/// Linha 1 é o cabeçalho; a numeração dos erros começa em 2.
pub fn parse_csv(bytes: &[u8]) -> Result<ParsedImport, AppError> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(&text))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Cabeçalho do CSV inválido: {}", e)))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (code_col, name_col) = (column("codigo"), column("nome"));
    let price_col = column("preco");
    let description_col = column("descricao");
    let suppliers_col = column("fornecedores_nomes");
    let categories_col = column("naturezas_nomes");
    let quantity_col = column("quantidade");

    let mut parsed = ParsedImport::default();
    let mut seen_codes = HashSet::new();

    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(format!("Linha {}: Erro ao processar - {}.", line, e));
                continue;
            }
        };
        let field = |col: Option<usize>| col.and_then(|i| record.get(i)).unwrap_or("").trim();

        let code = field(code_col);
        let name = field(name_col);
        if code.is_empty() || name.is_empty() {
            parsed.errors.push(format!(
                "Linha {}: Campos obrigatórios (codigo, nome) em falta.",
                line
            ));
            continue;
        }
        if code.chars().count() > 20 {
            parsed.errors.push(format!(
                "Linha {}: Erro ao processar - código com mais de 20 caracteres.",
                line
            ));
            continue;
        }

        let price = match parse_price(field(price_col)) {
            Ok(price) if !price.is_sign_negative() => price,
            Ok(_) => {
                parsed.errors.push(format!("Linha {}: Erro ao processar - preço negativo.", line));
                continue;
            }
            Err(msg) => {
                parsed.errors.push(format!("Linha {}: Erro ao processar - {}.", line, msg));
                continue;
            }
        };

        let quantity_raw = field(quantity_col);
        let initial_quantity = if quantity_raw.is_empty() {
            0
        } else {
            match quantity_raw.parse::<i32>() {
                Ok(q) => q,
                Err(_) => {
                    parsed.errors.push(format!(
                        "Linha {}: Erro ao processar - quantidade inválida '{}'.",
                        line, quantity_raw
                    ));
                    continue;
                }
            }
        };

        // Duplicata dentro do próprio arquivo
        if !seen_codes.insert(code.to_string()) {
            parsed.errors.push(format!("Linha {}: Código '{}' já existe.", line, code));
            continue;
        }

        let description = field(description_col);
        parsed.rows.push(ImportRow {
            line,
            product: ProductRow {
                code: code.to_string(),
                name: name.to_string(),
                description: (!description.is_empty()).then(|| description.to_string()),
                price,
            },
            supplier_names: split_names(field(suppliers_col)),
            category_names: split_names(field(categories_col)),
            initial_quantity,
        });
    }

    Ok(parsed)
}

// ---
// Parte com banco: cada linha na sua própria transação
// ---

#[derive(Clone)]
pub struct ImportService {
    inventory_repo: InventoryRepository,
    stock_repo: StockRepository,
    pool: PgPool,
}

impl ImportService {
    pub fn new(inventory_repo: InventoryRepository, stock_repo: StockRepository, pool: PgPool) -> Self {
        Self { inventory_repo, stock_repo, pool }
    }

    pub async fn import_csv(&self, user_id: i32, bytes: &[u8]) -> Result<ImportSummary, AppError> {
        let ParsedImport { rows, mut errors } = parse_csv(bytes)?;
        let mut imported = 0;

        for row in &rows {
            match self.import_row(user_id, row).await {
                Ok(()) => imported += 1,
                Err(AppError::ProductCodeAlreadyExists(code)) => {
                    errors.push(format!("Linha {}: Código '{}' já existe.", row.line, code));
                }
                Err(e) => {
                    tracing::warn!("Importação, linha {}: {}", row.line, e);
                    errors.push(format!("Linha {}: Erro ao processar - {}.", row.line, e));
                }
            }
        }

        // Mantém a ordem do arquivo na lista de erros
        errors.sort_by_key(|msg| line_of(msg));

        tracing::info!("📑 Importação: {} produto(s), {} erro(s).", imported, errors.len());
        Ok(ImportSummary { message: "Importação concluída!".into(), imported, errors })
    }

    async fn import_row(&self, user_id: i32, row: &ImportRow) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let payload = ProductPayload {
            code: row.product.code.clone(),
            name: row.product.name.clone(),
            description: row.product.description.clone(),
            price: row.product.price,
            code_b: None,
            code_c: None,
            supplier_ids: None,
            category_ids: None,
        };
        let product = self.inventory_repo.create_product(&mut *tx, &payload).await?;

        if !row.supplier_names.is_empty() {
            self.inventory_repo
                .link_names(&mut *tx, Lookup::Suppliers, product.id, &row.supplier_names)
                .await?;
        }
        if !row.category_names.is_empty() {
            self.inventory_repo
                .link_names(&mut *tx, Lookup::Categories, product.id, &row.category_names)
                .await?;
        }

        if row.initial_quantity > 0 {
            self.stock_repo
                .record_movement(
                    &mut *tx,
                    product.id,
                    user_id,
                    row.initial_quantity,
                    MovementType::Entrada,
                    Some(IMPORT_ENTRY_REASON),
                )
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn line_of(message: &str) -> usize {
    message
        .strip_prefix("Linha ")
        .and_then(|rest| rest.split(':').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn three_valid_rows_and_one_missing_name() {
        let csv = "codigo,nome,preco,quantidade\n\
                   A1,Arruela,\"1,50\",10\n\
                   A2,,2.00,5\n\
                   A3,Porca,0.30,\n\
                   A4,Parafuso,0.75,3\n";
        let parsed = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.errors, vec!["Linha 3: Campos obrigatórios (codigo, nome) em falta."]);
        assert_eq!(parsed.rows[0].product.price, Decimal::new(150, 2));
        assert_eq!(parsed.rows[1].initial_quantity, 0);
        assert_eq!(parsed.rows[2].line, 5);
    }

    #[test]
    fn semicolon_header_switches_delimiter() {
        let csv = "codigo;nome;preco;fornecedores_nomes;naturezas_nomes\n\
                   B1;Broca 6mm;12,90;Acme, Bosch;Ferramentas\n";
        let parsed = parse_csv(csv.as_bytes()).unwrap();

        assert!(parsed.errors.is_empty());
        let row = &parsed.rows[0];
        assert_eq!(row.product.price, Decimal::new(1290, 2));
        assert_eq!(row.supplier_names, vec!["Acme", "Bosch"]);
        assert_eq!(row.category_names, vec!["Ferramentas"]);
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        // "Ação" em Latin-1
        let mut bytes = b"codigo,nome\nC1,A".to_vec();
        bytes.extend_from_slice(&[0xE7, 0xE3]);
        bytes.extend_from_slice(b"o\n");
        let parsed = parse_csv(&bytes).unwrap();
        assert_eq!(parsed.rows[0].product.name, "Ação");
    }

    #[test]
    fn repeated_code_in_same_file_is_reported() {
        let csv = "codigo,nome\nD1,Um\nD1,Outro\n";
        let parsed = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.errors, vec!["Linha 3: Código 'D1' já existe."]);
    }

    #[test]
    fn bad_quantity_and_price_are_line_errors() {
        let csv = "codigo,nome,preco,quantidade\nE1,Um,abc,1\nE2,Dois,1,muitos\nE3,Tres,1,2\n";
        let parsed = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.errors.len(), 2);
        assert!(parsed.errors[0].starts_with("Linha 2:"));
        assert!(parsed.errors[1].starts_with("Linha 3:"));
    }

    #[test]
    fn headers_are_case_insensitive() {
        let csv = "CODIGO,Nome\nF1,Fita\n";
        let parsed = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn error_lines_sort_numerically() {
        let mut errors = vec!["Linha 10: x".to_string(), "Linha 2: y".to_string()];
        errors.sort_by_key(|m| line_of(m));
        assert_eq!(errors[0], "Linha 2: y");
    }
}
