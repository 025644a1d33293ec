// src/services/report_service.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use genpdf::{elements, style, Alignment, Element};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, StockRepository},
    models::{
        inventory::{MovementType, Product},
        reports::{InventoryReportRow, MovementReportQuery, MovementReportRow, ReportFormat, ReportMovement},
    },
    services::pdf::{self, PdfStyle},
};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const INVENTORY_HEADERS: [&str; 5] = ["Código", "Nome", "Saldo", "Preço Unit. (R$)", "Valor Total (R$)"];
const MOVEMENT_HEADERS: [&str; 8] = ["Data", "Código", "Produto", "Tipo", "Qtd", "Saldo", "Usuário", "Motivo"];

/// Arquivo pronto para download.
#[derive(Debug)]
pub struct ReportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum MovementReport {
    Rows(Vec<MovementReportRow>),
    File(ReportFile),
}

/// Percorre as movimentações (cronológicas por produto) acumulando o saldo
/// a partir do saldo de abertura. O filtro de tipo só é aplicado depois,
/// então o saldo continua correto mesmo com linhas escondidas.
pub fn running_balances(
    movements: Vec<ReportMovement>,
    opening: &HashMap<i32, i64>,
    tipo: Option<MovementType>,
) -> Vec<MovementReportRow> {
    let mut balances: HashMap<i32, i64> = HashMap::new();
    let mut rows = Vec::with_capacity(movements.len());

    for m in movements {
        let balance = balances
            .entry(m.product_id)
            .or_insert_with(|| opening.get(&m.product_id).copied().unwrap_or(0));
        *balance += m.movement_type.signed(m.quantity);

        if tipo.is_some_and(|t| t != m.movement_type) {
            continue;
        }
        rows.push(MovementReportRow {
            created_at: m.created_at,
            product_code: m.product_code,
            product_name: m.product_name,
            movement_type: m.movement_type,
            quantity: m.quantity,
            balance_after: *balance,
            user_name: m.user_name,
            reason: m.reason.unwrap_or_default(),
        });
    }

    // Mais recentes primeiro
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Converte o período do filtro em limites `[de, até)`; `dataFim` inclui o dia todo.
pub fn report_window(
    data_inicio: Option<NaiveDate>,
    data_fim: Option<NaiveDate>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    if let (Some(inicio), Some(fim)) = (data_inicio, data_fim) {
        if inicio > fim {
            return Err(AppError::BadRequest(
                "dataInicio não pode ser posterior a dataFim.".into(),
            ));
        }
    }
    let from = data_inicio.map(start_of_day);
    let until = data_fim.and_then(|d| d.succ_opt()).map(start_of_day);
    Ok((from, until))
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2)).replace('.', ",")
}

fn movement_label(kind: MovementType) -> &'static str {
    match kind {
        MovementType::Entrada => "Entrada",
        MovementType::Saida => "Saída",
    }
}

fn xlsx_err(e: XlsxError) -> AppError {
    AppError::RenderError(e.to_string())
}

// ---
// Renderização
// ---

fn inventory_pdf(style: &PdfStyle, rows: &[InventoryReportRow]) -> Result<Vec<u8>, AppError> {
    let mut doc = style.new_document("Relatório de Inventário", 10)?;
    doc.push(pdf::heading("RELATÓRIO DE INVENTÁRIO", 16));
    doc.push(elements::Paragraph::new(format!("Emitido em {}", Utc::now().format("%d/%m/%Y %H:%M"))));
    doc.push(elements::Break::new(1));

    let mut table = pdf::table(vec![2, 5, 1, 2, 2], &INVENTORY_HEADERS)?;
    let mut total = Decimal::ZERO;
    for row in rows {
        let value = row.total_value();
        total += value;
        pdf::push_row(
            &mut table,
            &[
                row.code.clone(),
                row.name.clone(),
                row.balance.to_string(),
                money(row.price),
                money(value),
            ],
        )?;
    }
    doc.push(table);

    doc.push(elements::Break::new(1));
    doc.push(
        elements::Paragraph::new(format!("Valor total do estoque: R$ {}", money(total)))
            .aligned(Alignment::Right)
            .styled(style::Style::new().bold()),
    );
    pdf::render(doc)
}

fn inventory_xlsx(rows: &[InventoryReportRow]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let currency = Format::new().set_num_format("#,##0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name("Inventário").map_err(xlsx_err)?;
    for (col, header) in INVENTORY_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold).map_err(xlsx_err)?;
    }

    let mut total = Decimal::ZERO;
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        let value = row.total_value();
        total += value;
        sheet.write_string(r, 0, &row.code).map_err(xlsx_err)?;
        sheet.write_string(r, 1, &row.name).map_err(xlsx_err)?;
        sheet.write_number(r, 2, row.balance as f64).map_err(xlsx_err)?;
        sheet
            .write_number_with_format(r, 3, row.price.to_f64().unwrap_or_default(), &currency)
            .map_err(xlsx_err)?;
        sheet
            .write_number_with_format(r, 4, value.to_f64().unwrap_or_default(), &currency)
            .map_err(xlsx_err)?;
    }

    let total_row = rows.len() as u32 + 1;
    sheet.write_string_with_format(total_row, 3, "Total", &bold).map_err(xlsx_err)?;
    sheet
        .write_number_with_format(total_row, 4, total.to_f64().unwrap_or_default(), &currency)
        .map_err(xlsx_err)?;
    sheet.set_column_width(1, 40).map_err(xlsx_err)?;

    workbook.save_to_buffer().map_err(xlsx_err)
}

fn movements_pdf(style: &PdfStyle, rows: &[MovementReportRow], period: &str) -> Result<Vec<u8>, AppError> {
    let mut doc = style.new_document("Relatório de Movimentações", 10)?;
    // Paisagem: oito colunas
    doc.set_paper_size(genpdf::Size::new(297, 210));
    doc.push(pdf::heading("RELATÓRIO DE MOVIMENTAÇÕES", 16));
    doc.push(elements::Paragraph::new(period.to_string()));
    doc.push(elements::Break::new(1));

    let mut table = pdf::table(vec![3, 2, 5, 2, 1, 1, 3, 5], &MOVEMENT_HEADERS)?;
    for row in rows {
        pdf::push_row(
            &mut table,
            &[
                row.created_at.format("%d/%m/%Y %H:%M").to_string(),
                row.product_code.clone(),
                row.product_name.clone(),
                movement_label(row.movement_type).to_string(),
                row.quantity.to_string(),
                row.balance_after.to_string(),
                row.user_name.clone(),
                row.reason.clone(),
            ],
        )?;
    }
    doc.push(table);
    pdf::render(doc)
}

fn movements_xlsx(rows: &[MovementReportRow]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Movimentações").map_err(xlsx_err)?;
    for (col, header) in MOVEMENT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold).map_err(xlsx_err)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet
            .write_string(r, 0, row.created_at.format("%d/%m/%Y %H:%M").to_string())
            .map_err(xlsx_err)?;
        sheet.write_string(r, 1, &row.product_code).map_err(xlsx_err)?;
        sheet.write_string(r, 2, &row.product_name).map_err(xlsx_err)?;
        sheet.write_string(r, 3, movement_label(row.movement_type)).map_err(xlsx_err)?;
        sheet.write_number(r, 4, f64::from(row.quantity)).map_err(xlsx_err)?;
        sheet.write_number(r, 5, row.balance_after as f64).map_err(xlsx_err)?;
        sheet.write_string(r, 6, &row.user_name).map_err(xlsx_err)?;
        sheet.write_string(r, 7, &row.reason).map_err(xlsx_err)?;
    }
    sheet.set_column_width(2, 35).map_err(xlsx_err)?;
    sheet.set_column_width(7, 40).map_err(xlsx_err)?;

    workbook.save_to_buffer().map_err(xlsx_err)
}

fn labels_pdf(style: &PdfStyle, products: &[Product]) -> Result<Vec<u8>, AppError> {
    let mut doc = style.new_document("Etiquetas", 3)?;
    doc.set_paper_size(genpdf::Size::new(62, 100));

    for (i, product) in products.iter().enumerate() {
        if i > 0 {
            doc.push(elements::PageBreak::new());
        }
        doc.push(
            elements::Paragraph::new(product.name.clone())
                .aligned(Alignment::Center)
                .styled(style::Style::new().bold().with_font_size(10)),
        );
        doc.push(elements::Break::new(0.5));
        doc.push(pdf::barcode_element(&product.code)?);
        doc.push(
            elements::Paragraph::new(product.code.clone())
                .aligned(Alignment::Center)
                .styled(style::Style::new().with_font_size(9)),
        );
    }
    pdf::render(doc)
}

async fn off_runtime<F>(job: F) -> Result<Vec<u8>, AppError>
where
    F: FnOnce() -> Result<Vec<u8>, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de relatório: {}", e))?
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct ReportService {
    stock_repo: StockRepository,
    inventory_repo: InventoryRepository,
    pdf_style: PdfStyle,
    pool: PgPool,
}

impl ReportService {
    pub fn new(
        stock_repo: StockRepository,
        inventory_repo: InventoryRepository,
        pdf_style: PdfStyle,
        pool: PgPool,
    ) -> Self {
        Self { stock_repo, inventory_repo, pdf_style, pool }
    }

    pub async fn inventory_report(&self, format: ReportFormat) -> Result<ReportFile, AppError> {
        let rows = self.stock_repo.inventory_rows(&self.pool).await?;
        let stamp = Utc::now().format("%Y%m%d");

        match format {
            ReportFormat::Pdf => {
                let style = self.pdf_style.clone();
                let bytes = off_runtime(move || inventory_pdf(&style, &rows)).await?;
                Ok(ReportFile {
                    filename: format!("inventario_{}.pdf", stamp),
                    content_type: PDF_CONTENT_TYPE,
                    bytes,
                })
            }
            ReportFormat::Xlsx => {
                let bytes = off_runtime(move || inventory_xlsx(&rows)).await?;
                Ok(ReportFile {
                    filename: format!("inventario_{}.xlsx", stamp),
                    content_type: XLSX_CONTENT_TYPE,
                    bytes,
                })
            }
            ReportFormat::Json => Err(AppError::BadRequest(
                "Formato inválido para o inventário. Use pdf ou xlsx.".into(),
            )),
        }
    }

    pub async fn movement_rows(&self, query: &MovementReportQuery) -> Result<Vec<MovementReportRow>, AppError> {
        let (from, until) = report_window(query.data_inicio, query.data_fim)?;
        let movements = self.stock_repo.movements_between(&self.pool, from, until).await?;

        // Saldo de abertura só existe quando há data inicial
        let opening: HashMap<i32, i64> = match from {
            Some(from) if !movements.is_empty() => {
                let mut ids: Vec<i32> = movements.iter().map(|m| m.product_id).collect();
                ids.dedup();
                self.stock_repo
                    .balances_before(&self.pool, &ids, from)
                    .await?
                    .into_iter()
                    .collect()
            }
            _ => HashMap::new(),
        };

        Ok(running_balances(movements, &opening, query.tipo))
    }

    pub async fn movement_report(&self, query: &MovementReportQuery) -> Result<MovementReport, AppError> {
        let rows = self.movement_rows(query).await?;
        let stamp = Utc::now().format("%Y%m%d");

        match query.formato.unwrap_or(ReportFormat::Json) {
            ReportFormat::Json => Ok(MovementReport::Rows(rows)),
            ReportFormat::Pdf => {
                let style = self.pdf_style.clone();
                let period = describe_period(query.data_inicio, query.data_fim);
                let bytes = off_runtime(move || movements_pdf(&style, &rows, &period)).await?;
                Ok(MovementReport::File(ReportFile {
                    filename: format!("movimentacoes_{}.pdf", stamp),
                    content_type: PDF_CONTENT_TYPE,
                    bytes,
                }))
            }
            ReportFormat::Xlsx => {
                let bytes = off_runtime(move || movements_xlsx(&rows)).await?;
                Ok(MovementReport::File(ReportFile {
                    filename: format!("movimentacoes_{}.xlsx", stamp),
                    content_type: XLSX_CONTENT_TYPE,
                    bytes,
                }))
            }
        }
    }

    /// Etiquetas 62x100 mm, uma por página, com código de barras Code 128.
    pub async fn labels(&self, product_ids: &[i32]) -> Result<ReportFile, AppError> {
        let products = self
            .inventory_repo
            .find_products_by_ids(&self.pool, product_ids)
            .await?;
        if products.is_empty() {
            return Err(AppError::ProductNotFound);
        }

        let style = self.pdf_style.clone();
        let bytes = off_runtime(move || labels_pdf(&style, &products)).await?;
        Ok(ReportFile {
            filename: "etiquetas.pdf".to_string(),
            content_type: PDF_CONTENT_TYPE,
            bytes,
        })
    }
}

fn describe_period(inicio: Option<NaiveDate>, fim: Option<NaiveDate>) -> String {
    let fmt = |d: NaiveDate| d.format("%d/%m/%Y").to_string();
    match (inicio, fim) {
        (Some(i), Some(f)) => format!("Período: {} a {}", fmt(i), fmt(f)),
        (Some(i), None) => format!("A partir de {}", fmt(i)),
        (None, Some(f)) => format!("Até {}", fmt(f)),
        (None, None) => "Período: todas as movimentações".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn movement(product_id: i32, minute: u32, kind: MovementType, quantity: i32) -> ReportMovement {
        ReportMovement {
            product_id,
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 9, minute, 0).unwrap(),
            movement_type: kind,
            quantity,
            reason: None,
            product_code: format!("P{}", product_id),
            product_name: format!("Produto {}", product_id),
            user_name: "Admin".to_string(),
        }
    }

    #[test]
    fn running_balance_starts_from_opening_and_lists_newest_first() {
        let movements = vec![
            movement(1, 0, MovementType::Entrada, 10),
            movement(1, 5, MovementType::Saida, 3),
            movement(2, 2, MovementType::Entrada, 4),
        ];
        let opening = HashMap::from([(1, 5)]);

        let rows = running_balances(movements, &opening, None);

        let balances: Vec<(String, i64)> =
            rows.iter().map(|r| (r.product_code.clone(), r.balance_after)).collect();
        assert_eq!(
            balances,
            vec![("P1".to_string(), 12), ("P2".to_string(), 4), ("P1".to_string(), 15)]
        );
    }

    #[test]
    fn type_filter_keeps_balances_of_hidden_rows() {
        let movements = vec![
            movement(1, 0, MovementType::Entrada, 10),
            movement(1, 1, MovementType::Saida, 4),
            movement(1, 2, MovementType::Entrada, 1),
        ];
        let rows = running_balances(movements, &HashMap::new(), Some(MovementType::Entrada));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].balance_after, 7);
        assert_eq!(rows[1].balance_after, 10);
        assert!(rows.iter().all(|r| r.movement_type == MovementType::Entrada));
    }

    #[test]
    fn end_date_covers_the_whole_day() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (from, until) = report_window(Some(d), Some(d)).unwrap();
        assert_eq!(from, Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()));
        assert_eq!(until, Some(Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap()));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let a = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert!(matches!(report_window(Some(a), Some(b)), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn money_uses_decimal_comma() {
        assert_eq!(money(Decimal::new(123450, 3)), "123,45");
        assert_eq!(money(Decimal::from(7)), "7,00");
    }

    #[test]
    fn inventory_spreadsheet_is_a_zip() {
        let rows = vec![InventoryReportRow {
            code: "A1".into(),
            name: "Parafuso".into(),
            balance: 3,
            price: Decimal::new(250, 2),
        }];
        let bytes = inventory_xlsx(&rows).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
