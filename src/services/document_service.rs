// src/services/document_service.rs

use chrono::Utc;
use genpdf::elements;
use serde_json::Value;
use sqlx::PgPool;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    common::error::AppError,
    db::DocumentRepository,
    models::documents::{
        document_file_name, next_version, Attachment, DocumentHistoryEntry, GeneratedDocument, Service,
    },
    services::pdf::{self, PdfStyle},
};

// ---
// Layout do formulário
// ---

// Grupos do formulário na ordem em que aparecem no documento
const SECTIONS: [(&str, &str); 8] = [
    ("identificacao_projeto", "Identificação do Projeto"),
    ("escopo_premissas", "Escopo e Premissas"),
    ("diagramas_desenhos", "Diagramas e Desenhos"),
    ("testes_comissionamento", "Testes e Comissionamento"),
    ("operacao_manutencao", "Operação e Manutenção"),
    ("treinamento", "Treinamento"),
    ("documentos_as_built", "Documentos As Built"),
    ("anexos", "Anexos"),
];

struct TableSpec {
    path: &'static [&'static str],
    title: &'static str,
    keys: &'static [&'static str],
    headers: &'static [&'static str],
    weights: &'static [usize],
}

const TABLES: [TableSpec; 5] = [
    TableSpec {
        path: &["lista_documentos_projeto"],
        title: "Lista de Documentos do Projeto",
        keys: &["titulo", "codigo", "revisao", "data", "autor", "status"],
        headers: &["Título", "Código", "Revisão", "Data", "Autor", "Status"],
        weights: &[4, 2, 1, 2, 2, 2],
    },
    TableSpec {
        path: &["lista_instrumentos"],
        title: "Lista de Instrumentos",
        keys: &["tag", "descricao", "fabricante_modelo", "faixa", "sinal", "localizacao"],
        headers: &["Tag", "Descrição", "Fabricante/Modelo", "Faixa", "Sinal", "Localização"],
        weights: &[2, 4, 3, 2, 2, 3],
    },
    TableSpec {
        path: &["programacao_logica"],
        title: "Programação Lógica",
        keys: &["ficheiro", "descricao"],
        headers: &["Ficheiro", "Descrição"],
        weights: &[2, 5],
    },
    TableSpec {
        path: &["treinamento", "participantes"],
        title: "Participantes do Treinamento",
        keys: &["nome", "certificado"],
        headers: &["Nome", "Certificado"],
        weights: &[4, 3],
    },
    TableSpec {
        path: &["documentos_as_built"],
        title: "Documentos As Built",
        keys: &["documento", "notas"],
        headers: &["Documento", "Notas"],
        weights: &[3, 4],
    },
];

#[derive(Debug, PartialEq)]
pub struct FormSection {
    pub title: &'static str,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, PartialEq)]
pub struct FormTable {
    pub title: &'static str,
    pub headers: &'static [&'static str],
    pub weights: &'static [usize],
    pub rows: Vec<Vec<String>>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "Sim" } else { "Não" }.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Separa o formulário em seções de campos simples e tabelas.
/// Grupos desconhecidos são ignorados; listas viram tabelas quando têm layout conhecido.
pub fn layout_form(form: &Value) -> (Vec<FormSection>, Vec<FormTable>) {
    let sections = SECTIONS
        .iter()
        .filter_map(|(key, title)| {
            let group = form.get(*key)?.as_object()?;
            let fields: Vec<(String, String)> = group
                .iter()
                .filter_map(|(k, v)| scalar_text(v).map(|text| (k.replace('_', " "), text)))
                .collect();
            (!fields.is_empty()).then_some(FormSection { title, fields })
        })
        .collect();

    let tables = TABLES
        .iter()
        .filter_map(|layout| {
            let items = layout
                .path
                .iter()
                .try_fold(form, |node, key| node.get(*key))?
                .as_array()?;
            let rows = items
                .iter()
                .map(|item| {
                    layout.keys
                        .iter()
                        .map(|k| item.get(*k).and_then(scalar_text).unwrap_or_default())
                        .collect()
                })
                .collect();
            Some(FormTable { title: layout.title, headers: layout.headers, weights: layout.weights, rows })
        })
        .collect();

    (sections, tables)
}

/// Gera o PDF principal do documento a partir do formulário.
pub fn render_form_pdf(
    style: &PdfStyle,
    service_name: &str,
    version: i32,
    form: &Value,
) -> Result<Vec<u8>, AppError> {
    let mut doc = style.new_document(&format!("{} - v{}", service_name, version), 15)?;

    // --- CABEÇALHO ---
    doc.push(pdf::heading("DOCUMENTAÇÃO TÉCNICA", 18));
    doc.push(elements::Paragraph::new(format!("Serviço: {}", service_name)));
    doc.push(elements::Paragraph::new(format!(
        "Versão {} - gerada em {}",
        version,
        Utc::now().format("%d/%m/%Y")
    )));
    doc.push(elements::Break::new(1.5));

    let (sections, tables) = layout_form(form);

    // --- SEÇÕES ---
    for section in sections {
        doc.push(pdf::heading(section.title, 13));
        for (label, value) in section.fields {
            doc.push(elements::Paragraph::new(format!("{}: {}", label, value)));
        }
        doc.push(elements::Break::new(1));
    }

    // --- TABELAS ---
    for layout in tables {
        doc.push(pdf::heading(layout.title, 12));
        let mut table = pdf::table(layout.weights.to_vec(), layout.headers)?;
        for row in &layout.rows {
            pdf::push_row(&mut table, row)?;
        }
        doc.push(table);
        doc.push(elements::Break::new(1));
    }

    pdf::render(doc)
}

/// Produz o PDF principal de uma versão; os anexos são juntados depois.
pub trait FormRenderer: Send + Sync {
    fn render(&self, service_name: &str, version: i32, form: &Value) -> Result<Vec<u8>, AppError>;
}

impl FormRenderer for PdfStyle {
    fn render(&self, service_name: &str, version: i32, form: &Value) -> Result<Vec<u8>, AppError> {
        render_form_pdf(self, service_name, version, form)
    }
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct DocumentService {
    repo: DocumentRepository,
    renderer: Arc<dyn FormRenderer>,
    documents_dir: PathBuf,
    pool: PgPool,
}

impl DocumentService {
    pub fn new(
        repo: DocumentRepository,
        renderer: Arc<dyn FormRenderer>,
        documents_dir: PathBuf,
        pool: PgPool,
    ) -> Self {
        Self { repo, renderer, documents_dir, pool }
    }

    // --- SERVIÇOS ---

    pub async fn list_services(&self) -> Result<Vec<Service>, AppError> {
        self.repo.list_services(&self.pool).await
    }

    pub async fn get_service(&self, id: i32) -> Result<Service, AppError> {
        self.repo
            .find_service(&self.pool, id)
            .await?
            .ok_or(AppError::ServiceNotFound)
    }

    pub async fn create_service(&self, name: &str, description: Option<&str>) -> Result<Service, AppError> {
        self.repo.create_service(&self.pool, name, description).await
    }

    // --- DOCUMENTOS ---

    pub async fn history(&self, service_id: i32) -> Result<Vec<DocumentHistoryEntry>, AppError> {
        self.get_service(service_id).await?;
        self.repo.history(&self.pool, service_id).await
    }

    pub async fn generate(
        &self,
        service_id: i32,
        user_id: i32,
        form: Value,
        attachments: Vec<Attachment>,
    ) -> Result<GeneratedDocument, AppError> {
        if !form.is_object() {
            return Err(AppError::BadRequest(
                "dados_formulario deve ser um objeto JSON.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // 1. Trava o serviço: a próxima versão é calculada sem corrida
        let service = self
            .repo
            .lock_service(&mut *tx, service_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;
        let version = next_version(self.repo.max_version(&mut *tx, service_id).await?);

        // 2. Renderiza e junta os anexos fora do runtime
        let renderer = Arc::clone(&self.renderer);
        let form_data = form.clone();
        let service_name = service.name.clone();
        let pdf_bytes = tokio::task::spawn_blocking(move || {
            let main = renderer.render(&service_name, version, &form_data)?;
            pdf::merge_pdfs(&main, &attachments)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de geração do PDF: {}", e))??;

        // 3. Grava o arquivo final
        tokio::fs::create_dir_all(&self.documents_dir).await?;
        let path = self.documents_dir.join(document_file_name(service_id, version));
        tokio::fs::write(&path, &pdf_bytes).await?;
        let file_path = path.to_string_lossy().to_string();

        // 4. Registra e confirma; se falhar, o arquivo não fica órfão
        let document = match self
            .repo
            .insert_document(&mut *tx, service_id, user_id, version, &form, &file_path)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                discard_file(&path).await;
                return Err(e);
            }
        };
        if let Err(e) = tx.commit().await {
            discard_file(&path).await;
            return Err(e.into());
        }

        tracing::info!(
            "📄 Documento v{} do serviço '{}' gerado em {}.",
            version,
            service.name,
            file_path
        );
        Ok(document)
    }

    pub async fn get_document(&self, id: i32) -> Result<GeneratedDocument, AppError> {
        self.repo
            .find_document(&self.pool, id)
            .await?
            .ok_or(AppError::DocumentNotFound)
    }

    /// Conteúdo do PDF final e o nome de arquivo para download.
    pub async fn read_pdf(&self, id: i32) -> Result<(String, Vec<u8>), AppError> {
        let document = self.get_document(id).await?;
        let bytes = match tokio::fs::read(&document.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound("Arquivo do documento não encontrado.".into()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok((document_file_name(document.service_id, document.version), bytes))
    }

    pub async fn delete_document(&self, id: i32) -> Result<(), AppError> {
        let document = self
            .repo
            .delete_document(&self.pool, id)
            .await?
            .ok_or(AppError::DocumentNotFound)?;

        discard_file(Path::new(&document.file_path)).await;
        tracing::info!("🗑️ Documento {} (v{}) excluído.", id, document.version);
        Ok(())
    }
}

async fn discard_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Não foi possível remover {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_fields_become_sections_in_fixed_order() {
        let form = json!({
            "treinamento": { "data_treinamento": "10/03/2025", "participantes": [] },
            "identificacao_projeto": { "cliente": "Prefeitura", "numero_os": 118 },
            "desconhecido": { "x": "y" }
        });
        let (sections, _) = layout_form(&form);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Identificação do Projeto");
        assert_eq!(
            sections[0].fields,
            vec![
                ("cliente".to_string(), "Prefeitura".to_string()),
                ("numero os".to_string(), "118".to_string()),
            ]
        );
        // A lista de participantes não entra como campo
        assert_eq!(sections[1].fields.len(), 1);
    }

    #[test]
    fn known_lists_become_tables() {
        let form = json!({
            "lista_instrumentos": [
                { "tag": "FT-101", "descricao": "Medidor de vazão", "faixa": "0-100 m3/h" }
            ],
            "treinamento": { "participantes": [ { "nome": "João", "certificado": "C-1" } ] }
        });
        let (_, tables) = layout_form(&form);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].title, "Lista de Instrumentos");
        assert_eq!(tables[0].rows[0], vec!["FT-101", "Medidor de vazão", "", "0-100 m3/h", "", ""]);
        assert_eq!(tables[1].rows[0], vec!["João", "C-1"]);
    }

    #[test]
    fn as_built_object_is_a_section_not_a_table() {
        let form = json!({ "documentos_as_built": { "observacoes": "ok" } });
        let (sections, tables) = layout_form(&form);
        assert_eq!(sections.len(), 1);
        assert!(tables.is_empty());
    }
}
