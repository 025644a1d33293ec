// src/services/pdf.rs

use barcoders::sym::code128::Code128;
use genpdf::{elements, fonts, style, Alignment, Element};
use image::{DynamicImage, GrayImage, Luma};
use lopdf::{Dictionary, Document as PdfFile, Object, ObjectId};
use std::path::PathBuf;

use crate::{common::error::AppError, models::documents::Attachment};

// Fonte e margens usadas por todos os PDFs gerados
#[derive(Debug, Clone)]
pub struct PdfStyle {
    fonts_dir: PathBuf,
    family: String,
}

impl PdfStyle {
    pub fn new(fonts_dir: PathBuf, family: String) -> Self {
        Self { fonts_dir, family }
    }

    /// Documento vazio com a fonte carregada e as margens padrão.
    pub fn new_document(&self, title: &str, margins_mm: i32) -> Result<genpdf::Document, AppError> {
        let font_family = fonts::from_files(&self.fonts_dir, &self.family, None).map_err(|_| {
            AppError::FontNotFound(format!(
                "{} não encontrada na pasta {}",
                self.family,
                self.fonts_dir.display()
            ))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(title);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(margins_mm);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }
}

pub fn heading(text: impl Into<String>, size: u8) -> elements::StyledElement<elements::Paragraph> {
    elements::Paragraph::new(text.into()).styled(style::Style::new().bold().with_font_size(size))
}

/// Tabela com bordas e cabeçalho em negrito.
pub fn table(weights: Vec<usize>, headers: &[&str]) -> Result<elements::TableLayout, AppError> {
    let mut table = elements::TableLayout::new(weights);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let style_bold = style::Style::new().bold().with_font_size(9);
    let mut row = table.row();
    for header in headers {
        row = row.element(elements::Paragraph::new(*header).styled(style_bold));
    }
    row.push().map_err(render_err)?;
    Ok(table)
}

pub fn push_row<S: AsRef<str>>(table: &mut elements::TableLayout, cells: &[S]) -> Result<(), AppError> {
    let cell_style = style::Style::new().with_font_size(9);
    let mut row = table.row();
    for cell in cells {
        row = row.element(elements::Paragraph::new(cell.as_ref().to_string()).styled(cell_style));
    }
    row.push().map_err(render_err)
}

pub fn render(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(render_err)?;
    Ok(buffer)
}

pub fn render_err(e: impl std::fmt::Display) -> AppError {
    AppError::RenderError(e.to_string())
}

// ---
// Código de barras (Code 128)
// ---

const QUIET_ZONE_MODULES: usize = 10;
// ~52 mm a 300 dpi: largura útil da etiqueta
const MAX_BARCODE_PX: usize = 600;

/// Módulos do Code 128 (1 = barra, 0 = espaço) no conjunto B.
pub fn code128_modules(data: &str) -> Result<Vec<u8>, AppError> {
    let barcode = Code128::new(format!("Ɓ{}", data))
        .map_err(|e| AppError::BadRequest(format!("Código '{}' não pode virar código de barras: {}", data, e)))?;
    Ok(barcode.encode())
}

/// Rasteriza os módulos numa imagem em tons de cinza, com zona de silêncio dos dois lados.
pub fn barcode_image(modules: &[u8], height_px: u32) -> DynamicImage {
    let total_modules = modules.len() + 2 * QUIET_ZONE_MODULES;
    let module_px = (MAX_BARCODE_PX / total_modules.max(1)).clamp(1, 4);
    let width = (total_modules * module_px) as u32;

    let mut img = GrayImage::from_pixel(width, height_px, Luma([255u8]));
    for (i, &module) in modules.iter().enumerate() {
        if module == 0 {
            continue;
        }
        let x0 = ((QUIET_ZONE_MODULES + i) * module_px) as u32;
        for x in x0..x0 + module_px as u32 {
            for y in 0..height_px {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
    }
    DynamicImage::ImageLuma8(img)
}

pub fn barcode_element(code: &str) -> Result<elements::Image, AppError> {
    let modules = code128_modules(code)?;
    // 20 mm de altura a 300 dpi
    let image = barcode_image(&modules, 236);
    Ok(elements::Image::from_dynamic_image(image)
        .map_err(render_err)?
        .with_alignment(Alignment::Center))
}

// ---
// Junção de PDFs (documento gerado + anexos)
// ---

// Atributos que a página pode herdar dos nós "Pages" acima dela
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

fn type_of(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}

fn inherited(doc: &PdfFile, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").ok().and_then(|p| p.as_reference().ok());
    while let Some(id) = parent {
        let node = doc.get_dictionary(id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").ok().and_then(|p| p.as_reference().ok());
    }
    None
}

/// Anexa os PDFs enviados ao documento gerado, na ordem recebida.
/// O catálogo do documento gerado vira o do resultado.
pub fn merge_pdfs(main: &[u8], attachments: &[Attachment]) -> Result<Vec<u8>, AppError> {
    if attachments.is_empty() {
        return Ok(main.to_vec());
    }

    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects = std::collections::BTreeMap::new();

    let main_doc = PdfFile::load_mem(main).map_err(|e| render_err(format!("documento gerado ilegível: {}", e)))?;
    let mut sources = vec![main_doc];
    for attachment in attachments {
        let doc = PdfFile::load_mem(&attachment.bytes).map_err(|e| {
            AppError::BadRequest(format!("O anexo '{}' não é um PDF válido: {}", attachment.filename, e))
        })?;
        sources.push(doc);
    }

    for mut doc in sources {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, page_id) in doc.get_pages() {
            let mut page = doc.get_dictionary(page_id).map_err(render_err)?.clone();
            for key in INHERITABLE {
                if page.get(key).is_err() {
                    if let Some(value) = inherited(&doc, &page, key) {
                        page.set(key.to_vec(), value);
                    }
                }
            }
            pages.push((page_id, page));
        }
        objects.extend(doc.objects);
    }

    let mut merged = PdfFile::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut root_pages: Option<(ObjectId, Dictionary)> = None;

    for (id, object) in objects {
        match type_of(&object) {
            Some(b"Catalog") => {
                if catalog.is_none() {
                    catalog = object.as_dict().ok().map(|d| (id, d.clone()));
                }
            }
            Some(b"Pages") => {
                if root_pages.is_none() {
                    root_pages = object.as_dict().ok().map(|d| (id, d.clone()));
                }
            }
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(id, object);
            }
        }
    }

    let (catalog_id, mut catalog) = catalog.ok_or_else(|| render_err("PDF sem catálogo"))?;
    let (pages_id, mut pages_dict) = root_pages.ok_or_else(|| render_err("PDF sem árvore de páginas"))?;

    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    for (id, mut page) in pages {
        page.set("Parent", Object::Reference(pages_id));
        merged.objects.insert(id, Object::Dictionary(page));
    }

    pages_dict.set("Count", kids.len() as i64);
    pages_dict.set("Kids", kids);
    pages_dict.remove(b"Parent");
    merged.objects.insert(pages_id, Object::Dictionary(pages_dict));

    catalog.set("Pages", Object::Reference(pages_id));
    catalog.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));

    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();

    let mut buffer = Vec::new();
    merged.save_to(&mut buffer).map_err(render_err)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn code128_starts_with_bar_and_ends_with_stop_pattern() {
        let modules = code128_modules("PRF-001").unwrap();
        assert_eq!(modules.first(), Some(&1));
        // Padrão de parada do Code 128: 1100011101011
        assert_eq!(&modules[modules.len() - 13..], &[1, 1, 0, 0, 0, 1, 1, 1, 0, 1, 0, 1, 1]);
    }

    #[test]
    fn barcode_image_has_quiet_zone_and_bars() {
        let modules = vec![1, 0, 1, 1];
        let image = barcode_image(&modules, 10).to_luma8();
        let module_px = (MAX_BARCODE_PX / (modules.len() + 2 * QUIET_ZONE_MODULES)).clamp(1, 4) as u32;

        assert_eq!(image.width(), (modules.len() + 2 * QUIET_ZONE_MODULES) as u32 * module_px);
        assert_eq!(image.get_pixel(0, 0), &Luma([255u8]));
        let first_bar = QUIET_ZONE_MODULES as u32 * module_px;
        assert_eq!(image.get_pixel(first_bar, 5), &Luma([0u8]));
        assert_eq!(image.get_pixel(first_bar + module_px, 5), &Luma([255u8]));
    }

    // PDF mínimo cujas páginas herdam MediaBox e Resources do nó Pages
    fn sample_pdf(page_count: usize, width: i64, height: i64) -> Vec<u8> {
        let mut doc = PdfFile::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for _ in 0..page_count {
            let content = doc.add_object(lopdf::Stream::new(dictionary! {}, b"q Q".to_vec()));
            let page = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content,
            });
            kids.push(Object::Reference(page));
        }

        let media_box: Vec<Object> = vec![0.into(), 0.into(), width.into(), height.into()];
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
                "MediaBox" => media_box,
                "Resources" => dictionary! {},
            }),
        );
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn attachment(filename: &str, bytes: Vec<u8>) -> Attachment {
        Attachment { filename: filename.into(), bytes }
    }

    #[test]
    fn without_attachments_main_is_returned_untouched() {
        let main = b"%PDF-1.4 fake".to_vec();
        assert_eq!(merge_pdfs(&main, &[]).unwrap(), main);
    }

    #[test]
    fn attachments_are_appended_with_inherited_media_box() {
        let main = sample_pdf(2, 595, 842);
        let extra = attachment("diagrama.pdf", sample_pdf(3, 842, 595));

        let merged = merge_pdfs(&main, &[extra]).unwrap();
        let doc = PdfFile::load_mem(&merged).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 5);

        let widths: Vec<i64> = pages
            .values()
            .map(|&id| {
                let page = doc.get_dictionary(id).unwrap();
                let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
                assert!(page.get(b"Resources").is_ok());
                media_box[2].as_i64().unwrap()
            })
            .collect();
        // Páginas do documento gerado primeiro, depois as do anexo
        assert_eq!(widths, vec![595, 595, 842, 842, 842]);
    }

    #[test]
    fn invalid_attachment_is_reported_by_file_name() {
        let main = sample_pdf(1, 595, 842);
        let broken = attachment("laudo.pdf", b"%PDF-1.4 truncado".to_vec());

        match merge_pdfs(&main, &[broken]) {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("'laudo.pdf'"), "{}", msg),
            other => panic!("esperava BadRequest, veio {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn unreadable_generated_document_is_a_render_error() {
        let extra = attachment("a.pdf", sample_pdf(1, 595, 842));
        assert!(matches!(merge_pdfs(b"nao sou pdf", &[extra]), Err(AppError::RenderError(_))));
    }
}
