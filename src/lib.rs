//! # Folio
//!
//! A paginated report engine for salary slips, letters and lesson plans.
//!
//! Folio lays content out directly onto fixed-size pages. Every block is
//! placed against the page it lands on: text wraps to the column, a line
//! that runs past the body moves to a fresh page, and units that must not be
//! split (a totals box, a table row, a pair of field columns) are moved
//! whole. New pages get the background, letterhead and footer as they are
//! allocated.
//!
//! ## Architecture
//!
//! ```text
//! Request (JSON)
//!       ↓
//!   [model]     - GenerateRequest, Report, ContentBlock
//!       ↓
//!   [report]    - Report → content blocks
//!       ↓
//!   [layout]    - Composer, section templates, page manager
//!       ↓         (text: markup runs and line breaking)
//!   [surface]   - Per-page draw ops
//!       ↓
//!   [pdf]       - Serialize to PDF bytes
//! ```
//!
//! The background image is fetched before layout by [`asset`], the only
//! asynchronous step. Everything after it is synchronous and owned by one
//! call.

pub mod asset;
pub mod config;
pub mod error;
pub mod font;
pub mod format;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod report;
pub mod style;
pub mod surface;
pub mod text;

pub use error::{FolioError, Result};
pub use model::GenerateRequest;

use asset::BackgroundAsset;
use font::FontContext;
use layout::compose::{BlockStyle, Composer};
use layout::Document;
use model::FontEntry;
use pdf::PdfWriter;
use style::Color;

/// A finished document, ready to be saved or downloaded.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

/// Parse a generation request from JSON.
pub fn parse_request(json: &str) -> Result<GenerateRequest> {
    Ok(serde_json::from_str(json)?)
}

/// Build the font context for a request, replacing standard variants with
/// the custom fonts it lists.
pub fn load_fonts(entries: &[FontEntry]) -> Result<FontContext> {
    let mut fonts = FontContext::new();
    for entry in entries {
        let data = image_loader::read_source_bytes(&entry.src).map_err(|e| {
            FolioError::font_with_source(
                format!("cannot load font '{}' ({:?})", entry.family, entry.variant),
                e,
            )
        })?;
        fonts.register(entry.variant, &entry.family, data)?;
    }
    Ok(fonts)
}

/// Lay a request out onto pages against an already resolved background.
///
/// The returned document's last page is still open; [`PdfWriter::write`]
/// finalizes it.
pub fn layout_document(
    request: &GenerateRequest,
    background: BackgroundAsset,
) -> Result<(Document, FontContext)> {
    let config = &request.config;
    let fonts = load_fonts(&request.fonts)?;
    let line_spacing = request
        .report
        .line_spacing()
        .unwrap_or(config.line_spacing);

    let mut metadata = request.metadata.clone();
    if metadata.title.is_none() {
        metadata.title = request.report.title();
    }

    let doc = Document::new(
        config,
        line_spacing,
        background,
        request.footer.as_deref(),
        request.letterhead.clone(),
        metadata,
    );
    let style = BlockStyle {
        font_size: config.base_font_size,
        line_spacing,
        color: Color::BLACK,
        value_placeholder: config.value_placeholder.clone(),
        empty_group_text: config.empty_group_text.clone(),
    };
    let blocks = request.report.to_blocks(config);

    let doc = {
        let mut composer = Composer::new(doc, &fonts, style)?;
        composer.compose(&blocks)?;
        composer.finish()
    };
    log::debug!("laid out {} blocks on {} pages", blocks.len(), doc.page_count());
    Ok((doc, fonts))
}

/// Render synchronously with an already resolved background.
///
/// No creation date is written, so identical requests produce identical
/// bytes.
pub fn render(request: &GenerateRequest, background: BackgroundAsset) -> Result<RenderedDocument> {
    render_with(request, background, PdfWriter::from_config(&request.config))
}

fn render_with(
    request: &GenerateRequest,
    background: BackgroundAsset,
    writer: PdfWriter,
) -> Result<RenderedDocument> {
    let (doc, fonts) = layout_document(request, background)?;
    let page_count = doc.page_count();
    let bytes = writer.write(doc, &fonts)?;
    Ok(RenderedDocument {
        bytes,
        filename: output_filename(request),
        page_count,
    })
}

/// Fetch the background, lay out and serialize. The PDF carries the current
/// time as its creation date.
pub async fn generate(request: &GenerateRequest) -> Result<RenderedDocument> {
    let config = &request.config;
    let background = asset::fetch_background(
        request.background.as_deref(),
        config.fetch_timeout(),
        config.fallback_background,
    )
    .await;
    let writer = PdfWriter::from_config(config).with_creation_date(chrono::Utc::now());
    render_with(request, background, writer)
}

/// [`generate`] from a JSON request.
pub async fn generate_json(json: &str) -> Result<RenderedDocument> {
    let request = parse_request(json)?;
    generate(&request).await
}

fn output_filename(request: &GenerateRequest) -> String {
    match request.filename.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            if name.to_ascii_lowercase().ends_with(".pdf") {
                name.to_string()
            } else {
                format!("{}.pdf", name)
            }
        }
        _ => request.report.suggested_filename(),
    }
}
