//! # Page Management
//!
//! Pages are allocated lazily, one at a time, as content runs out of room.
//! Nothing is laid out on a tall canvas and sliced afterwards: every block
//! asks whether it fits on the page it is about to draw on and, when it does
//! not, requests the next page before drawing a single op.
//!
//! A page moves through two states. While `Open` it accepts content; when
//! the next page is allocated it is `Finalized`, which paints the footer.
//! Only one page is open at a time, and finalizing a page twice is an error.
//! Backgrounds are painted when a page is created, the letterhead when the
//! first content asks for it ([`PageManager::ensure_header`]).

pub mod columns;
pub mod compose;
pub mod page_break;
pub mod sections;

use crate::asset::BackgroundAsset;
use crate::config::EngineConfig;
use crate::error::{FolioError, Result};
use crate::image_loader::ImageTable;
use crate::model::{Letterhead, Metadata};
use crate::style::{Color, FontVariant, LineSpacing};
use crate::surface::{ImageId, Point, Surface};

/// Fixed page dimensions and the zones carved out of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub header_reserved: f64,
    pub footer_reserved: f64,
}

impl PageGeometry {
    /// Baseline of the first body line on a page.
    pub fn body_top(&self) -> f64 {
        self.height - self.margin - self.header_reserved
    }

    /// Lowest baseline body text may use.
    pub fn body_bottom(&self) -> f64 {
        self.margin + self.footer_reserved
    }

    /// Vertical room an empty page body offers.
    pub fn body_height(&self) -> f64 {
        self.body_top() - self.body_bottom()
    }

    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    /// Image scaled over the full page.
    Image(ImageId),
    Solid(Color),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Open,
    Finalized,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub surface: Surface,
    pub cursor: Point,
    pub header_painted: bool,
    pub state: PageState,
}

/// Footer drawn centred at the bottom of each page.
#[derive(Debug, Clone)]
pub struct Footer {
    /// May contain `{{pageNumber}}` and `{{totalPages}}`, replaced when the
    /// document is serialized.
    pub template: String,
    pub font_size: f64,
    pub color: Color,
}

/// Everything one generation run produces before serialization.
#[derive(Debug, Clone)]
pub struct Document {
    pub geometry: PageGeometry,
    pub base_font_size: f64,
    pub line_spacing: LineSpacing,
    pub background: Background,
    pub footer: Option<Footer>,
    pub letterhead: Option<Letterhead>,
    pub metadata: Metadata,
    pub images: ImageTable,
    pub pages: Vec<Page>,
}

/// Gap between the letterhead block and the rule beneath it.
const LETTERHEAD_RULE_GAP: f64 = 6.0;

impl Document {
    /// Build an empty document from config, decoration and the resolved
    /// background.
    ///
    /// When a letterhead is present and no header zone was configured, the
    /// zone is sized to hold the letterhead lines plus one body line of
    /// clearance below its rule.
    pub fn new(
        config: &EngineConfig,
        line_spacing: LineSpacing,
        background: BackgroundAsset,
        footer: Option<&str>,
        letterhead: Option<Letterhead>,
        metadata: Metadata,
    ) -> Self {
        let (width, height) = config.page_size.dimensions();
        let letterhead = letterhead.filter(|l| l.lines.iter().any(|s| !s.trim().is_empty()));

        let mut header_reserved = config.header_reserved;
        if header_reserved <= 0.0 {
            if let Some(lh) = &letterhead {
                header_reserved = letterhead_block_height(lh)
                    + LETTERHEAD_RULE_GAP
                    + line_spacing.line_height(config.base_font_size);
            }
        }

        let mut images = ImageTable::new();
        let background = match background {
            BackgroundAsset::Image { key, image } => Background::Image(images.insert(&key, image)),
            BackgroundAsset::Solid(color) => Background::Solid(color),
        };

        Self {
            geometry: PageGeometry {
                width,
                height,
                margin: config.margin,
                header_reserved,
                footer_reserved: config.footer_reserved,
            },
            base_font_size: config.base_font_size,
            line_spacing,
            background,
            footer: footer
                .filter(|f| !f.trim().is_empty())
                .map(|template| Footer {
                    template: template.to_string(),
                    font_size: config.footer_font_size,
                    color: Color::MID_GRAY,
                }),
            letterhead,
            metadata,
            images,
            pages: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

fn letterhead_sizes(letterhead: &Letterhead) -> impl Iterator<Item = f64> + '_ {
    letterhead.lines.iter().enumerate().map(|(i, _)| {
        if i == 0 {
            letterhead.font_size
        } else {
            (letterhead.font_size * 0.7).max(6.0)
        }
    })
}

fn letterhead_block_height(letterhead: &Letterhead) -> f64 {
    letterhead_sizes(letterhead).map(|s| s * 1.2).sum()
}

/// Owns the document while it is laid out and enforces the page lifecycle.
pub struct PageManager {
    doc: Document,
}

impl PageManager {
    pub fn new(doc: Document) -> Self {
        Self { doc }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.doc.geometry
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_count(&self) -> usize {
        self.doc.pages.len()
    }

    /// Index of the open page, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.doc
            .pages
            .iter()
            .rposition(|p| p.state == PageState::Open)
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.doc.pages.get(index)
    }

    /// Surface of an existing page.
    pub fn surface_mut(&mut self, index: usize) -> Result<&mut Surface> {
        self.doc
            .pages
            .get_mut(index)
            .map(|p| &mut p.surface)
            .ok_or_else(|| FolioError::RenderError(format!("page {} does not exist", index)))
    }

    /// Finalize the open page, append a fresh one and paint its background.
    /// Returns the new page's index.
    pub fn new_page(&mut self) -> Result<usize> {
        if let Some(open) = self.current_index() {
            self.finalize_page(open)?;
        }

        let geometry = self.doc.geometry;
        let index = self.doc.pages.len();
        let mut surface = Surface::new(geometry.width, geometry.height);
        match self.doc.background {
            Background::Image(id) => {
                surface.draw_image(id, 0.0, 0.0, geometry.width, geometry.height)
            }
            Background::Solid(color) => surface.draw_rect(
                0.0,
                0.0,
                geometry.width,
                geometry.height,
                Some(color),
                None,
            ),
        }

        self.doc.pages.push(Page {
            index,
            surface,
            cursor: Point::new(geometry.margin, geometry.body_top()),
            header_painted: false,
            state: PageState::Open,
        });
        log::debug!("allocated page {}", index + 1);
        Ok(index)
    }

    /// Paint the footer and close the page.
    pub fn finalize_page(&mut self, index: usize) -> Result<()> {
        let geometry = self.doc.geometry;
        let footer = self.doc.footer.clone();
        let page = self
            .doc
            .pages
            .get_mut(index)
            .ok_or_else(|| FolioError::RenderError(format!("page {} does not exist", index)))?;
        if page.state == PageState::Finalized {
            return Err(FolioError::PageFinalized { index });
        }
        if let Some(footer) = footer {
            paint_footer(&mut page.surface, &geometry, &footer);
        }
        page.state = PageState::Finalized;
        Ok(())
    }

    /// The page following `index`, allocating it when it does not exist yet.
    /// The returned page has its letterhead painted.
    pub fn page_after(&mut self, index: usize) -> Result<usize> {
        let next = if index + 1 < self.doc.pages.len() {
            index + 1
        } else {
            self.new_page()?
        };
        self.ensure_header(next)?;
        Ok(next)
    }

    /// Paint the letterhead on a page unless it already carries it.
    pub fn ensure_header(&mut self, index: usize) -> Result<()> {
        let geometry = self.doc.geometry;
        let letterhead = self.doc.letterhead.clone();
        let page = self
            .doc
            .pages
            .get_mut(index)
            .ok_or_else(|| FolioError::RenderError(format!("page {} does not exist", index)))?;
        if page.header_painted {
            return Ok(());
        }
        if let Some(letterhead) = letterhead {
            paint_letterhead(&mut page.surface, &geometry, &letterhead);
        }
        page.header_painted = true;
        Ok(())
    }

    /// Record where content on a page stopped.
    pub fn set_cursor(&mut self, index: usize, cursor: Point) {
        if let Some(page) = self.doc.pages.get_mut(index) {
            page.cursor = cursor;
        }
    }

    /// Hand the document over for serialization. The last page stays open;
    /// the writer finalizes it.
    pub fn finish(self) -> Document {
        self.doc
    }
}

fn footer_baseline(geometry: &PageGeometry, font_size: f64) -> f64 {
    if geometry.footer_reserved >= font_size {
        geometry.margin + (geometry.footer_reserved - font_size) / 2.0
    } else {
        geometry.margin / 2.0
    }
}

fn paint_footer(surface: &mut Surface, geometry: &PageGeometry, footer: &Footer) {
    surface.draw_text_centered(
        &footer.template,
        geometry.width / 2.0,
        footer_baseline(geometry, footer.font_size),
        footer.font_size,
        FontVariant::Regular,
        footer.color,
    );
}

fn paint_letterhead(surface: &mut Surface, geometry: &PageGeometry, letterhead: &Letterhead) {
    let center = geometry.width / 2.0;
    let mut y = geometry.height - geometry.margin;
    for (i, (line, size)) in letterhead
        .lines
        .iter()
        .zip(letterhead_sizes(letterhead))
        .enumerate()
    {
        y -= size * 1.2;
        let (font, color) = if i == 0 {
            (FontVariant::Bold, Color::BLACK)
        } else {
            (FontVariant::Regular, Color::DARK_GRAY)
        };
        surface.draw_text_centered(line, center, y, size, font, color);
    }
    let rule_y = y - LETTERHEAD_RULE_GAP;
    surface.draw_line(
        Point::new(geometry.margin, rule_y),
        Point::new(geometry.width - geometry.margin, rule_y),
        0.75,
        Color::DARK_GRAY,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, TextAnchor};

    fn document(footer: Option<&str>, letterhead: Option<Letterhead>) -> Document {
        Document::new(
            &EngineConfig::default(),
            LineSpacing::Single,
            BackgroundAsset::Solid(Color::WHITE),
            footer,
            letterhead,
            Metadata::default(),
        )
    }

    #[test]
    fn geometry_zones() {
        let doc = document(None, None);
        let g = doc.geometry;
        assert!((g.body_top() - (841.89 - 50.0)).abs() < 1e-9);
        assert_eq!(g.body_bottom(), 74.0);
        assert!((g.content_width() - 495.28).abs() < 1e-9);
    }

    #[test]
    fn new_page_paints_background_and_resets_cursor() {
        let mut pm = PageManager::new(document(None, None));
        let idx = pm.new_page().unwrap();
        let page = pm.page(idx).unwrap();
        assert_eq!(page.state, PageState::Open);
        assert_eq!(page.cursor.y, pm.geometry().body_top());
        assert!(matches!(
            page.surface.ops()[0],
            DrawOp::Rect { fill: Some(c), .. } if c == Color::WHITE
        ));
    }

    #[test]
    fn only_one_page_is_open() {
        let mut pm = PageManager::new(document(Some("Page {{pageNumber}}"), None));
        pm.new_page().unwrap();
        pm.new_page().unwrap();
        pm.new_page().unwrap();
        let open: Vec<_> = pm
            .document()
            .pages
            .iter()
            .filter(|p| p.state == PageState::Open)
            .map(|p| p.index)
            .collect();
        assert_eq!(open, vec![2]);
    }

    #[test]
    fn finalize_paints_centered_footer_once() {
        let mut pm = PageManager::new(document(Some("Page {{pageNumber}} of {{totalPages}}"), None));
        pm.new_page().unwrap();
        pm.finalize_page(0).unwrap();
        let footer_ops: Vec<_> = pm
            .page(0)
            .unwrap()
            .surface
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { anchor: TextAnchor::Center, .. }))
            .collect();
        assert_eq!(footer_ops.len(), 1);
        let err = pm.finalize_page(0).unwrap_err();
        assert!(matches!(err, FolioError::PageFinalized { index: 0 }));
    }

    #[test]
    fn letterhead_reserves_header_zone_and_paints_once() {
        let letterhead = Letterhead {
            lines: vec!["Greenfield School".into(), "12 Canal Road, Lahore".into()],
            font_size: 14.0,
        };
        let mut pm = PageManager::new(document(None, Some(letterhead)));
        assert!(pm.geometry().header_reserved > 0.0);
        pm.new_page().unwrap();
        pm.ensure_header(0).unwrap();
        pm.ensure_header(0).unwrap();
        let texts: Vec<_> = pm.page(0).unwrap().surface.texts().map(|t| t.0).collect();
        assert_eq!(texts, vec!["Greenfield School", "12 Canal Road, Lahore"]);
    }

    #[test]
    fn page_after_reuses_existing_pages() {
        let mut pm = PageManager::new(document(None, None));
        pm.new_page().unwrap();
        pm.new_page().unwrap();
        assert_eq!(pm.page_after(0).unwrap(), 1);
        assert_eq!(pm.page_count(), 2);
        assert_eq!(pm.page_after(1).unwrap(), 2);
        assert_eq!(pm.page_count(), 3);
    }
}
