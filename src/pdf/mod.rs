//! # PDF Serializer
//!
//! Takes the composed document and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. Every page surface is already in
//! PDF user space (bottom-left origin, points), so draw ops translate to
//! content-stream operators one to one.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, images, pages, content streams)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! ## Font Embedding
//!
//! Standard fonts (Helvetica family, Courier) use simple Type1 references
//! with WinAnsiEncoding. Custom TrueType fonts are embedded whole as
//! CIDFontType2 with Identity-H encoding, producing 5 PDF objects per font:
//! FontFile2, FontDescriptor, CIDFont, ToUnicode CMap, and the root Type0
//! dictionary. Only variants that some text op actually uses are written.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use chrono::{DateTime, Utc};
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::config::EngineConfig;
use crate::error::{FolioError, Result};
use crate::font::{FontContext, FontData};
use crate::image_loader::{LoadedImage, PixelData};
use crate::layout::{Document, PageManager, PageState};
use crate::model::Metadata;
use crate::style::{Color, FontVariant};
use crate::surface::{DrawOp, ImageId, TextAnchor};

const PAGE_NUMBER: &str = "{{pageNumber}}";
const TOTAL_PAGES: &str = "{{totalPages}}";

/// Serializes a [`Document`] into PDF bytes.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    compress: bool,
    strict: bool,
    creation_date: Option<DateTime<Utc>>,
}

/// Embedding data for a custom TrueType font.
struct CustomFontEmbedData {
    /// Maps characters to glyph IDs in the embedded font.
    char_to_gid: HashMap<char, u16>,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font variant and object id, in `/F0`, `/F1`, ... order.
    font_objects: Vec<(FontVariant, usize)>,
    custom_font_data: HashMap<FontVariant, CustomFontEmbedData>,
    /// Image id and XObject id, in `/Im0`, `/Im1`, ... order.
    image_objects: Vec<(ImageId, usize)>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        Self {
            objects: (0..3).map(|_| PdfObject { data: vec![] }).collect(),
            font_objects: Vec::new(),
            custom_font_data: HashMap::new(),
            image_objects: Vec::new(),
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(PdfObject { data });
        self.objects.len() - 1
    }

    fn push_stream(&mut self, dict_extra: &str, content: &[u8], compress: bool) -> usize {
        let mut data: Vec<u8> = Vec::new();
        if compress {
            let compressed = compress_to_vec_zlib(content, 6);
            let _ = write!(
                data,
                "<< /Length {}{} /Filter /FlateDecode >>\nstream\n",
                compressed.len(),
                dict_extra
            );
            data.extend_from_slice(&compressed);
        } else {
            let _ = write!(data, "<< /Length {}{} >>\nstream\n", content.len(), dict_extra);
            data.extend_from_slice(content);
        }
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_index(&self, variant: FontVariant) -> usize {
        self.font_objects
            .iter()
            .position(|(v, _)| *v == variant)
            .unwrap_or(0)
    }

    fn image_index(&self, image: ImageId) -> Option<usize> {
        self.image_objects.iter().position(|(id, _)| *id == image)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    /// Compressed streams, lenient finalization, no creation date.
    pub fn new() -> Self {
        Self {
            compress: true,
            strict: false,
            creation_date: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            compress: config.compress_streams,
            strict: config.strict_finalize,
            creation_date: None,
        }
    }

    /// Stamp `/CreationDate`. Without it, identical documents serialize to
    /// identical bytes.
    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }

    /// Finalize the document and write it to a PDF byte vector.
    ///
    /// The last page is finalized here. Any earlier page still open is a
    /// lifecycle violation: an error in strict mode, otherwise finalized
    /// with a warning.
    pub fn write(&self, doc: Document, fonts: &FontContext) -> Result<Vec<u8>> {
        let doc = self.finalize_pages(doc)?;
        let total_pages = doc.pages.len();
        let mut builder = PdfBuilder::new();

        self.register_fonts(&mut builder, &doc, fonts)?;
        self.register_images(&mut builder, &doc)?;

        let mut page_obj_ids: Vec<usize> = Vec::new();
        for (page_idx, page) in doc.pages.iter().enumerate() {
            let content =
                self.build_content_stream(page.surface.ops(), &builder, fonts, page_idx + 1, total_pages);
            let content_obj_id = builder.push_stream("", content.as_bytes(), self.compress);

            let font_resources = Self::build_font_resource_dict(&builder);
            let xobject_resources = Self::build_xobject_resource_dict(page.surface.ops(), &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobject_resources)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.surface.width, page.surface.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info = self.build_info_dict(&doc.metadata);
        let info_obj_id = builder.push(info.into_bytes());

        Ok(Self::serialize(&builder, info_obj_id))
    }

    fn finalize_pages(&self, doc: Document) -> Result<Document> {
        let last = doc.pages.len().checked_sub(1);
        let open: Vec<usize> = doc
            .pages
            .iter()
            .filter(|p| p.state == PageState::Open)
            .map(|p| p.index)
            .collect();

        let mut pm = PageManager::new(doc);
        for index in open {
            if Some(index) != last {
                if self.strict {
                    return Err(FolioError::OpenPage { index });
                }
                log::warn!("page {} was still open at serialization; finalizing it", index + 1);
            }
            pm.finalize_page(index)?;
        }
        Ok(pm.finish())
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(
        &self,
        ops: &[DrawOp],
        builder: &PdfBuilder,
        fonts: &FontContext,
        page_number: usize,
        total_pages: usize,
    ) -> String {
        let mut stream = String::new();
        for op in ops {
            match op {
                DrawOp::Text {
                    text,
                    x,
                    y,
                    size,
                    font,
                    color,
                    anchor,
                } => {
                    let text = substitute_placeholders(text, page_number, total_pages);
                    let x = match anchor {
                        TextAnchor::Start => *x,
                        TextAnchor::Center => x - fonts.measure(&text, *font, *size) / 2.0,
                    };
                    let _ = write!(
                        stream,
                        "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n",
                        color.r,
                        color.g,
                        color.b,
                        builder.font_index(*font),
                        size,
                        x,
                        y
                    );
                    match builder.custom_font_data.get(font) {
                        Some(embed) => {
                            let hex: String = text
                                .chars()
                                .map(|ch| {
                                    format!("{:04X}", embed.char_to_gid.get(&ch).copied().unwrap_or(0))
                                })
                                .collect();
                            let _ = writeln!(stream, "<{}> Tj", hex);
                        }
                        None => {
                            let _ = writeln!(stream, "({}) Tj", encode_winansi(&text));
                        }
                    }
                    stream.push_str("ET\n");
                }

                DrawOp::Line {
                    from,
                    to,
                    thickness,
                    color,
                } => {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        color.r, color.g, color.b, thickness, from.x, from.y, to.x, to.y
                    );
                }

                DrawOp::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    border,
                } => {
                    if let Some(fill) = fill {
                        let _ = write!(
                            stream,
                            "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                            fill.r, fill.g, fill.b, x, y, width, height
                        );
                    }
                    if let Some(border) = border.filter(|b| b.width > 0.0) {
                        let Color { r, g, b } = border.color;
                        let _ = write!(
                            stream,
                            "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                            r, g, b, border.width, x, y, width, height
                        );
                    }
                }

                DrawOp::Image {
                    image,
                    x,
                    y,
                    width,
                    height,
                } => {
                    if let Some(idx) = builder.image_index(*image) {
                        let _ = write!(
                            stream,
                            "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                            width, height, x, y, idx
                        );
                    }
                }
            }
        }
        stream
    }

    /// Register the font variants used across all pages. Each gets its own
    /// PDF font object; custom variants are embedded.
    fn register_fonts(&self, builder: &mut PdfBuilder, doc: &Document, fonts: &FontContext) -> Result<()> {
        let total_pages = doc.pages.len();
        let mut used: BTreeMap<FontVariant, BTreeSet<char>> = BTreeMap::new();
        for (page_idx, page) in doc.pages.iter().enumerate() {
            for op in page.surface.ops() {
                if let DrawOp::Text { text, font, .. } = op {
                    let text = substitute_placeholders(text, page_idx + 1, total_pages);
                    used.entry(*font).or_default().extend(text.chars());
                }
            }
        }

        for (variant, chars) in &used {
            let obj_id = match fonts.resolve(*variant) {
                FontData::Standard(std_font) => {
                    let dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        std_font.pdf_name()
                    );
                    builder.push(dict.into_bytes())
                }
                FontData::Custom { family, data, .. } => {
                    self.write_custom_font_objects(builder, *variant, family, data, chars)?
                }
            };
            builder.font_objects.push((*variant, obj_id));
        }
        Ok(())
    }

    /// Write every image some page draws, once each.
    fn register_images(&self, builder: &mut PdfBuilder, doc: &Document) -> Result<()> {
        let used: BTreeSet<ImageId> = doc
            .pages
            .iter()
            .flat_map(|p| p.surface.ops())
            .filter_map(|op| match op {
                DrawOp::Image { image, .. } => Some(*image),
                _ => None,
            })
            .collect();

        for id in used {
            let image = doc
                .images
                .get(id)
                .ok_or_else(|| FolioError::RenderError(format!("image {} is not in the document", id.0)))?;
            let obj_id = self.write_image_xobject(builder, image);
            builder.image_objects.push((id, obj_id));
        }
        Ok(())
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(&self, builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixels {
            PixelData::Jpeg { data, gray } => {
                let color_space = if *gray { "/DeviceGray" } else { "/DeviceRGB" };
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace {} \
                     /BitsPerComponent 8 \
                     /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }

            PixelData::Rgb { rgb, alpha } => {
                // Image samples are always deflated; they dwarf everything else.
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha_data| {
                        let dict = format!(
                            " /Type /XObject /Subtype /Image /Width {} /Height {} \
                             /ColorSpace /DeviceGray /BitsPerComponent 8",
                            image.width_px, image.height_px
                        );
                        let id = builder.push_stream(&dict, alpha_data, true);
                        format!(" /SMask {} 0 R", id)
                    })
                    .unwrap_or_default();

                let dict = format!(
                    " /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8{}",
                    image.width_px, image.height_px, smask_ref
                );
                builder.push_stream(&dict, rgb, true)
            }
        }
    }

    /// Write the 5 CIDFont PDF objects for a custom TrueType font.
    /// Returns the object ID of the Type0 root font dictionary.
    fn write_custom_font_objects(
        &self,
        builder: &mut PdfBuilder,
        variant: FontVariant,
        family: &str,
        ttf_data: &[u8],
        used_chars: &BTreeSet<char>,
    ) -> Result<usize> {
        let face = ttf_parser::Face::parse(ttf_data, 0).map_err(|e| {
            FolioError::font_with_source(
                format!("failed to parse TTF data for font '{}' ({:?})", family, variant),
                e,
            )
        })?;

        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .filter_map(|&ch| face.glyph_index(ch).map(|gid| (ch, gid.0)))
            .collect();

        let pdf_font_name = sanitize_font_name(family, variant);

        // 1. FontFile2 stream
        let fontfile2_id = builder.push_stream(
            &format!(" /Length1 {}", ttf_data.len()),
            ttf_data,
            true,
        );

        // 2. FontDescriptor
        let bbox = face.global_bounding_box();
        let scale = 1000.0 / units_per_em as f64;
        let bbox_str = format!(
            "[{} {} {} {}]",
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
        );
        let flags = if variant == FontVariant::Monospace { 5u32 } else { 4u32 };
        let cap_height = face.capital_height().unwrap_or(ascender) as f64 * scale;
        let stem_v = if variant == FontVariant::Bold { 120 } else { 80 };
        let font_descriptor_dict = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags {} \
             /FontBBox {} /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            flags,
            bbox_str,
            if variant == FontVariant::Italic { -12 } else { 0 },
            (ascender as f64 * scale) as i32,
            (descender as f64 * scale) as i32,
            cap_height as i32,
            stem_v,
            fontfile2_id,
        );
        let font_descriptor_id = builder.push(font_descriptor_dict.into_bytes());

        // 3. CIDFont dictionary (DescendantFont)
        let w_array = build_w_array(&char_to_gid, &face, units_per_em);
        let default_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| (adv as f64 * scale) as u32)
            .unwrap_or(1000);
        let cidfont_dict = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} \
             /CIDToGIDMap /Identity >>",
            pdf_font_name, font_descriptor_id, default_width, w_array,
        );
        let cidfont_id = builder.push(cidfont_dict.into_bytes());

        // 4. ToUnicode CMap
        let cmap_content = build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let tounicode_id = builder.push_stream("", cmap_content.as_bytes(), true);

        // 5. Type0 font dictionary (the root, referenced by /Resources)
        let type0_dict = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} \
             /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] \
             /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id,
        );
        let type0_id = builder.push(type0_dict.into_bytes());

        log::debug!(
            "embedded font '{}' for {:?} ({} glyphs used)",
            family,
            variant,
            char_to_gid.len()
        );
        builder
            .custom_font_data
            .insert(variant, CustomFontEmbedData { char_to_gid });
        Ok(type0_id)
    }

    fn build_font_resource_dict(builder: &PdfBuilder) -> String {
        builder
            .font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The /XObject resource entries for the images one page draws.
    fn build_xobject_resource_dict(ops: &[DrawOp], builder: &PdfBuilder) -> String {
        let used: BTreeSet<usize> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { image, .. } => builder.image_index(*image),
                _ => None,
            })
            .collect();
        used.iter()
            .map(|&idx| format!("/Im{} {} 0 R", idx, builder.image_objects[idx].1))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_info_dict(&self, metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        let entries = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Creator", &metadata.creator),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", key, encode_winansi(value));
            }
        }
        if let Some(date) = self.creation_date {
            let _ = write!(info, "/CreationDate (D:{}Z) ", date.format("%Y%m%d%H%M%S"));
        }
        info.push_str("/Producer (Folio 0.1) >>");
        info
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}

/// Replace footer page placeholders.
fn substitute_placeholders(text: &str, page_number: usize, total_pages: usize) -> Cow<'_, str> {
    if text.contains("{{") {
        Cow::Owned(
            text.replace(PAGE_NUMBER, &page_number.to_string())
                .replace(TOTAL_PAGES, &total_pages.to_string()),
        )
    } else {
        Cow::Borrowed(text)
    }
}

/// Encode text for a WinAnsi literal string. Bytes above 0x7E are written
/// as octal escapes; characters outside WinAnsi become `?`.
fn encode_winansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match unicode_to_winansi(ch) {
            Some(b'\\') => out.push_str("\\\\"),
            Some(b'(') => out.push_str("\\("),
            Some(b')') => out.push_str("\\)"),
            Some(b) if b < 0x7F => out.push(b as char),
            Some(b) => {
                let _ = write!(out, "\\{:03o}", b);
            }
            None => out.push('?'),
        }
    }
    out
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Most codepoints in
/// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
/// contains special mappings for smart quotes, bullets, dashes, etc.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82), // Single low-9 quotation mark
        0x0192 => Some(0x83), // Latin small letter f with hook
        0x201E => Some(0x84), // Double low-9 quotation mark
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86), // Dagger
        0x2021 => Some(0x87), // Double dagger
        0x02C6 => Some(0x88), // Modifier letter circumflex accent
        0x2030 => Some(0x89), // Per mille sign
        0x0160 => Some(0x8A), // Latin capital letter S with caron
        0x2039 => Some(0x8B), // Single left-pointing angle quotation
        0x0152 => Some(0x8C), // Latin capital ligature OE
        0x017D => Some(0x8E), // Latin capital letter Z with caron
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98), // Small tilde
        0x2122 => Some(0x99), // Trade mark sign
        0x0161 => Some(0x9A), // Latin small letter s with caron
        0x203A => Some(0x9B), // Single right-pointing angle quotation
        0x0153 => Some(0x9C), // Latin small ligature oe
        0x017E => Some(0x9E), // Latin small letter z with caron
        0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
        _ => None,
    }
}

/// Build the /W array for per-glyph widths in CIDFont.
/// Format: [gid [width] gid [width] ...]
fn build_w_array(char_to_gid: &HashMap<char, u16>, face: &ttf_parser::Face, units_per_em: u16) -> String {
    let scale = 1000.0 / units_per_em as f64;
    let gids: BTreeSet<u16> = char_to_gid.values().copied().collect();

    let mut result = String::from("[");
    for gid in gids {
        let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
        let _ = write!(result, " {} [{}]", gid, (advance as f64 * scale) as u32);
    }
    result.push_str(" ]");
    result
}

/// Build a ToUnicode CMap for text extraction/copy-paste support.
fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
    let mut gid_to_unicode: Vec<(u16, char)> = char_to_gid
        .iter()
        .map(|(&ch, &gid)| (gid, ch))
        .collect();
    gid_to_unicode.sort_unstable();

    let mut cmap = String::new();
    cmap.push_str("/CIDInit /ProcSet findresource begin\n");
    cmap.push_str("12 dict begin\n");
    cmap.push_str("begincmap\n");
    cmap.push_str("/CIDSystemInfo\n");
    cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
    cmap.push_str("/CMapType 2 def\n");
    cmap.push_str("1 begincodespacerange\n");
    cmap.push_str("<0000> <FFFF>\n");
    cmap.push_str("endcodespacerange\n");

    // PDF spec limits beginbfchar to 100 entries per block
    for chunk in gid_to_unicode.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for &(gid, unicode) in chunk {
            let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16_hex(unicode));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\n");
    cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
    cmap.push_str("end\n");
    cmap.push_str("end\n");
    cmap
}

/// UTF-16BE hex digits of a character; astral characters become a
/// surrogate pair.
fn utf16_hex(ch: char) -> String {
    let mut units = [0u16; 2];
    ch.encode_utf16(&mut units)
        .iter()
        .map(|unit| format!("{:04X}", unit))
        .collect()
}

/// Sanitize a family name for use as a PDF name object, with a variant
/// suffix so two variants of one family get distinct names.
fn sanitize_font_name(family: &str, variant: FontVariant) -> String {
    let mut name: String = family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if name.is_empty() {
        name = "CustomFont".to_string();
    }
    match variant {
        FontVariant::Regular => {}
        FontVariant::Bold => name.push_str("-Bold"),
        FontVariant::Italic => name.push_str("-Italic"),
        FontVariant::Monospace => name.push_str("-Mono"),
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::BackgroundAsset;
    use crate::image_loader::decode_image;
    use crate::style::LineSpacing;

    fn document(footer: Option<&str>, background: BackgroundAsset) -> Document {
        Document::new(
            &EngineConfig::default(),
            LineSpacing::Single,
            background,
            footer,
            None,
            Metadata::default(),
        )
    }

    fn uncompressed() -> PdfWriter {
        PdfWriter {
            compress: false,
            ..PdfWriter::new()
        }
    }

    fn text_of(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn winansi_encodes_bullets_and_rejects_cjk() {
        assert_eq!(encode_winansi("\u{2022} item"), "\\225 item");
        assert_eq!(encode_winansi("caf\u{e9}"), "caf\\351");
        assert_eq!(encode_winansi("a(b)"), "a\\(b\\)");
        assert_eq!(encode_winansi("back\\slash"), "back\\\\slash");
        assert_eq!(encode_winansi("\u{4e2d}"), "?");
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let mut pm = PageManager::new(document(None, BackgroundAsset::Solid(Color::WHITE)));
        pm.new_page().unwrap();
        let bytes = PdfWriter::new().write(pm.finish(), &FontContext::new()).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        assert!(bytes.windows(7).any(|w| w == b"trailer"));
    }

    #[test]
    fn textless_document_embeds_no_fonts() {
        let mut pm = PageManager::new(document(None, BackgroundAsset::Solid(Color::WHITE)));
        pm.new_page().unwrap();
        let bytes = uncompressed().write(pm.finish(), &FontContext::new()).unwrap();
        let text = text_of(&bytes);
        assert!(!text.contains("/Type /Font"));
        assert!(text.contains("/Font <<  >>"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let mut doc = document(None, BackgroundAsset::Solid(Color::WHITE));
        doc.metadata = Metadata {
            title: Some("Salary Slip".to_string()),
            author: Some("Accounts (HR)".to_string()),
            subject: None,
            creator: None,
        };
        let mut pm = PageManager::new(doc);
        pm.new_page().unwrap();
        let bytes = PdfWriter::new().write(pm.finish(), &FontContext::new()).unwrap();
        let text = text_of(&bytes);
        assert!(text.contains("/Title (Salary Slip)"));
        assert!(text.contains("/Author (Accounts \\(HR\\))"));
        assert!(!text.contains("/CreationDate"));
    }

    #[test]
    fn creation_date_is_opt_in() {
        let mut pm = PageManager::new(document(None, BackgroundAsset::Solid(Color::WHITE)));
        pm.new_page().unwrap();
        let date = DateTime::parse_from_rfc3339("2025-01-31T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let bytes = PdfWriter::new()
            .with_creation_date(date)
            .write(pm.finish(), &FontContext::new())
            .unwrap();
        assert!(text_of(&bytes).contains("/CreationDate (D:20250131093000Z)"));
    }

    #[test]
    fn test_bold_font_registered_separately() {
        let mut pm = PageManager::new(document(None, BackgroundAsset::Solid(Color::WHITE)));
        let page = pm.new_page().unwrap();
        let surface = pm.surface_mut(page).unwrap();
        surface.draw_text("A", 50.0, 700.0, 12.0, FontVariant::Regular, Color::BLACK);
        surface.draw_text("B", 50.0, 680.0, 12.0, FontVariant::Bold, Color::BLACK);
        let bytes = PdfWriter::new().write(pm.finish(), &FontContext::new()).unwrap();
        let text = text_of(&bytes);
        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(!text.contains("Courier"), "unused variants are not written");
        assert!(!text.contains("CIDFontType2"));
    }

    #[test]
    fn footer_placeholders_are_substituted_and_centred() {
        let mut pm = PageManager::new(document(
            Some("Page {{pageNumber}} of {{totalPages}}"),
            BackgroundAsset::Solid(Color::WHITE),
        ));
        pm.new_page().unwrap();
        pm.new_page().unwrap();
        let bytes = uncompressed().write(pm.finish(), &FontContext::new()).unwrap();
        let text = text_of(&bytes);
        assert!(text.contains("(Page 1 of 2) Tj"));
        assert!(text.contains("(Page 2 of 2) Tj"));
        assert!(!text.contains("{{"));

        let fonts = FontContext::new();
        let left = 595.28 / 2.0 - fonts.measure("Page 1 of 2", FontVariant::Regular, 8.0) / 2.0;
        assert!(text.contains(&format!("{:.2} ", left)));
    }

    #[test]
    fn strict_mode_rejects_open_earlier_page() {
        let mut doc = document(None, BackgroundAsset::Solid(Color::WHITE));
        let mut pm = PageManager::new(doc.clone());
        pm.new_page().unwrap();
        pm.new_page().unwrap();
        doc = pm.finish();
        doc.pages[0].state = PageState::Open;

        let strict = PdfWriter {
            strict: true,
            ..PdfWriter::new()
        };
        let err = strict.write(doc.clone(), &FontContext::new()).unwrap_err();
        assert!(matches!(err, FolioError::OpenPage { index: 0 }));

        let bytes = PdfWriter::new().write(doc, &FontContext::new()).unwrap();
        assert!(text_of(&bytes).contains("/Count 2"));
    }

    #[test]
    fn background_image_is_written_once() {
        let mut img = image::RgbImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgb([200, 10, 10]));
        let mut png = Vec::new();
        image::ImageEncoder::write_image(
            image::codecs::png::PngEncoder::new(&mut png),
            img.as_raw(),
            2,
            2,
            image::ColorType::Rgb8,
        )
        .unwrap();
        let background = BackgroundAsset::Image {
            key: "bg".into(),
            image: decode_image(png).unwrap(),
        };
        let mut pm = PageManager::new(document(None, background));
        for _ in 0..3 {
            pm.new_page().unwrap();
        }
        let bytes = PdfWriter::new().write(pm.finish(), &FontContext::new()).unwrap();
        let text = text_of(&bytes);
        assert_eq!(text.matches("/Subtype /Image").count(), 1);
        assert_eq!(text.matches("/Im0 ").count(), 3);
        assert!(!text.contains("/SMask"), "opaque PNG needs no mask");
    }

    #[test]
    fn corrupt_custom_font_fails_generation() {
        let mut fonts = FontContext::new();
        fonts
            .register(FontVariant::Bold, "Broken", vec![0, 1, 2, 3])
            .unwrap();
        let mut pm = PageManager::new(document(None, BackgroundAsset::Solid(Color::WHITE)));
        let page = pm.new_page().unwrap();
        pm.surface_mut(page)
            .unwrap()
            .draw_text("Total", 50.0, 700.0, 12.0, FontVariant::Bold, Color::BLACK);
        let err = PdfWriter::new().write(pm.finish(), &fonts).unwrap_err();
        assert!(matches!(err, FolioError::FontError { .. }));
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn identical_documents_serialize_identically() {
        let build = || {
            let mut pm = PageManager::new(document(Some("{{pageNumber}}"), BackgroundAsset::Solid(Color::WHITE)));
            let page = pm.new_page().unwrap();
            pm.surface_mut(page)
                .unwrap()
                .draw_text("Same", 50.0, 700.0, 11.0, FontVariant::Italic, Color::BLACK);
            PdfWriter::new().write(pm.finish(), &FontContext::new()).unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_sanitize_font_name() {
        assert_eq!(sanitize_font_name("Inter", FontVariant::Regular), "Inter");
        assert_eq!(sanitize_font_name("Inter", FontVariant::Bold), "Inter-Bold");
        assert_eq!(sanitize_font_name("Noto Sans", FontVariant::Italic), "NotoSans-Italic");
        assert_eq!(sanitize_font_name("(  )", FontVariant::Monospace), "CustomFont-Mono");
    }

    #[test]
    fn test_tounicode_cmap_format() {
        let mut char_to_gid = HashMap::new();
        char_to_gid.insert('A', 36u16);
        char_to_gid.insert('B', 37u16);

        let cmap = build_tounicode_cmap(&char_to_gid, "TestFont");
        assert!(cmap.contains("begincmap"));
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0024> <0041>"));
        assert!(cmap.contains("<0025> <0042>"));
        assert!(cmap.contains("<0000> <FFFF>"));
    }

    #[test]
    fn astral_characters_map_to_surrogate_pairs() {
        let mut char_to_gid = HashMap::new();
        char_to_gid.insert('\u{1D11E}', 812u16);
        let cmap = build_tounicode_cmap(&char_to_gid, "Music");
        assert!(cmap.contains("<032C> <D834DD1E>"));
        assert_eq!(utf16_hex('\u{0628}'), "0628");
    }
}
