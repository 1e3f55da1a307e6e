//! PDF Rendering
//!
//! Draws each document page onto a PDF page of the document geometry. Text
//! frames become text, graphic frames an outlined box captioned with the
//! placed file name.
//!
//! With a preset font, text is set in that TrueType face embedded as a Type0
//! font (Identity-H, glyph ids as character codes). Without one, text uses the
//! standard Helvetica and characters outside Latin-1 print as '?'. Every
//! frame that loses characters either way is logged and listed in
//! [`Rendered::substituted`].

use log::warn;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document as PdfDocument, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::document::{Bounds, Document, Frame, PageItem};
use crate::fonts::EmbeddedFont;
use crate::host::HostError;
use crate::print::{mm_to_pt, ExportPreset};

const FONT_KEY: &str = "F1";
const LINE_SPACING: f64 = 1.2;
const STANDARD_FONT: &str = "Helvetica";
const REPLACEMENT: u8 = b'?';
/// Entries per `beginbfchar` block allowed by the CMap format
const BFCHAR_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    /// Labels of frames whose text had characters the font cannot show
    pub substituted: Vec<String>,
}

pub fn render(document: &Document, preset: &ExportPreset) -> Result<Rendered, HostError> {
    let embedded = preset.font.as_ref().map(EmbeddedFont::load).transpose()?;
    let mut encoder = TextEncoder::new(embedded.as_ref())?;
    let (width, height) = document.geometry.size_pt();

    let mut pdf = PdfDocument::with_version("1.5");
    let pages_id = pdf.new_object_id();
    let font_id = pdf.new_object_id();
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! { FONT_KEY => font_id },
    });

    let mut kids: Vec<Object> = vec![];
    for page in &document.pages {
        let mut operations = vec![];
        for item in &page.items {
            draw_item(item, height, &mut encoder, &mut operations);
        }
        let encoded = Content { operations }
            .encode()
            .map_err(|e| HostError::Render(e.to_string()))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let font = match &encoder.font {
        TextFont::Standard => dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => STANDARD_FONT,
            "Encoding" => "WinAnsiEncoding",
        },
        TextFont::Embedded { font, face, used } => embed_font(&mut pdf, font, face, used),
    };
    pdf.objects.insert(font_id, Object::Dictionary(font));

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), real(width), real(height)],
    };
    pdf.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    let info_id = pdf.add_object(dictionary! {
        "Title" => text_string(&document.name),
        "Creator" => text_string(&preset.name),
    });
    pdf.trailer.set("Info", info_id);

    if preset.compress {
        pdf.compress();
    }

    let mut bytes = vec![];
    pdf.save_to(&mut bytes)
        .map_err(|e| HostError::Render(e.to_string()))?;
    Ok(Rendered {
        bytes,
        substituted: encoder.substituted,
    })
}

/// Distinct characters of the document's printed text outside Latin-1.
pub fn non_latin1_text(document: &Document) -> String {
    fn collect(item: &PageItem, chars: &mut BTreeSet<char>) {
        let text = match &item.frame {
            Frame::Text { contents, .. } => contents.clone(),
            Frame::Graphic { graphic: Some(g) } => caption(&g.path),
            _ => String::new(),
        };
        chars.extend(text.chars().filter(|c| u32::from(*c) > 0xFF));
        for child in &item.children {
            collect(child, chars);
        }
    }

    let mut chars = BTreeSet::new();
    for page in &document.pages {
        for item in &page.items {
            collect(item, &mut chars);
        }
    }
    chars.into_iter().collect()
}

enum TextFont<'f> {
    Standard,
    Embedded {
        font: &'f EmbeddedFont,
        face: ttf_parser::Face<'f>,
        /// glyph id -> (advance in 1/1000 em, character it shows)
        used: BTreeMap<u16, (i64, char)>,
    },
}

struct TextEncoder<'f> {
    font: TextFont<'f>,
    substituted: Vec<String>,
}

impl<'f> TextEncoder<'f> {
    fn new(font: Option<&'f EmbeddedFont>) -> Result<Self, HostError> {
        let font = match font {
            Some(font) => TextFont::Embedded {
                face: font
                    .face()
                    .map_err(|e| HostError::Render(format!("font {}: {}", font.name, e)))?,
                font,
                used: BTreeMap::new(),
            },
            None => TextFont::Standard,
        };
        Ok(Self {
            font,
            substituted: vec![],
        })
    }

    fn font_name(&self) -> &str {
        match &self.font {
            TextFont::Standard => STANDARD_FONT,
            TextFont::Embedded { font, .. } => &font.name,
        }
    }

    /// String operand for `Tj` showing `line`
    fn encode(&mut self, label: &str, line: &str) -> Object {
        let mut missing = 0usize;
        let operand = match &mut self.font {
            TextFont::Standard => {
                let mut bytes = Vec::with_capacity(line.len());
                for c in line.chars() {
                    match u8::try_from(u32::from(c)) {
                        Ok(b) => bytes.push(b),
                        Err(_) => {
                            missing += 1;
                            bytes.push(REPLACEMENT);
                        }
                    }
                }
                Object::string_literal(bytes)
            }
            TextFont::Embedded { face, used, .. } => {
                let scale = 1000.0 / f64::from(face.units_per_em());
                let mut bytes = Vec::with_capacity(line.len() * 2);
                for c in line.chars() {
                    let gid = match face.glyph_index(c) {
                        Some(gid) => {
                            let advance = face
                                .glyph_hor_advance(gid)
                                .map_or(0, |a| (f64::from(a) * scale).round() as i64);
                            used.entry(gid.0).or_insert((advance, c));
                            gid.0
                        }
                        None => {
                            missing += 1;
                            0
                        }
                    };
                    bytes.extend_from_slice(&gid.to_be_bytes());
                }
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        };

        if missing > 0 {
            warn!(
                "Frame {}: {} character(s) not in font {}, printed as substitutes",
                label,
                missing,
                self.font_name()
            );
            if !self.substituted.iter().any(|l| l == label) {
                self.substituted.push(label.to_string());
            }
        }
        operand
    }
}

fn embed_font(
    pdf: &mut PdfDocument,
    font: &EmbeddedFont,
    face: &ttf_parser::Face<'_>,
    used: &BTreeMap<u16, (i64, char)>,
) -> Dictionary {
    let scale = 1000.0 / f64::from(face.units_per_em());
    let units = |v: i16| Object::Integer((f64::from(v) * scale).round() as i64);
    let name = || Object::Name(font.name.as_bytes().to_vec());
    let bbox = face.global_bounding_box();

    let file_id = pdf.add_object(Stream::new(
        dictionary! { "Length1" => font.data.len() as i64 },
        font.data.clone(),
    ));
    let descriptor_id = pdf.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => name(),
        "Flags" => 32_i64,
        "FontBBox" => vec![units(bbox.x_min), units(bbox.y_min), units(bbox.x_max), units(bbox.y_max)],
        "ItalicAngle" => 0_i64,
        "Ascent" => units(face.ascender()),
        "Descent" => units(face.descender()),
        "CapHeight" => units(face.capital_height().unwrap_or(face.ascender())),
        "StemV" => 80_i64,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = used
        .iter()
        .flat_map(|(&gid, &(advance, _))| {
            [
                Object::Integer(i64::from(gid)),
                Object::Array(vec![Object::Integer(advance)]),
            ]
        })
        .collect();
    let cid_font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => name(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0_i64,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000_i64,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });
    let to_unicode_id = pdf.add_object(Stream::new(dictionary! {}, to_unicode_cmap(used)));

    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => name(),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    }
}

/// CMap from glyph ids back to Unicode, so viewers can copy the text
fn to_unicode_cmap(used: &BTreeMap<u16, (i64, char)>) -> Vec<u8> {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<(u16, char)> = used.iter().map(|(&gid, &(_, c))| (gid, c)).collect();
    for block in entries.chunks(BFCHAR_LIMIT) {
        let _ = writeln!(cmap, "{} beginbfchar", block.len());
        for &(gid, c) in block {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            let _ = writeln!(cmap, "<{gid:04X}> <{hex}>");
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap.into_bytes()
}

/// Info dictionary string: Latin-1 when it fits, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    let latin1: Option<Vec<u8>> = text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect();
    match latin1 {
        Some(bytes) => Object::string_literal(bytes),
        None => {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            Object::String(bytes, StringFormat::Hexadecimal)
        }
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn caption(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// PDF rectangle (x, y, w, h) in points, y measured from the bottom edge.
fn rect_pt(bounds: &Bounds, page_height: f64) -> (f64, f64, f64, f64) {
    let x = mm_to_pt(bounds.x);
    let w = mm_to_pt(bounds.width);
    let h = mm_to_pt(bounds.height);
    let y = page_height - mm_to_pt(bounds.y) - h;
    (x, y, w, h)
}

fn draw_item(item: &PageItem, page_height: f64, encoder: &mut TextEncoder<'_>, ops: &mut Vec<Operation>) {
    let (x, y, w, h) = rect_pt(&item.bounds, page_height);
    match &item.frame {
        Frame::Text { contents, font_size } => {
            let top = y + h - font_size;
            draw_text(&item.label, contents, *font_size, (x, top), encoder, ops);
        }
        Frame::Graphic { graphic } => {
            ops.push(Operation::new("q", vec![]));
            ops.push(Operation::new("w", vec![real(0.5)]));
            ops.push(Operation::new("re", vec![real(x), real(y), real(w), real(h)]));
            ops.push(Operation::new("S", vec![]));
            ops.push(Operation::new("Q", vec![]));
            if let Some(graphic) = graphic {
                let caption = caption(&graphic.path);
                draw_text(&item.label, &caption, 8.0, (x + 4.0, y + 4.0), encoder, ops);
            }
        }
        Frame::Other => {}
    }
    for child in &item.children {
        draw_item(child, page_height, encoder, ops);
    }
}

fn draw_text(
    label: &str,
    text: &str,
    size: f64,
    (x, top): (f64, f64),
    encoder: &mut TextEncoder<'_>,
    ops: &mut Vec<Operation>,
) {
    if text.is_empty() {
        return;
    }
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![FONT_KEY.into(), real(size)]));
    ops.push(Operation::new("TL", vec![real(size * LINE_SPACING)]));
    ops.push(Operation::new("Td", vec![real(x), real(top)]));
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("Tj", vec![encoder.encode(label, line)]));
    }
    ops.push(Operation::new("ET", vec![]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Page, PlacedGraphic};
    use crate::fonts::find_system_font;
    use crate::print::PageGeometry;
    use std::path::PathBuf;

    fn sample(title: &str) -> Document {
        let mut doc = Document::new("sample", PageGeometry::a4_magazine());
        let bounds = Bounds { x: 10.0, y: 10.0, width: 100.0, height: 40.0 };
        doc.pages.push(Page {
            items: vec![
                PageItem::text("COVER_TITLE", title).with_bounds(bounds),
                PageItem::graphic(
                    "COVER_IMAGE",
                    Some(PlacedGraphic { path: PathBuf::from("img/cover.jpg"), fit: vec![] }),
                )
                .with_bounds(bounds),
            ],
        });
        doc.pages.push(Page::default());
        doc
    }

    fn font_subtypes(bytes: &[u8]) -> Vec<Vec<u8>> {
        let parsed = PdfDocument::load_mem(bytes).unwrap();
        parsed
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .filter(|d| d.get(b"Type").and_then(Object::as_name).ok() == Some(b"Font".as_slice()))
            .filter_map(|d| d.get(b"Subtype").and_then(Object::as_name).ok().map(<[u8]>::to_vec))
            .collect()
    }

    #[test]
    fn renders_one_pdf_page_per_document_page() {
        let rendered = render(&sample("Issue 1\nSpring"), &ExportPreset::high_quality_print()).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF-1.5"));
        assert!(rendered.substituted.is_empty());

        let parsed = PdfDocument::load_mem(&rendered.bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 2);
        assert_eq!(font_subtypes(&rendered.bytes), vec![b"Type1".to_vec()]);
    }

    #[test]
    fn standard_font_reports_frames_it_cannot_print() {
        let rendered = render(&sample("Café Київ"), &ExportPreset::high_quality_print()).unwrap();
        assert_eq!(rendered.substituted, vec!["COVER_TITLE".to_string()]);
    }

    #[test]
    fn standard_font_substitutes_outside_latin1() {
        let mut encoder = TextEncoder::new(None).unwrap();
        let operand = encoder.encode("T", "Café Київ");
        assert_eq!(operand.as_str().unwrap(), b"Caf\xe9 ????");
        assert_eq!(encoder.substituted, vec!["T".to_string()]);
    }

    #[test]
    fn embedded_font_keeps_cyrillic() {
        // Hosts without a Cyrillic-capable TrueType font have nothing to check
        let Some(source) = find_system_font("Київ") else {
            return;
        };
        let preset = ExportPreset::high_quality_print().with_font(source);

        let rendered = render(&sample("Café Київ"), &preset).unwrap();

        assert!(rendered.substituted.is_empty());
        let subtypes = font_subtypes(&rendered.bytes);
        assert!(subtypes.contains(&b"Type0".to_vec()));
        assert!(subtypes.contains(&b"CIDFontType2".to_vec()));
    }

    #[test]
    fn missing_font_file_fails_the_render() {
        let preset = ExportPreset::high_quality_print()
            .with_font(crate::fonts::FontSource::new("/nonexistent/font.ttf"));
        assert!(matches!(render(&sample("x"), &preset), Err(HostError::Font(_))));
    }

    #[test]
    fn non_latin1_text_lists_distinct_chars() {
        let expected: String = "Київ".chars().collect::<BTreeSet<_>>().into_iter().collect();
        assert_eq!(non_latin1_text(&sample("Café Київ Київ")), expected);
        assert_eq!(non_latin1_text(&sample("Café")), "");
    }

    #[test]
    fn info_title_uses_utf16_outside_latin1() {
        assert_eq!(text_string("Café").as_str().unwrap(), b"Caf\xe9");
        let wide = text_string("Ж");
        assert_eq!(wide.as_str().unwrap(), &[0xFE_u8, 0xFF, 0x04, 0x16]);
    }

    #[test]
    fn cmap_maps_glyphs_back_to_text() {
        let used = BTreeMap::from([(36_u16, (600_i64, 'A')), (610, (640, 'Ж'))]);
        let cmap = String::from_utf8(to_unicode_cmap(&used)).unwrap();
        assert!(cmap.contains("2 beginbfchar\n<0024> <0041>\n<0262> <0416>\nendbfchar"));
    }

    #[test]
    fn rect_flips_y_axis() {
        let bounds = Bounds { x: 0.0, y: 0.0, width: 25.4, height: 25.4 };
        let (x, y, w, h) = rect_pt(&bounds, 800.0);
        assert_eq!(x, 0.0);
        assert!((w - 72.0).abs() < 1e-9);
        assert!((h - 72.0).abs() < 1e-9);
        assert!((y - 728.0).abs() < 1e-9);
    }
}
