use std::io::Cursor;

use printpdf::image_crate::DynamicImage;
use printpdf::{
    path::PaintMode, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rect, Rgb,
};
use time::Date;

use crate::error::QuoteError;

use super::fonts::{FontWeight, BOLD_FONT, REGULAR_FONT};
use super::layout::{DocumentLayout, DrawOp, LOGO_DPI, PAGE_H, PAGE_W};

fn render_err(e: impl std::fmt::Display) -> QuoteError {
    QuoteError::Render(e.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

fn draw_rule_with_thickness(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32, thickness: f32) {
    layer.set_outline_thickness(thickness);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn fill_rect_gray(layer: &PdfLayerReference, x: f32, y_top: f32, w: f32, h: f32, gray: f32) {
    layer.set_fill_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
    let rect = Rect::new(Mm(x), Mm(y_top - h), Mm(x + w), Mm(y_top)).with_mode(PaintMode::Fill);
    layer.add_rect(rect);
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn draw_op(layer: &PdfLayerReference, fonts: &Fonts, logo: Option<&DynamicImage>, op: &DrawOp) {
    match op {
        DrawOp::Text {
            text,
            x,
            y,
            size,
            weight,
        } => layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), fonts.get(*weight)),
        DrawOp::Rule { x1, x2, y, thickness } => draw_rule_with_thickness(layer, *x1, *x2, *y, *thickness),
        DrawOp::FillRect { x, y_top, w, h, gray } => fill_rect_gray(layer, *x, *y_top, *w, *h, *gray),
        DrawOp::Logo { x, y, scale } => {
            // layout only emits a logo op when an image was supplied
            if let Some(img) = logo {
                Image::from_dynamic_image(img).add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(*x)),
                        translate_y: Some(Mm(*y)),
                        rotate: None,
                        scale_x: Some(*scale),
                        scale_y: Some(*scale),
                        dpi: Some(LOGO_DPI),
                    },
                );
            }
        }
    }
}

/// Plays a laid-out document into PDF bytes. Synchronous: printpdf's
/// document handles are not `Send`, so all async work happens before this.
pub fn render_pdf(
    title: &str,
    document_id: &str,
    issue_date: Date,
    layout: &DocumentLayout,
    logo: Option<&DynamicImage>,
) -> Result<Vec<u8>, QuoteError> {
    let stamp = issue_date.midnight().assume_utc();
    let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let doc = doc
        .with_document_id(document_id.to_string())
        .with_creation_date(stamp)
        .with_mod_date(stamp)
        .with_metadata_date(stamp);

    let fonts = Fonts {
        regular: doc
            .add_external_font(Cursor::new(REGULAR_FONT))
            .map_err(render_err)?,
        bold: doc.add_external_font(Cursor::new(BOLD_FONT)).map_err(render_err)?,
    };

    for (idx, page) in layout.pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        for op in &page.ops {
            draw_op(&layer, &fonts, logo, op);
        }
    }

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(render_err)?;
    let mut bytes = writer.into_inner().map_err(render_err)?;
    stabilize_trailer_id(&mut bytes);
    Ok(bytes)
}

/// printpdf writes a random instance id as the second `/ID` entry of the
/// trailer. Replace it in place with letters derived from the body so equal
/// layouts give equal bytes. The trailer follows the xref table, so offsets
/// are unaffected as long as the length is kept.
fn stabilize_trailer_id(bytes: &mut [u8]) {
    let Some(trailer) = rfind(bytes, b"trailer") else {
        return;
    };
    let Some(id) = find(&bytes[trailer..], b"/ID").map(|i| trailer + i) else {
        return;
    };
    let Some(first_open) = find(&bytes[id..], b"(").map(|i| id + i) else {
        return;
    };
    let Some(first_close) = literal_end(bytes, first_open) else {
        return;
    };
    let Some(second_open) = find(&bytes[first_close..], b"(").map(|i| first_close + i) else {
        return;
    };
    let Some(second_close) = literal_end(bytes, second_open) else {
        return;
    };

    let mut hash = fnv1a(&bytes[..trailer]);
    for b in &mut bytes[second_open + 1..second_close] {
        *b = b'A' + (hash % 26) as u8;
        hash = hash.rotate_left(5) ^ hash.wrapping_mul(0x100_0000_01b3);
    }
}

/// Index of the `)` closing the literal string opened at `open`.
fn literal_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |h, &b| {
        (h ^ u64::from(b)).wrapping_mul(0x100_0000_01b3)
    })
}
