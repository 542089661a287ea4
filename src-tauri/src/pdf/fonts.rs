use serde::Serialize;
use ttf_parser::Face;

use crate::error::QuoteError;

pub static REGULAR_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
pub static BOLD_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

// PDF font sizes are in points; layout coordinates are in millimeters.
const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Metrics of the embedded fonts, used for wrapping and right alignment.
pub struct FontMetrics {
    regular: Face<'static>,
    bold: Face<'static>,
}

impl FontMetrics {
    pub fn embedded() -> Result<Self, QuoteError> {
        let parse = |bytes: &'static [u8], name: &str| {
            Face::parse(bytes, 0)
                .map_err(|e| QuoteError::Render(format!("failed to parse embedded font {name}: {e}")))
        };
        Ok(Self {
            regular: parse(REGULAR_FONT, "DejaVuSans")?,
            bold: parse(BOLD_FONT, "DejaVuSans-Bold")?,
        })
    }

    fn face(&self, weight: FontWeight) -> &Face<'static> {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }

    pub fn text_width_mm(&self, weight: FontWeight, text: &str, font_size_pt: f32) -> f32 {
        let face = self.face(weight);
        let units_per_em = face.units_per_em() as f32;
        if units_per_em <= 0.0 {
            return 0.0;
        }

        let mut width_units: i32 = 0;
        for ch in text.chars() {
            let Some(gid) = face.glyph_index(ch) else {
                continue;
            };
            width_units += face.glyph_hor_advance(gid).unwrap_or(0) as i32;
        }

        (width_units as f32 / units_per_em) * font_size_pt * PT_TO_MM
    }

    pub fn ascent_mm(&self, weight: FontWeight, font_size_pt: f32) -> f32 {
        let face = self.face(weight);
        let units_per_em = face.units_per_em() as f32;
        if units_per_em <= 0.0 {
            return font_size_pt * PT_TO_MM * 0.80;
        }
        (face.ascender() as f32 / units_per_em) * font_size_pt * PT_TO_MM
    }

    pub fn descent_mm(&self, weight: FontWeight, font_size_pt: f32) -> f32 {
        let face = self.face(weight);
        let units_per_em = face.units_per_em() as f32;
        if units_per_em <= 0.0 {
            return font_size_pt * PT_TO_MM * 0.20;
        }
        // descender is negative in the font tables
        ((-(face.descender() as f32)).max(0.0) / units_per_em) * font_size_pt * PT_TO_MM
    }

    /// Greedy word wrap to `max_width_mm`. Words wider than a line are split
    /// by character. Explicit line breaks in `input` are kept; blank lines are
    /// dropped.
    pub fn wrap(&self, weight: FontWeight, input: &str, font_size: f32, max_width_mm: f32) -> Vec<String> {
        let mut out = Vec::new();
        for paragraph in input.lines() {
            self.wrap_paragraph(weight, paragraph.trim(), font_size, max_width_mm, &mut out);
        }
        out
    }

    fn wrap_paragraph(
        &self,
        weight: FontWeight,
        s: &str,
        font_size: f32,
        max_width_mm: f32,
        out: &mut Vec<String>,
    ) {
        let fits = |t: &str| self.text_width_mm(weight, t, font_size) <= max_width_mm;
        let mut current = String::new();

        for word in s.split_whitespace() {
            if !current.is_empty() {
                let candidate = format!("{} {}", current, word);
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                out.push(std::mem::take(&mut current));
            }

            if fits(word) {
                current.push_str(word);
                continue;
            }

            let mut chunk = String::new();
            for ch in word.chars() {
                let candidate = format!("{}{}", chunk, ch);
                if fits(&candidate) {
                    chunk = candidate;
                } else {
                    if !chunk.is_empty() {
                        out.push(chunk);
                    }
                    chunk = ch.to_string();
                }
            }
            current = chunk;
        }

        if !current.is_empty() {
            out.push(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_is_wider_than_regular() {
        let m = FontMetrics::embedded().unwrap();
        let r = m.text_width_mm(FontWeight::Regular, "QUOTATION", 12.0);
        let b = m.text_width_mm(FontWeight::Bold, "QUOTATION", 12.0);
        assert!(r > 0.0);
        assert!(b > r);
        assert_eq!(m.text_width_mm(FontWeight::Regular, "", 12.0), 0.0);
    }

    #[test]
    fn width_scales_with_size() {
        let m = FontMetrics::embedded().unwrap();
        let small = m.text_width_mm(FontWeight::Regular, "1,234.00", 8.0);
        let large = m.text_width_mm(FontWeight::Regular, "1,234.00", 16.0);
        assert!((large - 2.0 * small).abs() < 0.001);
        assert!(m.ascent_mm(FontWeight::Regular, 10.0) > m.descent_mm(FontWeight::Regular, 10.0));
    }

    #[test]
    fn wrapping_respects_width() {
        let m = FontMetrics::embedded().unwrap();
        let text = "Goods are carried at the owner's risk unless insurance cover is included in this quotation.";
        let lines = m.wrap(FontWeight::Regular, text, 9.0, 50.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(m.text_width_mm(FontWeight::Regular, line, 9.0) <= 50.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn long_words_are_split_and_breaks_kept() {
        let m = FontMetrics::embedded().unwrap();
        let lines = m.wrap(FontWeight::Regular, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", 10.0, 20.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");

        let lines = m.wrap(FontWeight::Regular, "first\n\nsecond", 10.0, 100.0);
        assert_eq!(lines, vec!["first", "second"]);
    }
}
