//! Measured vertical flow for the quotation PDF.
//!
//! Every section is built as a [`Block`]: draw operations positioned relative
//! to the block's top edge plus the block's measured height. The composer
//! stacks blocks downwards from the top margin, adding each height to the
//! cursor, and opens a new page whenever the next block would cross into the
//! footer reserve. Coordinates are millimeters with a bottom-left origin, the
//! same space printpdf draws in.

use serde::Serialize;

use crate::document::{LabeledRow, QuoteDocument, TextSection};

use super::fonts::{FontMetrics, FontWeight};

pub const PAGE_W: f32 = 210.0;
pub const PAGE_H: f32 = 297.0;
const PAGE_MARGIN_X: f32 = 15.0;
const PAGE_MARGIN_TOP: f32 = 12.0;
const PAGE_MARGIN_BOTTOM: f32 = 12.0;
const FOOTER_RESERVE: f32 = 8.0;

const CONTENT_LEFT: f32 = PAGE_MARGIN_X;
const CONTENT_RIGHT: f32 = PAGE_W - PAGE_MARGIN_X;
const CONTENT_W: f32 = CONTENT_RIGHT - CONTENT_LEFT;
pub const CONTENT_TOP: f32 = PAGE_H - PAGE_MARGIN_TOP;
pub const CONTENT_BOTTOM: f32 = PAGE_MARGIN_BOTTOM + FOOTER_RESERVE;
pub const FOOTER_RULE_Y: f32 = PAGE_MARGIN_BOTTOM + 5.0;
const PAGE_CAPACITY: f32 = CONTENT_TOP - CONTENT_BOTTOM;

const PT_TO_MM: f32 = 25.4 / 72.0;
// Conservative glyph extents used when cutting oversized blocks.
const TEXT_ASCENT_EM: f32 = 0.95;
const TEXT_DESCENT_EM: f32 = 0.25;

const CELL_PAD_X: f32 = 1.2;
const CELL_PAD_Y: f32 = 3.0;
const COL_GAP: f32 = 3.0;
const COLUMN_GAP: f32 = 10.0;
const SECTION_GAP: f32 = 6.0;
const HEADER_ROW_GAP: f32 = 0.8;

pub const LOGO_DPI: f32 = 300.0;
const LOGO_AREA_W: f32 = 52.0;
const LOGO_GAP: f32 = 6.0;
const LOGO_MIN_H: f32 = 14.0;

const TITLE_SIZE: f32 = 15.0;
const COMPANY_NAME_SIZE: f32 = 13.0;
const NAME_SIZE: f32 = 11.0;
const SECTION_TITLE_SIZE: f32 = 9.5;
const TEXT_SIZE: f32 = 8.3;
const TABLE_HEADER_SIZE: f32 = 8.6;
const TOTALS_LABEL_SIZE: f32 = 8.8;
const TOTALS_VALUE_SIZE: f32 = 9.3;
const TOTALS_EMPH_LABEL_SIZE: f32 = 10.0;
const TOTALS_EMPH_VALUE_SIZE: f32 = 10.5;
const BODY_SIZE: f32 = 8.5;
const FOOTER_SIZE: f32 = 6.5;

const HEADER_BAND_H: f32 = 7.0;
const HEADER_BAND_GRAY: f32 = 0.92;
const TABLE_ROW_PAD: f32 = 1.4;
const TOTALS_ROW_H: f32 = 7.6;
const INDEX_COL_W: f32 = 8.0;

/// Pixel size of a decoded logo; the layout only needs its aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoSize {
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        thickness: f32,
    },
    FillRect {
        x: f32,
        y_top: f32,
        w: f32,
        h: f32,
        gray: f32,
    },
    /// `y` is the bottom edge of the image.
    Logo { x: f32, y: f32, scale: f32 },
}

impl DrawOp {
    fn shifted(mut self, dy: f32) -> Self {
        match &mut self {
            DrawOp::Text { y, .. } | DrawOp::Rule { y, .. } | DrawOp::Logo { y, .. } => *y += dy,
            DrawOp::FillRect { y_top, .. } => *y_top += dy,
        }
        self
    }

    /// Vertical extent as (top, bottom) depths below a block top whose ops
    /// sit at y <= 0.
    fn extent(&self) -> (f32, f32) {
        match self {
            DrawOp::Text { y, size, .. } => {
                let em = size * PT_TO_MM;
                (-y - em * TEXT_ASCENT_EM, -y + em * TEXT_DESCENT_EM)
            }
            DrawOp::Rule { y, .. } => (-y, -y),
            DrawOp::FillRect { y_top, h, .. } => (-y_top, -y_top + h),
            DrawOp::Logo { y, .. } => (-y, -y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A measured section. Ops are relative to the block top (y = 0, growing
/// negative downwards).
#[derive(Debug, Clone, Default)]
struct Block {
    height: f32,
    ops: Vec<DrawOp>,
}

impl Block {
    /// Cuts the block above the first op that reaches below `limit`. The cut
    /// never passes through an op. `None` when nothing reaches below `limit`
    /// or the offending op starts at the very top.
    fn split_at(self, limit: f32) -> Option<(Block, Block)> {
        let cut = self
            .ops
            .iter()
            .map(DrawOp::extent)
            .filter(|(_, bottom)| *bottom > limit)
            .map(|(top, _)| top)
            .fold(f32::INFINITY, f32::min);
        if !cut.is_finite() || cut <= 0.0 {
            return None;
        }

        let height = self.height;
        let (head, tail): (Vec<_>, Vec<_>) = self.ops.into_iter().partition(|op| op.extent().0 < cut);
        Some((
            Block { height: cut, ops: head },
            Block {
                height: (height - cut).max(0.0),
                ops: tail.into_iter().map(|op| op.shifted(cut)).collect(),
            },
        ))
    }
}

struct Composer {
    pages: Vec<Vec<DrawOp>>,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: CONTENT_TOP,
        }
    }

    fn at_page_top(&self) -> bool {
        self.y >= CONTENT_TOP
    }

    fn fits(&self, height: f32) -> bool {
        self.y - height >= CONTENT_BOTTOM
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = CONTENT_TOP;
    }

    /// Places a block, moving it to a fresh page when it does not fit. A block
    /// taller than a whole page is split across pages instead.
    fn place(&mut self, mut block: Block) {
        if !self.fits(block.height) && !self.at_page_top() && block.height <= PAGE_CAPACITY {
            self.new_page();
        }
        while !self.fits(block.height) {
            match block.clone().split_at(self.y - CONTENT_BOTTOM) {
                Some((head, tail)) => {
                    self.put(head);
                    self.new_page();
                    block = tail;
                }
                None if self.at_page_top() => break,
                None => self.new_page(),
            }
        }
        self.put(block);
    }

    fn put(&mut self, block: Block) {
        let top = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.extend(block.ops.into_iter().map(|op| op.shifted(top)));
        }
        self.y -= block.height;
    }

    /// Vertical space between sections; dropped at the top of a page.
    fn gap(&mut self, h: f32) {
        if !self.at_page_top() {
            self.y -= h;
        }
    }

    fn place_table(&mut self, header: &Block, rows: Vec<Block>) {
        let first_h = rows.first().map(|r| r.height).unwrap_or(0.0);
        if !self.fits(header.height + first_h) && !self.at_page_top() {
            self.new_page();
        }
        self.place(header.clone());
        for row in rows {
            if !self.fits(row.height) {
                self.new_page();
                self.place(header.clone());
            }
            self.place(row);
        }
    }

    fn place_text(&mut self, title: Block, lines: Vec<Block>) {
        let first_h = lines.first().map(|l| l.height).unwrap_or(0.0);
        if !self.fits(title.height + first_h) && !self.at_page_top() {
            self.new_page();
        }
        self.place(title);
        for line in lines {
            self.place(line);
        }
    }
}

struct TableGrid {
    index_x: f32,
    desc_x: f32,
    desc_w: f32,
    qty_right: f32,
    price_right: f32,
    amount_right: f32,
}

fn line_advance(size: f32) -> f32 {
    size * PT_TO_MM * 1.35
}

pub struct Layouter<'m> {
    metrics: &'m FontMetrics,
}

impl<'m> Layouter<'m> {
    pub fn new(metrics: &'m FontMetrics) -> Self {
        Self { metrics }
    }

    /// Positions the whole document. Pure: identical input gives identical
    /// output.
    pub fn layout(&self, doc: &QuoteDocument, logo: Option<LogoSize>) -> DocumentLayout {
        let mut c = Composer::new();

        c.place(self.header_block(doc, logo));
        c.place(self.title_block(&doc.title));
        c.place(self.parties_block(doc));
        c.gap(SECTION_GAP);
        c.place(self.info_block(&doc.service.title, &doc.service.rows, CONTENT_LEFT, CONTENT_W));
        c.gap(SECTION_GAP);

        let grid = self.table_grid(doc);
        let header = self.table_header_block(doc, &grid);
        let rows = doc
            .table_rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                self.table_row_block(
                    &grid,
                    [&row.index, &row.description, &row.quantity, &row.unit_price, &row.amount],
                    i + 1 == doc.table_rows.len(),
                )
            })
            .collect();
        c.place_table(&header, rows);
        c.place(self.totals_block(doc, &grid));

        for section in [&doc.notes, &doc.terms].into_iter().flatten() {
            c.gap(SECTION_GAP);
            let (title, lines) = self.text_section_blocks(section);
            c.place_text(title, lines);
        }

        let total = c.pages.len();
        let pages = c
            .pages
            .into_iter()
            .enumerate()
            .map(|(i, mut ops)| {
                ops.extend(self.footer_ops(doc, i + 1, total));
                PageLayout { ops }
            })
            .collect();
        DocumentLayout { pages }
    }

    fn text(&self, b: &mut Block, text: &str, x: f32, depth: f32, size: f32, weight: FontWeight) -> f32 {
        let baseline = depth + self.metrics.ascent_mm(weight, size);
        b.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y: -baseline,
            size,
            weight,
        });
        depth + line_advance(size)
    }

    fn text_right(
        &self,
        b: &mut Block,
        text: &str,
        x_right: f32,
        baseline: f32,
        size: f32,
        weight: FontWeight,
    ) {
        let w = self.metrics.text_width_mm(weight, text, size);
        b.ops.push(DrawOp::Text {
            text: text.to_string(),
            x: (x_right - w).max(0.0),
            y: -baseline,
            size,
            weight,
        });
    }

    /// `Label: value` rows with the value wrapped in the space after the
    /// label; unlabeled rows wrap across the full width. Returns the depth
    /// below the last row.
    fn labeled_rows(&self, b: &mut Block, rows: &[LabeledRow], x: f32, mut depth: f32, width: f32) -> f32 {
        let adv = line_advance(TEXT_SIZE);
        for row in rows {
            let value = row.value.trim();
            if value.is_empty() {
                continue;
            }
            let (prefix, prefix_w) = match &row.label {
                Some(label) => {
                    let p = format!("{}: ", label);
                    let w = self.metrics.text_width_mm(FontWeight::Regular, &p, TEXT_SIZE);
                    (Some(p), w)
                }
                None => (None, 0.0),
            };
            let value_w = (width - prefix_w).max(6.0);
            let lines = self.metrics.wrap(FontWeight::Regular, value, TEXT_SIZE, value_w);
            if lines.is_empty() {
                continue;
            }
            if let Some(p) = &prefix {
                self.text(b, p, x, depth, TEXT_SIZE, FontWeight::Regular);
            }
            for (idx, line) in lines.iter().enumerate() {
                self.text(
                    b,
                    line,
                    x + prefix_w,
                    depth + idx as f32 * adv,
                    TEXT_SIZE,
                    FontWeight::Regular,
                );
            }
            depth += lines.len() as f32 * adv + HEADER_ROW_GAP;
        }
        depth
    }

    fn header_block(&self, doc: &QuoteDocument, logo: Option<LogoSize>) -> Block {
        let mut b = Block::default();
        let text_right = if logo.is_some() {
            (CONTENT_RIGHT - LOGO_AREA_W).max(CONTENT_LEFT + 20.0)
        } else {
            CONTENT_RIGHT
        };
        let text_w = (text_right - CONTENT_LEFT).max(10.0);

        let mut depth = 0.0;
        if !doc.company.name.is_empty() {
            let lines = self
                .metrics
                .wrap(FontWeight::Bold, &doc.company.name, COMPANY_NAME_SIZE, text_w);
            for line in lines {
                depth = self.text(&mut b, &line, CONTENT_LEFT, depth, COMPANY_NAME_SIZE, FontWeight::Bold);
            }
            depth += 0.6;
        }
        depth = self.labeled_rows(&mut b, &doc.company.rows, CONTENT_LEFT, depth, text_w);

        let mut logo_h = 0.0;
        if let Some(size) = logo {
            let natural_w = size.width_px.max(1) as f32 / LOGO_DPI * 25.4;
            let natural_h = size.height_px.max(1) as f32 / LOGO_DPI * 25.4;
            let box_left = (text_right + LOGO_GAP).min(CONTENT_RIGHT);
            let box_w = (CONTENT_RIGHT - box_left).max(1.0);
            let target_h = depth.max(LOGO_MIN_H);
            let scale = (box_w / natural_w).min(target_h / natural_h).max(0.01);
            let scaled_w = natural_w * scale;
            logo_h = natural_h * scale;
            b.ops.push(DrawOp::Logo {
                x: (CONTENT_RIGHT - scaled_w).max(box_left),
                y: -logo_h,
                scale,
            });
        }

        let body_h = f32::max(depth, logo_h) + 2.5;
        b.ops.push(DrawOp::Rule {
            x1: CONTENT_LEFT,
            x2: CONTENT_RIGHT,
            y: -body_h,
            thickness: 0.85,
        });
        b.height = body_h + 4.0;
        b
    }

    fn title_block(&self, title: &str) -> Block {
        let mut b = Block::default();
        let w = self.metrics.text_width_mm(FontWeight::Bold, title, TITLE_SIZE);
        let x = CONTENT_LEFT + ((CONTENT_W - w) / 2.0).max(0.0);
        let depth = self.text(&mut b, title, x, 0.0, TITLE_SIZE, FontWeight::Bold);
        b.height = depth + 4.0;
        b
    }

    fn section_title(&self, b: &mut Block, title: &str, x: f32, depth: f32) -> f32 {
        self.text(b, title, x, depth, SECTION_TITLE_SIZE, FontWeight::Bold) + 0.8
    }

    fn parties_block(&self, doc: &QuoteDocument) -> Block {
        let mut b = Block::default();
        let col_w = (CONTENT_W - COLUMN_GAP) / 2.0;
        let right_x = CONTENT_LEFT + col_w + COLUMN_GAP;

        let mut left = self.section_title(&mut b, &doc.bill_to.title, CONTENT_LEFT, 0.0);
        for line in self.metrics.wrap(FontWeight::Bold, &doc.bill_to_name, NAME_SIZE, col_w) {
            left = self.text(&mut b, &line, CONTENT_LEFT, left, NAME_SIZE, FontWeight::Bold);
        }
        left = self.labeled_rows(&mut b, &doc.bill_to.rows, CONTENT_LEFT, left, col_w);

        let mut right = self.section_title(&mut b, &doc.details.title, right_x, 0.0);
        right = self.labeled_rows(&mut b, &doc.details.rows, right_x, right, col_w);

        b.height = left.max(right);
        b
    }

    fn info_block(&self, title: &str, rows: &[LabeledRow], x: f32, width: f32) -> Block {
        let mut b = Block::default();
        let depth = self.section_title(&mut b, title, x, 0.0);
        b.height = self.labeled_rows(&mut b, rows, x, depth, width);
        b
    }

    fn table_grid(&self, doc: &QuoteDocument) -> TableGrid {
        let sample_money = "000,000,000.00";
        let header_w = |s: &str| self.metrics.text_width_mm(FontWeight::Bold, s, TABLE_HEADER_SIZE);
        let body_w = |s: &str| self.metrics.text_width_mm(FontWeight::Bold, s, TEXT_SIZE);

        let widest = |col: usize, sample: &str| {
            doc.table_rows
                .iter()
                .map(|r| match col {
                    2 => body_w(&r.quantity),
                    3 => body_w(&r.unit_price),
                    _ => body_w(&r.amount),
                })
                .fold(header_w(&doc.table_header[col]).max(body_w(sample)), f32::max)
                + 2.0 * CELL_PAD_X
        };

        let amount_w = widest(4, sample_money);
        let price_w = widest(3, sample_money);
        let qty_w = widest(2, "0000.5");

        let amount_right = CONTENT_RIGHT - 0.5;
        let price_right = amount_right - amount_w - COL_GAP;
        let qty_right = price_right - price_w - COL_GAP;
        let desc_x = CONTENT_LEFT + INDEX_COL_W + CELL_PAD_X;
        let desc_right = qty_right - qty_w - COL_GAP;

        TableGrid {
            index_x: CONTENT_LEFT + CELL_PAD_X,
            desc_x,
            desc_w: (desc_right - desc_x).max(20.0),
            qty_right,
            price_right,
            amount_right,
        }
    }

    fn table_header_block(&self, doc: &QuoteDocument, g: &TableGrid) -> Block {
        let mut b = Block::default();
        b.ops.push(DrawOp::FillRect {
            x: CONTENT_LEFT,
            y_top: 0.0,
            w: CONTENT_W,
            h: HEADER_BAND_H,
            gray: HEADER_BAND_GRAY,
        });
        b.ops.push(DrawOp::Rule {
            x1: CONTENT_LEFT,
            x2: CONTENT_RIGHT,
            y: 0.0,
            thickness: 0.45,
        });

        let ascent = self.metrics.ascent_mm(FontWeight::Bold, TABLE_HEADER_SIZE);
        let descent = self.metrics.descent_mm(FontWeight::Bold, TABLE_HEADER_SIZE);
        let baseline = (HEADER_BAND_H + ascent - descent) / 2.0;
        let h = &doc.table_header;
        let bold = FontWeight::Bold;

        self.text(&mut b, &h[0], g.index_x, baseline - ascent, TABLE_HEADER_SIZE, bold);
        self.text(&mut b, &h[1], g.desc_x, baseline - ascent, TABLE_HEADER_SIZE, bold);
        self.text_right(&mut b, &h[2], g.qty_right - CELL_PAD_X, baseline, TABLE_HEADER_SIZE, bold);
        self.text_right(&mut b, &h[3], g.price_right - CELL_PAD_X, baseline, TABLE_HEADER_SIZE, bold);
        self.text_right(&mut b, &h[4], g.amount_right - CELL_PAD_X, baseline, TABLE_HEADER_SIZE, bold);

        b.ops.push(DrawOp::Rule {
            x1: CONTENT_LEFT,
            x2: CONTENT_RIGHT,
            y: -HEADER_BAND_H,
            thickness: 0.60,
        });
        b.height = HEADER_BAND_H + TABLE_ROW_PAD;
        b
    }

    fn table_row_block(&self, g: &TableGrid, cells: [&String; 5], last: bool) -> Block {
        let mut b = Block::default();
        let adv = line_advance(TEXT_SIZE);
        let regular = FontWeight::Regular;
        let top = TABLE_ROW_PAD;
        let baseline = top + self.metrics.ascent_mm(regular, TEXT_SIZE);

        self.text(&mut b, cells[0], g.index_x, top, TEXT_SIZE, regular);
        let desc_lines = self.metrics.wrap(regular, cells[1], TEXT_SIZE, g.desc_w);
        for (idx, line) in desc_lines.iter().enumerate() {
            self.text(&mut b, line, g.desc_x, top + idx as f32 * adv, TEXT_SIZE, regular);
        }
        self.text_right(&mut b, cells[2], g.qty_right - CELL_PAD_X, baseline, TEXT_SIZE, regular);
        self.text_right(&mut b, cells[3], g.price_right - CELL_PAD_X, baseline, TEXT_SIZE, regular);
        self.text_right(&mut b, cells[4], g.amount_right - CELL_PAD_X, baseline, TEXT_SIZE, FontWeight::Bold);

        let lines = desc_lines.len().max(1) as f32;
        b.height = top + lines * adv + TABLE_ROW_PAD;
        if last {
            b.ops.push(DrawOp::Rule {
                x1: CONTENT_LEFT,
                x2: CONTENT_RIGHT,
                y: -b.height,
                thickness: 0.40,
            });
            b.height += 2.0;
        }
        b
    }

    fn totals_block(&self, doc: &QuoteDocument, g: &TableGrid) -> Block {
        let mut b = Block::default();
        let label_x = (g.amount_right - 95.0).max(CONTENT_LEFT);
        let value_right = g.amount_right - CELL_PAD_X;

        for (i, row) in doc.totals.iter().enumerate() {
            let row_top = i as f32 * TOTALS_ROW_H;
            let (label_size, value_size, label_weight) = if row.emphasized {
                (TOTALS_EMPH_LABEL_SIZE, TOTALS_EMPH_VALUE_SIZE, FontWeight::Bold)
            } else {
                (TOTALS_LABEL_SIZE, TOTALS_VALUE_SIZE, FontWeight::Regular)
            };
            if row.emphasized {
                b.ops.push(DrawOp::Rule {
                    x1: label_x,
                    x2: g.amount_right + 0.5,
                    y: -row_top,
                    thickness: 0.85,
                });
            }
            let ascent = self.metrics.ascent_mm(label_weight, label_size);
            let baseline = row_top + CELL_PAD_Y + ascent * 0.6;
            self.text(&mut b, &row.label, label_x, baseline - ascent, label_size, label_weight);
            self.text_right(&mut b, &row.value, value_right, baseline, value_size, FontWeight::Bold);
        }

        b.height = doc.totals.len() as f32 * TOTALS_ROW_H + 2.0;
        b
    }

    fn text_section_blocks(&self, section: &TextSection) -> (Block, Vec<Block>) {
        let mut title = Block::default();
        title.height = self.text(&mut title, &section.title, CONTENT_LEFT, 0.0, 10.0, FontWeight::Bold) + 0.6;

        let lines = self
            .metrics
            .wrap(FontWeight::Regular, &section.body, BODY_SIZE, CONTENT_W)
            .into_iter()
            .map(|line| {
                let mut b = Block::default();
                b.height = self.text(&mut b, &line, CONTENT_LEFT, 0.0, BODY_SIZE, FontWeight::Regular);
                b
            })
            .collect();
        (title, lines)
    }

    fn footer_ops(&self, doc: &QuoteDocument, page: usize, total: usize) -> Vec<DrawOp> {
        let mut ops = vec![DrawOp::Rule {
            x1: CONTENT_LEFT,
            x2: CONTENT_RIGHT,
            y: FOOTER_RULE_Y,
            thickness: 0.40,
        }];
        if !doc.footer.trim().is_empty() {
            ops.push(DrawOp::Text {
                text: doc.footer.clone(),
                x: CONTENT_LEFT,
                y: PAGE_MARGIN_BOTTOM,
                size: FOOTER_SIZE,
                weight: FontWeight::Regular,
            });
        }
        let page_text = format!("{} {} {} {}", doc.page_label, page, doc.page_of_label, total);
        let w = self.metrics.text_width_mm(FontWeight::Regular, &page_text, FOOTER_SIZE);
        ops.push(DrawOp::Text {
            text: page_text,
            x: CONTENT_RIGHT - w,
            y: PAGE_MARGIN_BOTTOM,
            size: FOOTER_SIZE,
            weight: FontWeight::Regular,
        });
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::build_document;
    use crate::labels::{pdf_labels, Language};
    use crate::pricing::ServiceType;
    use crate::quote::{compute_invoice, reduce, CargoDetails, ClientRef, QuoteAction, QuoteFormState, QuoteMeta};
    use crate::settings::CompanyProfile;
    use time::{Date, Month};

    fn client(cargo_details: CargoDetails) -> ClientRef {
        ClientRef {
            contact_person: "Baraka Mollel".into(),
            email: "baraka@example.com".into(),
            phone: "0755 000 000".into(),
            business_name: None,
            cargo_details,
        }
    }

    fn document(notes: &str, terms: &str) -> QuoteDocument {
        document_for(client(CargoDetails::default()), notes, terms)
    }

    fn document_for(client: ClientRef, notes: &str, terms: &str) -> QuoteDocument {
        let mut state = reduce(&QuoteFormState::default(), QuoteAction::SelectClient { client });
        state = reduce(
            &state,
            QuoteAction::SetServiceType {
                service_type: ServiceType::Moving,
            },
        );
        for key in ["boxes_small", "transport", "fuel"] {
            state = reduce(&state, QuoteAction::SetMovingQuantity { key: key.into(), value: "3".into() });
            state = reduce(&state, QuoteAction::SetMovingUnitPrice { key: key.into(), value: "4500".into() });
        }
        state = reduce(&state, QuoteAction::SetNotes { value: notes.into() });
        state = reduce(&state, QuoteAction::SetTerms { value: terms.into() });

        let meta = QuoteMeta {
            number: "QT-0100".into(),
            issue_date: Date::from_calendar_date(2026, Month::June, 2).unwrap(),
            validity_days: 30,
            currency: "TZS".into(),
            language: Language::En,
        };
        let q = compute_invoice(&state, &meta).unwrap();
        let company = CompanyProfile {
            company_name: "Bahari Logistics".into(),
            email: "ops@bahari.example".into(),
            ..CompanyProfile::default()
        };
        build_document(&q, &company, pdf_labels(Language::En).unwrap())
    }

    fn texts(page: &PageLayout) -> Vec<&str> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn assert_above_footer(layout: &DocumentLayout) {
        for page in &layout.pages {
            for op in &page.ops {
                match op {
                    DrawOp::Text { y, text, .. } if *y > FOOTER_RULE_Y => {
                        assert!(*y >= CONTENT_BOTTOM, "{text:?} at {y} overlaps the footer");
                    }
                    DrawOp::Text { text, .. } => {
                        assert!(text.starts_with("Page") || text.starts_with("Generated"), "{text:?}");
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn short_quotation_fits_one_page() {
        let metrics = FontMetrics::embedded().unwrap();
        let layout = Layouter::new(&metrics).layout(&document("", ""), None);
        assert_eq!(layout.page_count(), 1);
        let t = texts(&layout.pages[0]);
        assert!(t.contains(&"QUOTATION QT-0100"));
        assert!(t.contains(&"Page 1 of 1"));
        assert!(t.contains(&"13,500.00"));
        assert_above_footer(&layout);
    }

    #[test]
    fn layout_is_deterministic() {
        let metrics = FontMetrics::embedded().unwrap();
        let doc = document("Deliver after 9am", "1. Valid for 30 days");
        let logo = Some(LogoSize {
            width_px: 400,
            height_px: 200,
        });
        let a = Layouter::new(&metrics).layout(&doc, logo);
        let b = Layouter::new(&metrics).layout(&doc, logo);
        assert_eq!(a, b);
    }

    #[test]
    fn sections_stack_downwards() {
        let metrics = FontMetrics::embedded().unwrap();
        let layout = Layouter::new(&metrics).layout(&document("Call ahead", ""), None);
        let y_of = |needle: &str| {
            layout.pages[0]
                .ops
                .iter()
                .find_map(|op| match op {
                    DrawOp::Text { text, y, .. } if text == needle => Some(*y),
                    _ => None,
                })
                .unwrap()
        };
        let title = y_of("QUOTATION QT-0100");
        let bill_to = y_of("BILL TO");
        let service = y_of("SERVICE DETAILS");
        let header = y_of("Description");
        let notes = y_of("Notes");
        assert!(title > bill_to && bill_to > service && service > header && header > notes);
    }

    #[test]
    fn long_terms_paginate_above_footer() {
        let metrics = FontMetrics::embedded().unwrap();
        let terms = (1..=150)
            .map(|i| format!("{i}. Clause text that is long enough to be a realistic line of terms."))
            .collect::<Vec<_>>()
            .join("\n");
        let layout = Layouter::new(&metrics).layout(&document("", &terms), None);
        assert!(layout.page_count() >= 3);
        let n = layout.page_count();
        assert!(texts(&layout.pages[n - 1]).contains(&format!("Page {n} of {n}").as_str()));
        assert_above_footer(&layout);
    }

    #[test]
    fn long_cargo_description_flows_onto_next_pages() {
        let metrics = FontMetrics::embedded().unwrap();
        let cargo = CargoDetails {
            description: "Mixed household goods and office equipment. ".repeat(200),
            ..CargoDetails::default()
        };
        let layout = Layouter::new(&metrics).layout(&document_for(client(cargo), "", ""), None);
        assert!(layout.page_count() >= 2);
        assert_above_footer(&layout);

        assert!(layout.pages.iter().any(|p| texts(p).contains(&"Description")));
    }

    #[test]
    fn tall_company_header_is_split() {
        let metrics = FontMetrics::embedded().unwrap();
        let mut doc = document("", "");
        doc.company.rows.push(LabeledRow {
            label: None,
            value: "Plot 14, Nyerere Road, Dar es Salaam\n".repeat(200),
        });
        let layout = Layouter::new(&metrics).layout(&doc, None);
        assert!(layout.page_count() >= 3);
        assert_above_footer(&layout);
    }

    #[test]
    fn split_table_repeats_header() {
        let metrics = FontMetrics::embedded().unwrap();
        let mut doc = document("", "");
        let row = doc.table_rows[0].clone();
        doc.table_rows = (0..90).map(|_| row.clone()).collect();
        let layout = Layouter::new(&metrics).layout(&doc, None);
        assert!(layout.page_count() >= 2);
        for page in &layout.pages[..2] {
            assert!(texts(page).contains(&"Description"));
        }
        assert_above_footer(&layout);
    }

    #[test]
    fn logo_sits_in_header_area() {
        let metrics = FontMetrics::embedded().unwrap();
        let layout = Layouter::new(&metrics).layout(
            &document("", ""),
            Some(LogoSize {
                width_px: 64,
                height_px: 64,
            }),
        );
        let logo = layout.pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Logo { x, y, scale } => Some((*x, *y, *scale)),
                _ => None,
            })
            .unwrap();
        assert!(logo.0 >= CONTENT_RIGHT - LOGO_AREA_W);
        assert!(logo.1 < CONTENT_TOP);
        assert!(logo.2 > 0.0);
    }
}
