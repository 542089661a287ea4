//! PDF output: font metrics, page layout, logo loading and serialization.

pub mod fonts;
pub mod layout;
pub mod logo;
pub mod render;

pub use fonts::{FontMetrics, FontWeight};
pub use layout::{DocumentLayout, DrawOp, Layouter, LogoSize, PageLayout};
pub use logo::{load_logo, LogoSource};
pub use render::render_pdf;
