//! Quotation pricing and PDF generation for a freight and moving company.
//!
//! The pure core (`pricing`, `quote`, `document`, `pdf::layout`) turns a form
//! state into a quotation and a page layout. `export` adds logo loading and
//! file output; `desktop` wires everything into the Tauri shell.

pub mod document;
pub mod error;
pub mod export;
pub mod format;
pub mod labels;
pub mod pdf;
pub mod pricing;
pub mod quote;
pub mod settings;

#[cfg(feature = "desktop")]
mod desktop;

#[cfg(feature = "desktop")]
pub use desktop::run;

pub use document::{build_document, QuoteDocument};
pub use error::{LogoError, PricingError, QuoteError, SettingsError};
pub use export::{download_filename, prepare_quote, QuoteRenderer, RenderOutcome, SavedQuote};
pub use labels::Language;
pub use quote::{compute_invoice, QuoteAction, QuoteFormState, QuoteMeta, QuoteSession, Quotation};
pub use settings::{CompanyProfile, Settings, SettingsStore};
