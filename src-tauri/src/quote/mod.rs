//! Quotation form: client reference, immutable state + reducer, the pure
//! invoice projection and the editing session.

pub mod client;
pub mod invoice;
pub mod session;
pub mod state;

pub use client::{CargoDetails, ClientRef};
pub use invoice::{
    compute_invoice, compute_totals, LineItem, PricingMode, QuoteMeta, QuoteTotals, Quotation,
};
pub use session::{QuoteSession, SessionStage};
pub use state::{reduce, QuoteAction, QuoteFormState};
