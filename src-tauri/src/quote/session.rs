use serde::Serialize;
use uuid::Uuid;

use crate::error::QuoteError;

use super::invoice::{compute_invoice, compute_totals, QuoteMeta, QuoteTotals, Quotation};
use super::state::{reduce, QuoteAction, QuoteFormState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStage {
    Empty,
    ClientSelected,
    Configuring,
    Recalculating,
    DocumentBuilt,
    Previewed,
    Downloaded,
}

/// One editing session of the quotation form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSession {
    pub id: Uuid,
    pub state: QuoteFormState,
    pub stage: SessionStage,
    /// Live totals; `None` while the current state cannot be priced.
    pub totals: Option<QuoteTotals>,
}

impl Default for QuoteSession {
    fn default() -> Self {
        Self::new(QuoteFormState::default())
    }
}

impl QuoteSession {
    pub fn new(state: QuoteFormState) -> Self {
        let stage = if state.client.is_some() {
            SessionStage::ClientSelected
        } else {
            SessionStage::Empty
        };
        let totals = compute_totals(&state).ok();
        Self {
            id: Uuid::new_v4(),
            state,
            stage,
            totals,
        }
    }

    pub fn dispatch(&mut self, action: QuoteAction) {
        let selects_client = matches!(action, QuoteAction::SelectClient { .. });
        let clears_client = matches!(action, QuoteAction::ClearClient);

        self.state = reduce(&self.state, action);
        self.stage = if clears_client || self.state.client.is_none() {
            SessionStage::Empty
        } else if selects_client {
            SessionStage::ClientSelected
        } else {
            SessionStage::Recalculating
        };

        self.totals = match compute_totals(&self.state) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "quote totals unavailable");
                None
            }
        };

        if self.stage == SessionStage::Recalculating {
            self.stage = SessionStage::Configuring;
        }
    }

    /// Projects the current form into a quotation. Only valid with a client.
    pub fn build(&mut self, meta: &QuoteMeta) -> Result<Quotation, QuoteError> {
        let quotation = compute_invoice(&self.state, meta)?;
        self.stage = SessionStage::DocumentBuilt;
        Ok(quotation)
    }

    pub fn mark_previewed(&mut self) {
        if self.stage == SessionStage::DocumentBuilt {
            self.stage = SessionStage::Previewed;
        }
    }

    pub fn mark_downloaded(&mut self) {
        if matches!(self.stage, SessionStage::DocumentBuilt | SessionStage::Previewed) {
            self.stage = SessionStage::Downloaded;
        }
    }
}
