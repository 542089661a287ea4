//! Preview and download of quotation PDFs.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine as _;
use serde::Serialize;
use time::Date;

use crate::document::{build_document, QuoteDocument};
use crate::error::QuoteError;
use crate::format::{slugify, unix_ms_now};
use crate::labels::pdf_labels;
use crate::pdf::{load_logo, render_pdf, DocumentLayout, FontMetrics, Layouter, LogoSize};
use crate::quote::{compute_invoice, QuoteFormState, QuoteMeta, Quotation};
use crate::settings::{CompanyProfile, SettingsStore};

/// Monotonic render tickets. Only the newest ticket's preview is shown.
#[derive(Debug, Default)]
pub struct RenderSequencer {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket(u64);

impl RenderSequencer {
    pub fn issue(&self) -> RenderTicket {
        RenderTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewArtifact {
    pub data_url: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub quotation: Quotation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RenderOutcome {
    Ready(PreviewArtifact),
    /// A newer preview was requested while this one was rendering.
    Superseded,
}

/// Everything needed to serialize a quotation, computed without touching printpdf.
#[derive(Debug, Clone)]
pub struct PreparedQuote {
    pub quotation: Quotation,
    pub document: QuoteDocument,
    pub layout: DocumentLayout,
}

pub struct RenderedQuote {
    pub quotation: Quotation,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

pub fn download_filename(contact_person: &str, unix_ms: i128) -> String {
    format!("quotation-{}-{}.pdf", slugify(contact_person), unix_ms)
}

pub fn pdf_data_url(bytes: &[u8]) -> String {
    format!(
        "data:application/pdf;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Pure part of rendering: quotation, document model and page layout.
pub fn prepare_quote(
    state: &QuoteFormState,
    meta: &QuoteMeta,
    company: &CompanyProfile,
    logo: Option<LogoSize>,
) -> Result<PreparedQuote, QuoteError> {
    let quotation = compute_invoice(state, meta)?;
    let labels = pdf_labels(meta.language)?;
    let document = build_document(&quotation, company, labels);
    let metrics = FontMetrics::embedded()?;
    let layout = Layouter::new(&metrics).layout(&document, logo);
    Ok(PreparedQuote {
        quotation,
        document,
        layout,
    })
}

pub struct QuoteRenderer {
    http: reqwest::Client,
    sequencer: RenderSequencer,
}

impl Default for QuoteRenderer {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl QuoteRenderer {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            sequencer: RenderSequencer::default(),
        }
    }

    pub async fn render(
        &self,
        state: &QuoteFormState,
        meta: &QuoteMeta,
        company: &CompanyProfile,
    ) -> Result<RenderedQuote, QuoteError> {
        // Fail before any logo I/O or layout work.
        if state.client.is_none() {
            return Err(QuoteError::MissingClient);
        }

        let logo = load_logo(&self.http, Some(company.logo_url.as_str())).await;
        let logo_size = logo.as_ref().map(|img| LogoSize {
            width_px: img.width(),
            height_px: img.height(),
        });

        let prepared = prepare_quote(state, meta, company, logo_size)?;
        let bytes = render_pdf(
            &prepared.document.doc_title,
            &prepared.quotation.number,
            meta.issue_date,
            &prepared.layout,
            logo.as_ref(),
        )?;

        tracing::info!(
            number = %prepared.quotation.number,
            pages = prepared.layout.page_count(),
            bytes = bytes.len(),
            "quotation rendered"
        );

        Ok(RenderedQuote {
            page_count: prepared.layout.page_count(),
            quotation: prepared.quotation,
            bytes,
        })
    }

    pub async fn preview(
        &self,
        state: &QuoteFormState,
        meta: &QuoteMeta,
        company: &CompanyProfile,
    ) -> Result<RenderOutcome, QuoteError> {
        let ticket = self.sequencer.issue();
        let rendered = self.render(state, meta, company).await?;

        if !self.sequencer.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, "dropping stale preview");
            return Ok(RenderOutcome::Superseded);
        }

        Ok(RenderOutcome::Ready(PreviewArtifact {
            data_url: pdf_data_url(&rendered.bytes),
            bytes: rendered.bytes,
            page_count: rendered.page_count,
            quotation: rendered.quotation,
        }))
    }

    /// Writes `quotation-<contact>-<unix-ms>.pdf` into `out_dir`.
    pub async fn download(
        &self,
        state: &QuoteFormState,
        meta: &QuoteMeta,
        company: &CompanyProfile,
        out_dir: &Path,
    ) -> Result<PathBuf, QuoteError> {
        let rendered = self.render(state, meta, company).await?;
        self.save(&rendered, out_dir).await
    }

    pub async fn save(&self, rendered: &RenderedQuote, out_dir: &Path) -> Result<PathBuf, QuoteError> {
        let filename = download_filename(&rendered.quotation.client.contact_person, unix_ms_now());
        tokio::fs::create_dir_all(out_dir).await?;
        let path = out_dir.join(filename);
        tokio::fs::write(&path, &rendered.bytes).await?;

        tracing::info!(path = %path.display(), "quotation saved");
        Ok(path)
    }

    /// Downloads under the store's next quote number. The number is consumed
    /// only once the file is on disk, so a failed render or write leaves the
    /// counter where it was.
    pub async fn download_next(
        &self,
        store: &SettingsStore,
        state: &QuoteFormState,
        issue_date: Date,
        out_dir: &Path,
    ) -> Result<SavedQuote, QuoteError> {
        if state.client.is_none() {
            return Err(QuoteError::MissingClient);
        }

        let settings = store.get().await?;
        let number = store.preview_next_quote_number().await?;
        let meta = settings.quote_meta(number, issue_date);

        let rendered = self.render(state, &meta, &settings.company).await?;
        let path = self.save(&rendered, out_dir).await?;

        let committed = match store.commit_quote_number(&meta.number).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(QuoteError::NumberTaken(meta.number.clone())),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = committed {
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %rm, "unable to remove uncommitted quotation");
            }
            return Err(e);
        }

        Ok(SavedQuote { path, meta })
    }
}

/// A downloaded quotation and the metadata its number was committed under.
#[derive(Debug, Clone)]
pub struct SavedQuote {
    pub path: PathBuf,
    pub meta: QuoteMeta,
}
