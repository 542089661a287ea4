use thiserror::Error;

/// Rejected calculator input. The form boundary clamps before this can happen;
/// direct callers of the calculator get the error instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("invalid {field}: {value} (expected a finite value >= 0)")]
    InvalidInput { field: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("No client selected. Select a client before generating a quotation.")]
    MissingClient,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Failed to generate PDF: {0}")]
    Render(String),

    #[error("Failed to write quotation file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Quote number {0} was taken by another download. Try again.")]
    NumberTaken(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Why a logo could not be used. Never surfaced to the user; the quotation
/// renders without a logo instead.
#[derive(Debug, Error)]
pub enum LogoError {
    #[error("unsupported logo source")]
    UnsupportedSource,

    #[error("malformed data URL")]
    MalformedDataUrl,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("logo download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("logo exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("unable to read logo file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to decode logo image: {0}")]
    Decode(#[from] printpdf::image_crate::ImageError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings connection mutex poisoned")]
    Poisoned,

    #[error("unable to create settings directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
