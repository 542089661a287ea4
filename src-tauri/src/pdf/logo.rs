use std::time::Duration;

use base64::Engine as _;
use futures_util::StreamExt;
use printpdf::image_crate::DynamicImage;

use crate::error::LogoError;

pub const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;
pub const LOGO_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoSource<'a> {
    /// `data:image/*;base64,...` as stored from the settings form.
    DataUrl(&'a str),
    Http(&'a str),
    File(&'a str),
}

impl<'a> LogoSource<'a> {
    pub fn parse(raw: &'a str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("data:") {
            Some(LogoSource::DataUrl(s))
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(LogoSource::Http(s))
        } else if lower.starts_with("file://") {
            Some(LogoSource::File(&s["file://".len()..]))
        } else if lower.contains("://") {
            None
        } else {
            Some(LogoSource::File(s))
        }
    }
}

fn decode_data_url(s: &str) -> Result<Vec<u8>, LogoError> {
    let comma = s.find(',').ok_or(LogoError::MalformedDataUrl)?;
    let (meta, data) = s.split_at(comma);
    if !meta.to_ascii_lowercase().contains(";base64") {
        return Err(LogoError::MalformedDataUrl);
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(data[1..].trim())?;
    if bytes.len() > MAX_LOGO_BYTES {
        return Err(LogoError::TooLarge { limit: MAX_LOGO_BYTES });
    }
    Ok(bytes)
}

async fn fetch_http(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, LogoError> {
    let resp = http
        .get(url)
        .timeout(LOGO_FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;

    if resp.content_length().is_some_and(|len| len > MAX_LOGO_BYTES as u64) {
        return Err(LogoError::TooLarge { limit: MAX_LOGO_BYTES });
    }

    let mut out = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if out.len() + chunk.len() > MAX_LOGO_BYTES {
            return Err(LogoError::TooLarge { limit: MAX_LOGO_BYTES });
        }
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

async fn read_file(path: &str) -> Result<Vec<u8>, LogoError> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.len() > MAX_LOGO_BYTES as u64 {
        return Err(LogoError::TooLarge { limit: MAX_LOGO_BYTES });
    }
    Ok(tokio::fs::read(path).await?)
}

pub async fn fetch_logo(http: &reqwest::Client, raw: &str) -> Result<DynamicImage, LogoError> {
    let bytes = match LogoSource::parse(raw).ok_or(LogoError::UnsupportedSource)? {
        LogoSource::DataUrl(s) => decode_data_url(s)?,
        LogoSource::Http(url) => fetch_http(http, url).await?,
        LogoSource::File(path) => read_file(path).await?,
    };
    Ok(printpdf::image_crate::load_from_memory(&bytes)?)
}

/// Best effort: any failure is logged and the quotation renders without a logo.
pub async fn load_logo(http: &reqwest::Client, raw: Option<&str>) -> Option<DynamicImage> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match fetch_logo(http, raw).await {
        Ok(img) => Some(img),
        Err(e) => {
            let kind = match LogoSource::parse(raw) {
                Some(LogoSource::DataUrl(_)) => "data_url",
                Some(LogoSource::Http(_)) => "http",
                Some(LogoSource::File(_)) => "file",
                None => "unknown",
            };
            tracing::warn!(source = kind, error = %e, "logo unavailable; rendering without it");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ICON: &[u8] = include_bytes!("../../icons/icon.png");

    fn data_url() -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(ICON)
        )
    }

    #[test]
    fn source_kinds() {
        assert_eq!(LogoSource::parse(""), None);
        assert!(matches!(LogoSource::parse("data:image/png;base64,AA=="), Some(LogoSource::DataUrl(_))));
        assert!(matches!(LogoSource::parse("HTTPS://cdn.example/logo.png"), Some(LogoSource::Http(_))));
        assert_eq!(LogoSource::parse("file:///tmp/logo.png"), Some(LogoSource::File("/tmp/logo.png")));
        assert_eq!(LogoSource::parse("./logo.png"), Some(LogoSource::File("./logo.png")));
        assert_eq!(LogoSource::parse("ftp://host/logo.png"), None);
    }

    #[tokio::test]
    async fn data_url_logo_decodes() {
        let http = reqwest::Client::new();
        let img = load_logo(&http, Some(&data_url())).await.unwrap();
        assert_eq!((img.width(), img.height()), (64, 64));
    }

    #[tokio::test]
    async fn file_logo_decodes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ICON).unwrap();
        let http = reqwest::Client::new();
        let path = file.path().to_string_lossy().to_string();
        assert!(load_logo(&http, Some(&path)).await.is_some());
    }

    #[tokio::test]
    async fn broken_sources_yield_none() {
        let http = reqwest::Client::new();
        assert!(load_logo(&http, None).await.is_none());
        assert!(load_logo(&http, Some("   ")).await.is_none());
        assert!(load_logo(&http, Some("data:image/png,notbase64")).await.is_none());
        assert!(load_logo(&http, Some("data:image/png;base64,!!!")).await.is_none());
        assert!(load_logo(&http, Some("/definitely/not/here.png")).await.is_none());

        let garbage = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"not an image")
        );
        assert!(matches!(
            fetch_logo(&http, &garbage).await,
            Err(LogoError::Decode(_))
        ));
    }
}
