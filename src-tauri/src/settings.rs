use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::error::SettingsError;
use crate::labels::Language;
use crate::pricing::{clamp_percentage, TaxSettings, DEFAULT_VAT_PERCENTAGE};
use crate::quote::QuoteMeta;

const SETTINGS_ID: &str = "default";
const SCHEMA_VERSION: i64 = 1;

/// Issuer block printed in the quotation header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub registration_number: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub address_line: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub bank_account: String,
    /// data URL, http(s) URL or file path; empty for no logo.
    #[serde(default)]
    pub logo_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub is_configured: bool,
    #[serde(flatten)]
    pub company: CompanyProfile,
    pub quote_prefix: String,
    pub next_quote_number: i64,
    pub default_currency: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_vat_percentage")]
    pub default_vat_percentage: f64,
    #[serde(default = "default_true")]
    pub include_vat_by_default: bool,
    #[serde(default = "default_validity_days")]
    pub validity_days: u16,
}

fn default_vat_percentage() -> f64 {
    DEFAULT_VAT_PERCENTAGE
}

fn default_true() -> bool {
    true
}

fn default_validity_days() -> u16 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_configured: false,
            company: CompanyProfile::default(),
            quote_prefix: "QT".to_string(),
            next_quote_number: 1,
            default_currency: "TZS".to_string(),
            language: Language::En,
            default_vat_percentage: DEFAULT_VAT_PERCENTAGE,
            include_vat_by_default: true,
            validity_days: default_validity_days(),
        }
    }
}

impl Settings {
    pub fn tax_defaults(&self) -> TaxSettings {
        TaxSettings {
            include_vat: self.include_vat_by_default,
            vat_percentage: clamp_percentage(self.default_vat_percentage),
        }
    }

    pub fn quote_meta(&self, number: String, issue_date: Date) -> QuoteMeta {
        QuoteMeta {
            number,
            issue_date,
            validity_days: self.validity_days,
            currency: self.default_currency.clone(),
            language: self.language,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub is_configured: Option<bool>,
    pub company_name: Option<String>,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub bank_account: Option<String>,
    pub logo_url: Option<String>,
    pub quote_prefix: Option<String>,
    pub next_quote_number: Option<i64>,
    pub default_currency: Option<String>,
    pub language: Option<Language>,
    pub default_vat_percentage: Option<f64>,
    pub include_vat_by_default: Option<bool>,
    pub validity_days: Option<u16>,
}

impl SettingsPatch {
    fn apply(self, current: &mut Settings) {
        let company = &mut current.company;
        let text_fields = [
            (self.company_name, &mut company.company_name),
            (self.registration_number, &mut company.registration_number),
            (self.tax_id, &mut company.tax_id),
            (self.address_line, &mut company.address_line),
            (self.city, &mut company.city),
            (self.postal_code, &mut company.postal_code),
            (self.email, &mut company.email),
            (self.phone, &mut company.phone),
            (self.website, &mut company.website),
            (self.bank_account, &mut company.bank_account),
            (self.logo_url, &mut company.logo_url),
        ];
        for (value, slot) in text_fields {
            if let Some(v) = value {
                *slot = v;
            }
        }

        if let Some(v) = self.is_configured {
            current.is_configured = v;
        }
        if let Some(v) = self.quote_prefix {
            let v = v.trim();
            if !v.is_empty() {
                current.quote_prefix = v.to_string();
            }
        }
        if let Some(v) = self.next_quote_number {
            current.next_quote_number = v.max(1);
        }
        if let Some(v) = self.default_currency {
            current.default_currency = v.trim().to_uppercase();
        }
        if let Some(v) = self.language {
            current.language = v;
        }
        if let Some(v) = self.default_vat_percentage {
            current.default_vat_percentage = clamp_percentage(v);
        }
        if let Some(v) = self.include_vat_by_default {
            current.include_vat_by_default = v;
        }
        if let Some(v) = self.validity_days {
            current.validity_days = v;
        }
    }
}

pub fn format_quote_number(prefix: &str, next: i64) -> String {
    format!("{}-{:0>4}", prefix, next)
}

fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn sqlite_error_string(err: &SettingsError) -> String {
    match err {
        SettingsError::Sqlite(rusqlite::Error::SqliteFailure(code, msg)) => {
            format!(
                "sqlite(code={:?}, extended_code={}, msg={})",
                code.code,
                code.extended_code,
                msg.as_deref().unwrap_or("")
            )
        }
        other => other.to_string(),
    }
}

fn configure_sqlite(conn: &Connection) -> Result<(), rusqlite::Error> {
    // journal_mode is a no-op for in-memory databases.
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;\n\
         PRAGMA synchronous = NORMAL;\n\
         PRAGMA temp_store = MEMORY;\n\
         PRAGMA busy_timeout = 5000;\n",
    )?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS app_meta (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            id TEXT PRIMARY KEY NOT NULL,
            quotePrefix TEXT NOT NULL,
            nextQuoteNumber INTEGER NOT NULL,
            data_json TEXT NOT NULL,
            updatedAt TEXT NOT NULL
        );
        "#,
    )?;

    let v: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if v == 0 {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    }
    Ok(())
}

pub(crate) fn app_meta_get(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_meta WHERE key = ?1",
        params![key],
        |r| r.get(0),
    )
    .optional()
}

fn app_meta_set(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO app_meta(key, value) VALUES(?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn ensure_settings_row(conn: &Connection) -> Result<(), SettingsError> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM settings WHERE id = ?1",
            params![SETTINGS_ID],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Ok(());
    }

    let s = Settings::default();
    let now = now_iso();
    conn.execute(
        "INSERT INTO settings (id, quotePrefix, nextQuoteNumber, data_json, updatedAt) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            SETTINGS_ID,
            s.quote_prefix,
            s.next_quote_number,
            serde_json::to_string(&s)?,
            now
        ],
    )?;
    app_meta_set(conn, "settings_created_at", &now)?;
    Ok(())
}

fn read_settings(conn: &Connection) -> Result<Settings, SettingsError> {
    let row: Option<(String, i64, String)> = conn
        .query_row(
            "SELECT quotePrefix, nextQuoteNumber, data_json FROM settings WHERE id = ?1",
            params![SETTINGS_ID],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;

    let Some((prefix, next, data_json)) = row else {
        return Ok(Settings::default());
    };

    let mut parsed = match serde_json::from_str::<Settings>(&data_json) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "settings data_json unreadable; using defaults");
            Settings::default()
        }
    };
    // The counter columns are authoritative; taking a number does not rewrite data_json.
    parsed.quote_prefix = prefix;
    parsed.next_quote_number = next;
    Ok(parsed)
}

fn write_settings(conn: &Connection, s: &Settings) -> Result<(), SettingsError> {
    conn.execute(
        "UPDATE settings SET quotePrefix = ?2, nextQuoteNumber = ?3, data_json = ?4, updatedAt = ?5 WHERE id = ?1",
        params![
            SETTINGS_ID,
            s.quote_prefix,
            s.next_quote_number,
            serde_json::to_string(s)?,
            now_iso()
        ],
    )?;
    Ok(())
}

/// SQLite-backed settings for the desktop shell: company profile, quotation
/// defaults and the quote number counter.
#[derive(Clone)]
pub struct SettingsStore {
    conn: Arc<Mutex<Connection>>,
    write_lock: Arc<Mutex<()>>,
}

impl SettingsStore {
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, SettingsError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SettingsError> {
        configure_sqlite(&conn)?;
        init_schema(&conn)?;
        ensure_settings_row(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    async fn with_read<T, F>(&self, op_name: &'static str, f: F) -> Result<T, SettingsError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SettingsError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| SettingsError::Poisoned)?;
            f(&guard).inspect_err(|e| {
                tracing::error!(op = op_name, error = %sqlite_error_string(e), "settings read failed");
            })
        })
        .await?
    }

    async fn with_write<T, F>(&self, op_name: &'static str, f: F) -> Result<T, SettingsError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, SettingsError> + Send + 'static,
    {
        let conn = self.conn.clone();
        let write_lock = self.write_lock.clone();
        tokio::task::spawn_blocking(move || {
            let _wg = write_lock.lock().map_err(|_| SettingsError::Poisoned)?;
            let mut guard = conn.lock().map_err(|_| SettingsError::Poisoned)?;
            f(&mut guard).inspect_err(|e| {
                tracing::error!(op = op_name, error = %sqlite_error_string(e), "settings write failed");
            })
        })
        .await?
    }

    pub async fn get(&self) -> Result<Settings, SettingsError> {
        self.with_read("get_settings", read_settings).await
    }

    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings, SettingsError> {
        self.with_write("update_settings", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut current = read_settings(&tx)?;
            patch.apply(&mut current);
            write_settings(&tx, &current)?;
            tx.commit()?;
            tracing::debug!(prefix = %current.quote_prefix, "settings updated");
            Ok(current)
        })
        .await
    }

    /// Number the next quotation will get, without consuming it.
    pub async fn preview_next_quote_number(&self) -> Result<String, SettingsError> {
        self.with_read("preview_next_quote_number", |conn| {
            let s = read_settings(conn)?;
            Ok(format_quote_number(&s.quote_prefix, s.next_quote_number))
        })
        .await
    }

    /// Assigns the next quote number and advances the counter atomically.
    pub async fn take_next_quote_number(&self) -> Result<String, SettingsError> {
        self.with_write("take_next_quote_number", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let (prefix, next): (String, i64) = tx.query_row(
                "SELECT quotePrefix, nextQuoteNumber FROM settings WHERE id = ?1",
                params![SETTINGS_ID],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            tx.execute(
                "UPDATE settings SET nextQuoteNumber = ?2, updatedAt = ?3 WHERE id = ?1",
                params![SETTINGS_ID, next + 1, now_iso()],
            )?;
            let number = format_quote_number(&prefix, next);
            app_meta_set(&tx, "last_quote_number", &number)?;
            tx.commit()?;
            Ok(number)
        })
        .await
    }

    /// Consumes `number` if it is still the next quote number. Returns `false`
    /// when another download took it first; the counter is left untouched.
    pub async fn commit_quote_number(&self, number: &str) -> Result<bool, SettingsError> {
        let number = number.to_string();
        self.with_write("commit_quote_number", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let (prefix, next): (String, i64) = tx.query_row(
                "SELECT quotePrefix, nextQuoteNumber FROM settings WHERE id = ?1",
                params![SETTINGS_ID],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            if format_quote_number(&prefix, next) != number {
                return Ok(false);
            }
            tx.execute(
                "UPDATE settings SET nextQuoteNumber = ?2, updatedAt = ?3 WHERE id = ?1",
                params![SETTINGS_ID, next + 1, now_iso()],
            )?;
            app_meta_set(&tx, "last_quote_number", &number)?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    pub async fn meta_value(&self, key: &'static str) -> Result<Option<String>, SettingsError> {
        self.with_read("app_meta_get", move |conn| Ok(app_meta_get(conn, key)?))
            .await
    }
}
