use std::path::PathBuf;
use std::sync::Mutex;

use tauri::Manager;

use crate::export::{QuoteRenderer, RenderOutcome};
use crate::format::today_utc;
use crate::labels::{sanity_check_embedded_labels, terms_template, TermsContext};
use crate::pricing::{MovingCatalogEntry, MOVING_CATALOG};
use crate::quote::{QuoteAction, QuoteFormState, QuoteSession};
use crate::settings::{Settings, SettingsPatch, SettingsStore};

const DB_FILE: &str = "freight-quote.db";

struct AppState {
    settings: SettingsStore,
    session: Mutex<QuoteSession>,
    renderer: QuoteRenderer,
}

impl AppState {
    fn session(&self) -> Result<std::sync::MutexGuard<'_, QuoteSession>, String> {
        self.session.lock().map_err(|_| "quote session mutex poisoned".to_string())
    }
}

fn resolve_db_path(app: &tauri::AppHandle) -> Result<PathBuf, String> {
    if let Ok(dir) = app.path().app_data_dir() {
        return Ok(dir.join(DB_FILE));
    }
    if let Ok(dir) = app.path().app_local_data_dir() {
        return Ok(dir.join(DB_FILE));
    }
    let exe = std::env::current_exe().map_err(|e| e.to_string())?;
    exe.parent()
        .map(|dir| dir.join(DB_FILE))
        .ok_or_else(|| "unable to resolve a settings database location".to_string())
}

fn fresh_session(settings: &Settings) -> QuoteSession {
    QuoteSession::new(QuoteFormState::default().with_tax(settings.tax_defaults()))
}

#[tauri::command]
async fn get_settings(state: tauri::State<'_, AppState>) -> Result<Settings, String> {
    state.settings.get().await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn update_settings(state: tauri::State<'_, AppState>, patch: SettingsPatch) -> Result<Settings, String> {
    state.settings.update(patch).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn preview_next_quote_number(state: tauri::State<'_, AppState>) -> Result<String, String> {
    state
        .settings
        .preview_next_quote_number()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
fn get_quote_state(state: tauri::State<'_, AppState>) -> Result<QuoteSession, String> {
    Ok(state.session()?.clone())
}

#[tauri::command]
async fn new_quote(state: tauri::State<'_, AppState>) -> Result<QuoteSession, String> {
    let settings = state.settings.get().await.map_err(|e| e.to_string())?;
    let mut session = state.session()?;
    *session = fresh_session(&settings);
    Ok(session.clone())
}

#[tauri::command]
fn dispatch_quote_action(state: tauri::State<'_, AppState>, action: QuoteAction) -> Result<QuoteSession, String> {
    let mut session = state.session()?;
    session.dispatch(action);
    Ok(session.clone())
}

/// Fills the terms field from the embedded template for the configured language.
#[tauri::command]
async fn load_terms_template(state: tauri::State<'_, AppState>) -> Result<QuoteSession, String> {
    let settings = state.settings.get().await.map_err(|e| e.to_string())?;
    let text = terms_template(
        settings.language,
        &TermsContext {
            company_name: &settings.company.company_name,
            currency: &settings.default_currency,
            validity_days: settings.validity_days,
        },
    );
    let mut session = state.session()?;
    session.dispatch(QuoteAction::SetTerms { value: text });
    Ok(session.clone())
}

#[tauri::command]
fn list_moving_catalog() -> Vec<MovingCatalogEntry> {
    MOVING_CATALOG.to_vec()
}

#[tauri::command]
async fn preview_quotation_pdf(state: tauri::State<'_, AppState>) -> Result<RenderOutcome, String> {
    let settings = state.settings.get().await.map_err(|e| e.to_string())?;
    let number = state
        .settings
        .preview_next_quote_number()
        .await
        .map_err(|e| e.to_string())?;
    let meta = settings.quote_meta(number, today_utc());

    let form = {
        let mut session = state.session()?;
        session.build(&meta).map_err(|e| e.to_string())?;
        session.state.clone()
    };

    let outcome = state
        .renderer
        .preview(&form, &meta, &settings.company)
        .await
        .map_err(|e| e.to_string())?;

    if matches!(outcome, RenderOutcome::Ready(_)) {
        state.session()?.mark_previewed();
    }
    Ok(outcome)
}

/// Renders the quotation into the user's downloads folder and returns the path.
#[tauri::command]
async fn download_quotation_pdf(state: tauri::State<'_, AppState>, app: tauri::AppHandle) -> Result<String, String> {
    let form = state.session()?.state.clone();
    if form.client.is_none() {
        return Err(crate::error::QuoteError::MissingClient.to_string());
    }

    let downloads_dir = app.path().download_dir().map_err(|e| e.to_string())?;
    let saved = state
        .renderer
        .download_next(&state.settings, &form, today_utc(), &downloads_dir)
        .await
        .map_err(|e| e.to_string())?;

    let mut session = state.session()?;
    session.build(&saved.meta).map_err(|e| e.to_string())?;
    session.mark_downloaded();

    Ok(saved.path.to_string_lossy().to_string())
}

#[tauri::command]
fn quit_app(app: tauri::AppHandle) {
    app.exit(0);
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();

    tauri::Builder::default()
        .setup(|app| {
            let handle = app.handle();
            let path = resolve_db_path(handle)?;
            let settings = SettingsStore::open(&path)?;
            let initial = tauri::async_runtime::block_on(settings.get())?;
            tracing::info!(db = %path.display(), "settings store ready");

            app.manage(AppState {
                session: Mutex::new(fresh_session(&initial)),
                settings,
                renderer: QuoteRenderer::default(),
            });

            // Never fail startup over broken embedded labels.
            sanity_check_embedded_labels();
            Ok(())
        })
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            quit_app,
            get_settings,
            update_settings,
            preview_next_quote_number,
            get_quote_state,
            new_quote,
            dispatch_quote_action,
            load_terms_template,
            list_moving_catalog,
            preview_quotation_pdf,
            download_quotation_pdf
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
