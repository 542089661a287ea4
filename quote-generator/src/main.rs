use std::io::Read as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use freight_quote_lib::labels::{terms_template, TermsContext};
use freight_quote_lib::pricing::{
  Insurance, SpecialHandling, Urgency, MOVING_CATALOG, SERVICE_TEMPLATES,
};
use freight_quote_lib::quote::reduce;
use freight_quote_lib::{
  compute_invoice, CompanyProfile, Language, QuoteAction, QuoteFormState, QuoteMeta,
  QuoteRenderer, RenderOutcome,
};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

#[derive(Parser, Debug)]
#[command(name = "quote-generator")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the computed quotation as JSON.
  Price {
    /// Quote request JSON file, or `-` for stdin.
    #[arg(long)]
    input: String,
  },

  /// Render the quotation PDF.
  Render {
    #[arg(long)]
    input: String,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Logo source overriding the company profile (data URL, URL or path).
    #[arg(long)]
    logo: Option<String>,

    /// Print the preview data URL instead of writing a file.
    #[arg(long)]
    preview: bool,
  },

  /// List service templates, surcharges and the moving catalog.
  Catalog,

  /// Print the default terms and conditions.
  Terms {
    #[arg(long, value_enum, default_value = "en")]
    lang: Lang,

    #[arg(long, default_value = "")]
    company: String,

    #[arg(long, default_value = "TZS")]
    currency: String,

    #[arg(long, default_value_t = 30)]
    validity_days: u16,
  },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Lang {
  En,
  Sw,
}

impl From<Lang> for Language {
  fn from(l: Lang) -> Self {
    match l {
      Lang::En => Language::En,
      Lang::Sw => Language::Sw,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteHeader {
  number: String,
  /// `YYYY-MM-DD`; today when absent.
  issue_date: Option<String>,
  #[serde(default = "default_validity_days")]
  validity_days: u16,
  #[serde(default = "default_currency")]
  currency: String,
  #[serde(default)]
  language: Language,
}

fn default_validity_days() -> u16 {
  30
}

fn default_currency() -> String {
  "TZS".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest {
  quote: QuoteHeader,
  #[serde(default)]
  company: CompanyProfile,
  #[serde(default)]
  form: QuoteFormState,
  /// Replayed through the form reducer after `form` is loaded.
  #[serde(default)]
  actions: Vec<QuoteAction>,
}

impl QuoteRequest {
  fn into_parts(self) -> anyhow::Result<(QuoteFormState, QuoteMeta, CompanyProfile)> {
    let issue_date = match self.quote.issue_date.as_deref() {
      Some(raw) => parse_date(raw)?,
      None => OffsetDateTime::now_utc().date(),
    };
    let meta = QuoteMeta {
      number: self.quote.number,
      issue_date,
      validity_days: self.quote.validity_days,
      currency: self.quote.currency,
      language: self.quote.language,
    };

    let form = self
      .actions
      .into_iter()
      .fold(self.form.sanitized(), |state, action| reduce(&state, action));

    Ok((form, meta, self.company))
  }
}

fn parse_date(raw: &str) -> anyhow::Result<Date> {
  let fmt = time::format_description::parse("[year]-[month]-[day]")?;
  Date::parse(raw.trim(), &fmt).map_err(|e| anyhow::anyhow!("invalid issueDate {raw:?}: {e}"))
}

fn read_request(input: &str) -> anyhow::Result<QuoteRequest> {
  let raw = if input == "-" {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    buf
  } else {
    std::fs::read_to_string(input)
      .map_err(|e| anyhow::anyhow!("unable to read {input}: {e}"))?
  };
  serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("invalid quote request json: {e}"))
}

fn catalog_json() -> serde_json::Value {
  let special: Vec<_> = [
    SpecialHandling::None,
    SpecialHandling::Fragile,
    SpecialHandling::Refrigerated,
    SpecialHandling::Express,
    SpecialHandling::Oversized,
  ]
  .into_iter()
  .map(|v| serde_json::json!({ "key": v.key(), "surcharge": v.surcharge() }))
  .collect();
  let insurance: Vec<_> = [
    Insurance::None,
    Insurance::Basic,
    Insurance::Premium,
    Insurance::Full,
  ]
  .into_iter()
  .map(|v| serde_json::json!({ "key": v.key(), "surcharge": v.surcharge() }))
  .collect();
  let urgency: Vec<_> = [Urgency::Normal, Urgency::Urgent, Urgency::SameDay]
    .into_iter()
    .map(|v| serde_json::json!({ "key": v.key(), "surcharge": v.surcharge() }))
    .collect();

  serde_json::json!({
    "services": SERVICE_TEMPLATES,
    "surcharges": {
      "specialHandling": special,
      "insurance": insurance,
      "urgency": urgency,
    },
    "moving": MOVING_CATALOG,
  })
}

fn init_tracing() {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  let cli = Cli::parse();

  match cli.command {
    Command::Price { input } => {
      let (form, meta, _) = read_request(&input)?.into_parts()?;
      let quotation = compute_invoice(&form, &meta)?;
      println!("{}", serde_json::to_string_pretty(&quotation)?);
    }

    Command::Render {
      input,
      out_dir,
      logo,
      preview,
    } => {
      let (form, meta, mut company) = read_request(&input)?.into_parts()?;
      if let Some(logo) = logo {
        company.logo_url = logo;
      }

      let renderer = QuoteRenderer::new(reqwest::Client::new());
      if preview {
        match renderer.preview(&form, &meta, &company).await? {
          RenderOutcome::Ready(artifact) => println!("{}", artifact.data_url),
          RenderOutcome::Superseded => anyhow::bail!("preview superseded"),
        }
      } else {
        let path = renderer.download(&form, &meta, &company, &out_dir).await?;
        tracing::info!(number = %meta.number, "quotation written");
        println!("{}", path.display());
      }
    }

    Command::Catalog => {
      println!("{}", serde_json::to_string_pretty(&catalog_json())?);
    }

    Command::Terms {
      lang,
      company,
      currency,
      validity_days,
    } => {
      let text = terms_template(
        lang.into(),
        &TermsContext {
          company_name: &company,
          currency: &currency,
          validity_days,
        },
      );
      println!("{text}");
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_replays_actions() {
    let json = r#"{
      "quote": { "number": "QT-0042", "issueDate": "2026-03-01" },
      "form": { "serviceType": "freight" },
      "actions": [
        { "type": "selectClient", "client": { "contactPerson": "Juma Ally", "email": "j@x.tz", "phone": "0754" } },
        { "type": "setCargoField", "field": "distanceKm", "value": "10" }
      ]
    }"#;
    let req: QuoteRequest = serde_json::from_str(json).unwrap();
    let (form, meta, _) = req.into_parts().unwrap();
    assert_eq!(meta.number, "QT-0042");
    assert_eq!(meta.issue_date, Date::from_calendar_date(2026, time::Month::March, 1).unwrap());
    let quotation = compute_invoice(&form, &meta).unwrap();
    assert_eq!(quotation.client.contact_person, "Juma Ally");
    assert_eq!(quotation.subtotal, 14_400.0);
  }

  #[test]
  fn bad_dates_are_rejected() {
    assert!(parse_date("01/03/2026").is_err());
  }

  #[test]
  fn catalog_lists_everything() {
    let v = catalog_json();
    assert_eq!(v["services"].as_array().unwrap().len(), 3);
    assert_eq!(v["moving"].as_array().unwrap().len(), 13);
    assert_eq!(v["surcharges"]["urgency"][2]["key"], "same_day");
  }
}
