use clap::Parser;
use serde::Serialize;
use stamble_core::advisor::InvestmentAdvisor;
use stamble_core::config::Settings;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stamble_cli")]
struct Args {
    /// Ticker to build a recommendation for, e.g. AAPL.
    #[arg(long, required_unless_present = "trending", conflicts_with = "trending")]
    symbol: Option<String>,

    /// Print the trending list instead.
    #[arg(long)]
    trending: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.default_log_directive())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if args.trending {
        return print_json(&stamble_core::domain::stock::trending_stocks(), args.pretty);
    }

    let symbol = args
        .symbol
        .as_deref()
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_default();

    settings.validate()?;
    let advisor = InvestmentAdvisor::from_settings(&settings)?;

    match advisor.build_recommendation(&symbol).await {
        Ok(rec) => print_json(&rec, args.pretty),
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%symbol, error = %err, "recommendation run failed");
            Err(err)
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(settings.env.clone().into()),
            ..Default::default()
        },
    )))
}
