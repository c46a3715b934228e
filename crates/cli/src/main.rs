mod config_commands;
mod settings_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context as _,
    clap::{Parser, Subcommand},
    mediacopy_config::{
        FileSettingsStore, MediaCopyConfig, SettingsStore, loader::TOKEN_ENV, settings_path,
    },
    mediacopy_discord::{DiscordGateway, MediaCopyHandler},
    mediacopy_relay::{BatchScheduler, HttpAttachmentFetcher, RelayPipeline, SystemClock},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "mediacopy", about = "Copies media posts into a single Discord channel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/mediacopy/).
    #[arg(long, global = true, env = "MEDIACOPY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and relay media (default when no subcommand is provided).
    Run,
    /// Validate the configuration file and report errors/warnings.
    CheckConfig {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Guild settings management.
    Settings {
        #[command(subcommand)]
        action: settings_commands::SettingsAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MediaCopyConfig> {
    let mut config = match &cli.config {
        Some(path) => mediacopy_config::load_config(path)?,
        None => mediacopy_config::discover_and_load(),
    };
    mediacopy_config::apply_env_overrides(&mut config);
    Ok(config)
}

#[cfg(feature = "metrics")]
fn init_metrics(config: &MediaCopyConfig) -> anyhow::Result<mediacopy_metrics::MetricsHandle> {
    mediacopy_metrics::init_metrics(mediacopy_metrics::MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: config
            .metrics
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    })
}

async fn run_bot(config: MediaCopyConfig) -> anyhow::Result<()> {
    if !config.discord.has_token() {
        anyhow::bail!("no bot token: set discord.token in the config or {TOKEN_ENV}");
    }

    let store = FileSettingsStore::open(settings_path(&config))
        .await
        .context("failed to open guild settings")?;
    if let Some(legacy) = &config.settings.import_legacy
        && let Err(e) = store.import_legacy(legacy).await
    {
        warn!(path = %legacy.display(), error = %e, "legacy settings import failed");
    }
    let settings: Arc<dyn SettingsStore> = Arc::new(store);

    #[cfg(feature = "metrics")]
    let metrics = init_metrics(&config)?;

    let gateway = Arc::new(DiscordGateway::new());
    let pipeline = Arc::new(RelayPipeline::new(
        &config.relay,
        Arc::clone(&settings),
        gateway.clone(),
        Arc::new(HttpAttachmentFetcher::new()),
        Arc::new(SystemClock),
    ));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("received ctrl-c, stopping");
                    cancel.cancel();
                },
                Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
            }
        }
    });

    let scheduler = BatchScheduler::new(pipeline, cancel.clone());
    let handler = MediaCopyHandler {
        scheduler: Arc::clone(&scheduler),
        settings,
        gateway,
        activity: config.discord.activity.clone(),
        register_commands: config.discord.register_commands,
    };

    let result = mediacopy_discord::run(&config.discord.token, handler, cancel.clone()).await;
    cancel.cancel();
    scheduler.shutdown().await;

    #[cfg(feature = "metrics")]
    if metrics.is_recording() {
        tracing::debug!(snapshot = %metrics.render(), "final metrics");
    }

    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "mediacopy starting");
            config_commands::ensure_valid(cli.config.as_deref())?;
            run_bot(load_config(&cli)?).await
        },
        Some(Commands::CheckConfig { verbose }) => {
            config_commands::check(cli.config.as_deref(), verbose)
        },
        Some(Commands::Settings { ref action }) => {
            settings_commands::handle_settings(action, &load_config(&cli)?).await
        },
    }
}
