mod channel_commands;
mod context;
mod tenant_commands;

use std::process::ExitCode;

use {
    clap::{Parser, Subcommand},
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::context::Context;

#[derive(Parser)]
#[command(name = "pagelink", about = "pagelink: link business pages to messaging channels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/pagelink/).
    #[arg(long, global = true, env = "PAGELINK_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,

    /// Tenant id for this invocation (overrides configured and stored values).
    #[arg(long, global = true)]
    company_uuid: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List pages available for linking and their state.
    Pages,
    /// List connected channels.
    Channels,
    /// Connect a page to messaging.
    Connect { page_id: String },
    /// Disconnect a page.
    Disconnect {
        page_id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
    /// Set the automated reply of a channel.
    AutoReply { channel_id: i64, text: String },
    /// Authorize with the provider and refresh pages.
    Login {
        /// Print the authorization URL instead of opening a browser.
        #[arg(long, default_value_t = false)]
        no_browser: bool,
        /// Seconds to wait for the provider to redirect back.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Tenant id management.
    Tenant {
        #[command(subcommand)]
        action: tenant_commands::TenantAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(ref dir) = cli.config_dir {
        pagelink_config::set_config_dir(dir.clone());
    }
    let ctx = Context::load(cli.company_uuid)?;

    match cli.command {
        Commands::Pages => channel_commands::list_pages(&ctx).await,
        Commands::Channels => channel_commands::list_channels(&ctx).await,
        Commands::Connect { page_id } => channel_commands::connect(&ctx, &page_id).await,
        Commands::Disconnect { page_id, yes } => {
            channel_commands::disconnect(&ctx, &page_id, yes).await
        },
        Commands::AutoReply { channel_id, text } => {
            channel_commands::auto_reply(&ctx, channel_id, &text).await
        },
        Commands::Login {
            no_browser,
            timeout,
        } => {
            let timeout = channel_commands::parse_timeout(timeout)?;
            channel_commands::login(&ctx, no_browser, timeout).await
        },
        Commands::Tenant { action } => tenant_commands::handle_tenant(&ctx, action),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "pagelink starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "command failed");
            // Lifecycle failures were already shown as the status message.
            if e.downcast_ref::<pagelink_channels::Error>().is_none() {
                eprintln!("error: {message}");
            }
            ExitCode::FAILURE
        },
    }
}
