//! `translation-admin` command line entry point.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{
    Parser,
    Subcommand,
};
use serde::Serialize;
use thiserror::Error;
use translation_admin::config::{
    ConfigError,
    ConfigManager,
    ProviderKind,
};
use translation_admin::orchestrator::{
    BatchFilter,
    BatchRequest,
};
use translation_admin::provider::{
    self,
    ProviderSetupError,
};
use translation_admin::service::{
    AdminError,
    AdminService,
};
use translation_admin::{
    api,
    logging,
};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "translation-admin", version, about)]
struct Cli {
    /// Workspace root containing `.translation-admin.json` (defaults to the current directory)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Use the offline mock translator instead of the configured provider
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the admin HTTP API
    Serve {
        /// Overrides `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Insert stub records for keys found in the UI source tree
    Sync,
    /// Print (or write) the translation document
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import a translation document
    Import { file: PathBuf },
    /// Machine-translate a batch of records
    Batch {
        #[arg(long, value_enum, default_value_t = FilterArg::Untranslated)]
        filter: FilterArg,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Re-translate records that already have Arabic text
        #[arg(long)]
        force: bool,
    },
    /// Print translation progress
    Stats,
}

/// `--filter` values.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FilterArg {
    All,
    Untranslated,
    Category,
}

impl From<FilterArg> for BatchFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Self::All,
            FilterArg::Untranslated => Self::Untranslated,
            FilterArg::Category => Self::Category,
        }
    }
}

/// Anything that ends the process with a failure status.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ProviderSetupError> for CliError {
    fn from(error: ProviderSetupError) -> Self {
        Self::Admin(AdminError::from(error))
    }
}

/// Writes `value` as pretty JSON to stdout.
fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Loads the workspace and runs one subcommand.
async fn run(cli: Cli) -> Result<(), CliError> {
    let workspace = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let mut config = ConfigManager::new();
    config.load_settings(Some(workspace))?;

    let _guard = logging::init(
        &config.get_settings().logging,
        config.workspace_root().map(PathBuf::as_path),
    );

    // 翻訳しないコマンドは API キーなしで動かす
    let translates = matches!(cli.command, Command::Serve { .. } | Command::Batch { .. });
    if cli.mock || !translates {
        let mut overridden = config.get_settings().clone();
        overridden.provider.kind = ProviderKind::Mock;
        config.update_settings(overridden)?;
    }
    let settings = config.get_settings().clone();
    let provider = provider::build_provider(&settings.provider)?;
    let service = AdminService::open(&config, provider).await?;

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            api::serve(service, &bind).await?;
        }
        Command::Sync => print_json(&service.sync().await?)?,
        Command::Export { output } => {
            let document = service.export().await;
            match output {
                Some(path) => {
                    let json = serde_json::to_string_pretty(&document)?;
                    tokio::fs::write(&path, json).await?;
                    tracing::info!(
                        count = document.translations.len(),
                        "Exported translations to {}",
                        path.display()
                    );
                }
                None => print_json(&document)?,
            }
        }
        Command::Import { file } => {
            let json = tokio::fs::read_to_string(&file).await?;
            print_json(&service.import_json(&json).await?)?;
        }
        Command::Batch { filter, category, limit, force } => {
            let request = BatchRequest { filter: filter.into(), category, limit, force };
            print_json(&service.batch_translate(&request).await?)?;
        }
        Command::Stats => print_json(&service.stats().await)?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if let CliError::Admin(admin) = &error {
                tracing::error!(code = admin.code(), recovery = ?admin.recovery(), "{admin}");
            } else {
                tracing::error!("{error}");
            }
            // サブスクライバ初期化前の失敗も見えるようにする
            #[allow(clippy::print_stderr)]
            {
                eprintln!("error: {error}");
            }
            ExitCode::FAILURE
        }
    }
}
