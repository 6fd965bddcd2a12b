//! Operator commands for a Kudoer store: migrate, rebuild search indexes,
//! reap expired reset tokens, and print row counts.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use kudoer::domain::ports::{SessionInvalidationError, SessionInvalidator};
use kudoer::domain::{RequestContext, Username};
use kudoer::outbound::persistence::{
    DbPool, SearchIndexKind, SearchIndexMaintenance, run_migrations,
};
use kudoer::{Kudoer, KudoerSettings, LogFormat};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `kudoer-admin` command arguments.
#[derive(Debug, Parser)]
#[command(name = "kudoer-admin", about = "Maintain a Kudoer SQLite store", version)]
struct CliArgs {
    /// Database file. Falls back to `KUDOER_DATABASE_PATH`, then `kudoer.db`.
    #[arg(long = "database", value_name = "path", global = true)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Rebuild one or both search indexes from their base tables.
    RebuildIndex {
        #[arg(long, value_enum, default_value_t = IndexArg::All)]
        index: IndexArg,
    },
    /// Delete expired password reset tokens.
    ReapTokens,
    /// Print user, item, and kudo counts as JSON.
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IndexArg {
    Items,
    Users,
    All,
}

impl IndexArg {
    fn kinds(self) -> &'static [SearchIndexKind] {
        match self {
            Self::Items => &[SearchIndexKind::Items],
            Self::Users => &[SearchIndexKind::Users],
            Self::All => &SearchIndexKind::ALL,
        }
    }
}

/// The admin commands never redeem or consume reset tokens, so no session
/// is ever ended through this invalidator.
struct NoSessions;

#[async_trait]
impl SessionInvalidator for NoSessions {
    async fn invalidate_all(
        &self,
        _username: &Username,
        _keep: Option<String>,
    ) -> Result<(), SessionInvalidationError> {
        Ok(())
    }
}

async fn open_store(settings: &KudoerSettings) -> Result<Kudoer> {
    Kudoer::open(settings, Arc::new(NoSessions))
        .await
        .wrap_err("failed to open store")
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let settings = load_settings(args.database.clone())?;
    init_tracing(settings.log_format());

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(args.command, settings))
}

fn load_settings(database: Option<PathBuf>) -> Result<KudoerSettings> {
    let mut settings = KudoerSettings::load_from_iter([OsString::from("kudoer-admin")])
        .wrap_err("failed to load settings")?;
    if database.is_some() {
        settings.database_path = database;
    }
    Ok(settings)
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = match format {
        LogFormat::Json => fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).pretty().try_init(),
    };
    if let Err(error) = result {
        warn!(%error, "tracing init failed");
    }
}

async fn run(command: Command, settings: KudoerSettings) -> Result<()> {
    match command {
        Command::Migrate => {
            let applied = run_migrations(settings.database_path())
                .await
                .wrap_err("migrations failed")?;
            for version in &applied {
                println!("applied {version}");
            }
            info!(applied = applied.len(), "migrations complete");
        }
        Command::RebuildIndex { index } => {
            run_migrations(settings.database_path())
                .await
                .wrap_err("migrations failed")?;
            let pool = DbPool::new(settings.pool_config())
                .await
                .wrap_err("failed to open database pool")?;
            let indexes = SearchIndexMaintenance::new(pool, settings.index_batch_size());
            for kind in index.kinds() {
                indexes
                    .rebuild(*kind)
                    .await
                    .with_context(|| format!("failed to rebuild {kind}"))?;
                let status = indexes
                    .status(*kind)
                    .await
                    .with_context(|| format!("failed to read {kind} status"))?;
                println!("{kind}: {} documents", status.documents);
            }
        }
        Command::ReapTokens => {
            let store = open_store(&settings).await?;
            let removed = store
                .password_resets
                .reap_expired_tokens(&RequestContext::new())
                .await
                .wrap_err("failed to reap tokens")?;
            println!("removed {removed} expired reset tokens");
        }
        Command::Stats => {
            let store = open_store(&settings).await?;
            let stats = store
                .stats
                .stats(&RequestContext::new())
                .await
                .wrap_err("failed to read stats")?;
            println!(
                "{}",
                serde_json::to_string(&stats).wrap_err("failed to encode stats")?
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rebuild_defaults_to_every_index() {
        let args = CliArgs::try_parse_from(["kudoer-admin", "rebuild-index"]).expect("parses");
        let Command::RebuildIndex { index } = args.command else {
            panic!("expected rebuild-index");
        };
        assert_eq!(index.kinds(), &SearchIndexKind::ALL);
    }

    #[rstest]
    fn settings_load_with_nothing_configured() {
        let _guard = env_lock::lock_env([
            ("KUDOER_DATABASE_PATH", None::<String>),
            ("KUDOER_POOL_MAX_SIZE", None::<String>),
            ("KUDOER_LOG_FORMAT", None::<String>),
        ]);

        let settings = load_settings(Some(PathBuf::from("/tmp/admin.db"))).expect("loads");
        assert_eq!(settings.database_path(), std::path::Path::new("/tmp/admin.db"));
        assert_eq!(settings.pool_max_size(), 10);
        assert_eq!(settings.log_format(), LogFormat::Pretty);
    }

    #[rstest]
    fn database_flag_is_global() {
        let args = CliArgs::try_parse_from(["kudoer-admin", "stats", "--database", "/tmp/k.db"])
            .expect("parses");
        assert_eq!(args.database, Some(PathBuf::from("/tmp/k.db")));
    }
}
