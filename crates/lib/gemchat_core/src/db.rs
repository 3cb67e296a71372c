//! Embedded PostgreSQL for local runs and tests.
//!
//! [`DbManager`] drives a private PostgreSQL instance through the server
//! binaries (`initdb`, `pg_ctl`, `pg_isready`) located via `pg_config`. The
//! server uses it with `--embedded-db`; Postgres-backed tests use
//! [`DbManager::ephemeral`].

use std::ffi::OsStr;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use sqlx::postgres::PgPool;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{Instant, sleep};

/// Default database name.
const DEFAULT_DATABASE: &str = "gemchat";

/// How long `start` waits for the server to accept connections.
const READY_TIMEOUT: Duration = Duration::from_secs(30);

const READY_POLL: Duration = Duration::from_millis(200);

/// Errors from managing the embedded instance.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("PostgreSQL command failed: {0}")]
    Command(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data directory not available")]
    NoDataDir,

    #[error("pg_config not found on PATH")]
    PgConfigNotFound,

    #[error("PostgreSQL not ready after {0:?}")]
    ReadyTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Lifecycle manager for one embedded PostgreSQL instance.
pub struct DbManager {
    bin_dir: PathBuf,
    data_dir: PathBuf,
    database: String,
    /// 0 until `start` assigns a free port.
    port: u16,
    started: bool,
    /// Keeps an ephemeral data directory alive for the manager's lifetime.
    _tempdir: Option<tempfile::TempDir>,
}

impl DbManager {
    /// Manager with persistent data under `data_dir`.
    pub async fn new(data_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            bin_dir: pg_bin_dir().await?,
            data_dir,
            database: DEFAULT_DATABASE.to_string(),
            port: 0,
            started: false,
            _tempdir: None,
        })
    }

    /// Manager with data under the platform data directory (see [`default_data_dir`]).
    pub async fn with_default_data_dir() -> Result<Self> {
        Self::new(default_data_dir().ok_or(DbError::NoDataDir)?).await
    }

    /// Manager with a temporary data directory, removed on drop.
    pub async fn ephemeral() -> Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let mut mgr = Self::new(tempdir.path().join("pgdata")).await?;
        mgr._tempdir = Some(tempdir);
        Ok(mgr)
    }

    /// Run `initdb` unless the data directory is already initialized.
    pub async fn setup(&mut self) -> Result<()> {
        if self.data_dir.join("PG_VERSION").exists() {
            log::info!("Data directory already initialized, skipping initdb");
            return Ok(());
        }
        log::info!("Initializing PostgreSQL data directory at {}", self.data_dir.display());
        self.run(
            "initdb",
            [
                OsStr::new("-D"),
                self.data_dir.as_os_str(),
                OsStr::new("--no-locale"),
                OsStr::new("--encoding=UTF8"),
            ],
        )
        .await?;
        Ok(())
    }

    /// Start the server on a free port and create the application database.
    pub async fn start(&mut self) -> Result<()> {
        if self.port == 0 {
            self.port = find_free_port()?;
        }
        log::info!("Starting PostgreSQL on port {}", self.port);

        let server_opts = format!(
            "-p {} -k {} -h localhost",
            self.port,
            self.data_dir.display()
        );
        let logfile = self.data_dir.join("postgresql.log");
        self.run(
            "pg_ctl",
            [
                OsStr::new("-D"),
                self.data_dir.as_os_str(),
                OsStr::new("-o"),
                OsStr::new(&server_opts),
                OsStr::new("-l"),
                logfile.as_os_str(),
                OsStr::new("start"),
            ],
        )
        .await?;

        self.wait_until_ready().await?;
        self.started = true;
        self.ensure_database().await?;

        log::info!("Database '{}' ready at {}", self.database, self.connection_url());
        Ok(())
    }

    /// Fast shutdown. No-op when not started.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        log::info!("Stopping PostgreSQL");
        self.run(
            "pg_ctl",
            [
                OsStr::new("-D"),
                self.data_dir.as_os_str(),
                OsStr::new("-m"),
                OsStr::new("fast"),
                OsStr::new("stop"),
            ],
        )
        .await?;
        self.started = false;
        Ok(())
    }

    pub fn connection_url(&self) -> String {
        format!("postgresql://localhost:{}/{}", self.port, self.database)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run one PG binary, failing with its stderr on a non-zero exit.
    async fn run<I, S>(&self, program: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(self.bin_dir.join(program))
            .args(args)
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DbError::Command(format!("{program} failed: {stderr}")));
        }
        Ok(output)
    }

    async fn wait_until_ready(&self) -> Result<()> {
        let deadline = Instant::now() + READY_TIMEOUT;
        let port = self.port.to_string();
        loop {
            let ready = Command::new(self.bin_dir.join("pg_isready"))
                .args(["-p", port.as_str(), "-h", "localhost"])
                .output()
                .await?
                .status
                .success();
            if ready {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DbError::ReadyTimeout(READY_TIMEOUT));
            }
            sleep(READY_POLL).await;
        }
    }

    async fn ensure_database(&self) -> Result<()> {
        let admin_url = format!("postgresql://localhost:{}/postgres", self.port);
        let admin = PgPool::connect(&admin_url).await?;
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(&self.database)
                .fetch_one(&admin)
                .await?;
        if !exists {
            log::info!("Creating database '{}'", self.database);
            // CREATE DATABASE takes no bind parameters.
            sqlx::query(&format!("CREATE DATABASE \"{}\"", self.database))
                .execute(&admin)
                .await?;
        }
        admin.close().await;
        Ok(())
    }
}

/// Bin directory reported by `pg_config --bindir`.
async fn pg_bin_dir() -> Result<PathBuf> {
    let output = Command::new("pg_config")
        .arg("--bindir")
        .output()
        .await
        .map_err(|_| DbError::PgConfigNotFound)?;
    if !output.status.success() {
        return Err(DbError::PgConfigNotFound);
    }
    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}

fn find_free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Default data directory for the embedded instance.
///
/// - macOS: `~/Library/Application Support/gemchat/pgdata`
/// - Linux: `~/.local/share/gemchat/pgdata`
/// - Windows: `%APPDATA%\gemchat\pgdata`
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("gemchat").join("pgdata"))
}
