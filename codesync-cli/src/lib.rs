//! codesync command-line client.
//!
//! Usage:
//!   codesync push component chart
//!   codesync push function --file functions/calc.groovy
//!   codesync push class --path classes/Foo.groovy
//!   codesync push --all
//!   codesync push-repo class --branch release
//!   codesync pull function calc

pub mod prompt;
pub mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use codesync_manifest::JsonManifestStore;
use codesync_sync::{
    push_from_repository, BatchReport, CredentialPrompt, GitHostClient, HttpRemoteService,
    KindSelection, LocalSource, RemoteService, SyncConfig, SyncOrchestrator,
};
use codesync_types::ResourceKind;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "codesync")]
#[command(about = "Push components, plugins, functions and classes to the platform")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (default: <dir>/codesync.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Push resources from the local workspace
    Push {
        /// Resource type (component, plugin, function, class)
        #[arg(required_unless_present = "all")]
        kind: Option<ResourceKind>,

        /// Resource name (directory or file stem)
        #[arg(conflicts_with_all = ["file", "all"])]
        name: Option<String>,

        /// Push the resource at this path
        #[arg(long, alias = "path", conflicts_with = "all", requires = "kind")]
        file: Option<String>,

        /// Push every resource of the type, or of every type when no type is given
        #[arg(long)]
        all: bool,
    },

    /// Push resources straight from the configured git repository
    PushRepo {
        /// Resource type (component, plugin, function, class)
        #[arg(required_unless_present = "all")]
        kind: Option<ResourceKind>,

        /// Push every type
        #[arg(long)]
        all: bool,

        /// Branch to read (overrides git.branch)
        #[arg(long)]
        branch: Option<String>,
    },

    /// Download a function or class and record its server version
    Pull {
        /// Resource type (function, class)
        kind: ResourceKind,

        /// Resource name
        name: String,
    },
}

impl Cli {
    /// Loads config from `--config` or the workspace default, with
    /// environment overrides applied.
    pub fn load_config(&self) -> Result<SyncConfig> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| self.dir.join(codesync_sync::config::CONFIG_FILE_NAME));
        let config = SyncConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        Ok(config.with_env_overrides())
    }
}

/// Selection for a push: `--all` with or without a type.
fn selection(kind: Option<ResourceKind>, all: bool) -> Result<KindSelection> {
    match (kind, all) {
        (Some(kind), _) => Ok(KindSelection::One(kind)),
        (None, true) => Ok(KindSelection::All),
        (None, false) => bail!("a resource type or --all is required"),
    }
}

/// Resolves `path` against `dir` unless it is absolute.
fn resolve(dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

/// Converts a user-supplied path into a source-relative one.
fn source_path(dir: &Path, path: &str) -> String {
    let candidate = Path::new(path);
    let relative = candidate.strip_prefix(dir).unwrap_or(candidate);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|c| c != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn local_orchestrator(cli: &Cli, config: &SyncConfig) -> Result<SyncOrchestrator> {
    let remote: Arc<dyn RemoteService> = Arc::new(
        HttpRemoteService::new(config.service.clone()).context("failed to create remote client")?,
    );
    let manifest = JsonManifestStore::new(resolve(&cli.dir, &config.workspace.manifest_path));
    Ok(
        SyncOrchestrator::new(remote, Box::new(manifest), config.retry.max_retries)
            .with_tenant(config.service.tenant_id.clone()),
    )
}

/// Runs a parsed command and returns the process exit status.
pub async fn run(cli: Cli, prompt: Arc<dyn CredentialPrompt>) -> Result<ExitCode> {
    let mut config = cli.load_config()?;

    match &cli.command {
        Command::Push {
            kind,
            name,
            file,
            all,
        } => {
            let mut orchestrator = local_orchestrator(&cli, &config)?;
            let source = LocalSource::new(&cli.dir);

            let report = match (kind, name, file) {
                (Some(kind), Some(name), _) => {
                    let mut report = BatchReport::default();
                    report.push(
                        orchestrator
                            .push_named(*kind, name, &source, &config.workspace)
                            .await,
                    );
                    report
                }
                (Some(kind), None, Some(file)) => {
                    let mut report = BatchReport::default();
                    report.push(
                        orchestrator
                            .push_path(*kind, &source_path(&cli.dir, file), &source)
                            .await,
                    );
                    report
                }
                _ if *all => {
                    orchestrator
                        .push_all(selection(*kind, *all)?, &source, &config.workspace)
                        .await
                }
                _ => bail!("specify a resource name, --file or --all"),
            };

            print!("{}", report::render(&report));
            Ok(report::exit_code(&report))
        }

        Command::PushRepo { kind, all, branch } => {
            if let Some(branch) = branch {
                config.git.branch = branch.clone();
            }
            let selection = selection(*kind, *all)?;
            let remote: Arc<dyn RemoteService> = Arc::new(
                HttpRemoteService::new(config.service.clone())
                    .context("failed to create remote client")?,
            );
            let client = Arc::new(
                GitHostClient::new(config.git.clone(), prompt)
                    .context("failed to create git host client")?,
            );

            let report = push_from_repository(remote, client, &config, selection)
                .await
                .context("repository push failed")?;

            print!("{}", report::render(&report));
            Ok(report::exit_code(&report))
        }

        Command::Pull { kind, name } => {
            let mut orchestrator = local_orchestrator(&cli, &config)?;
            let root = cli.dir.join(config.workspace.root_for(*kind));
            let pulled = orchestrator
                .pull(*kind, name, &root)
                .await
                .with_context(|| format!("failed to pull {kind} {name}"))?;

            info!("Wrote {}", pulled.path.display());
            println!("{} pulled at version {}", pulled.key, pulled.version);
            Ok(ExitCode::SUCCESS)
        }
    }
}
