use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drover_core::{LifecycleState, Provider, Resource, TaskId, WorkloadSnapshot};
use drover_storage::{parse_fields, Catalog};
use drover_storage_sqlite::SqliteCatalog;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "drover", version)]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = "drover.toml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config (if missing) and create the catalog database
    Init,

    /// Registered cluster providers
    #[command(subcommand)]
    Provider(ProviderCommand),

    /// Deployed resource records
    #[command(subcommand)]
    Resource(ResourceCommand),

    /// Distinct accounts holding resources for an application
    Accounts {
        #[arg(long)]
        app: String,
    },

    /// Grant a group access to an account
    #[command(subcommand)]
    Grant(AccessCommand),

    /// Groups allowed to access an account
    #[command(subcommand)]
    Groups(GroupsCommand),

    /// Print the lifecycle state of a Kubernetes Job manifest (JSON, or YAML by extension)
    JobStatus { file: PathBuf },
}

#[derive(Subcommand)]
enum ProviderCommand {
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        host: String,
        #[arg(long, default_value = "")]
        ca_data: String,
        #[arg(long)]
        token: String,
    },
    /// Show one provider, including its bearer token
    Get { name: String },
    /// List providers (no credentials)
    List,
}

#[derive(Subcommand)]
enum ResourceCommand {
    Record {
        #[arg(long)]
        account: String,
        #[arg(long)]
        app: String,
        /// Task id; a new one is generated when omitted
        #[arg(long)]
        task: Option<String>,
        #[arg(long, default_value = "")]
        api_group: String,
        #[arg(long)]
        kind: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        namespace: String,
        #[arg(long, default_value = "v1")]
        version: String,
        /// File holding the deployed manifest
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
    ByTask { task: String },
    /// Distinct combinations of the given columns
    Distinct {
        #[arg(long = "field")]
        fields: Vec<String>,
    },
}

#[derive(Subcommand)]
enum AccessCommand {
    Read {
        #[arg(long)]
        account: String,
        #[arg(long)]
        group: String,
    },
    Write {
        #[arg(long)]
        account: String,
        #[arg(long)]
        group: String,
    },
}

#[derive(Subcommand)]
enum GroupsCommand {
    Read { account: String },
    Write { account: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Init => {
            let db_path = init(&cli.config)?;
            println!("Initialized catalog at {}", db_path.display());
        }
        Command::JobStatus { file } => {
            println!("{}", job_status(&file)?);
        }
        cmd => {
            let catalog = open_catalog(&cli.config)?;
            println!("{}", execute(cmd, &catalog)?);
        }
    }

    Ok(())
}

/// Write the default config unless one exists, then create the database and its schema.
fn init(config_path: &Path) -> Result<PathBuf> {
    if !config_path.exists() {
        Config::default().save_to(config_path)?;
    }
    let db_path = load_config(config_path)?.database.db_path();
    open_catalog(config_path)?;
    Ok(db_path)
}

fn load_config(path: &Path) -> Result<Config> {
    let mut cfg = Config::load_or_default(path)?;
    cfg.apply_env();
    Ok(cfg)
}

fn open_catalog(config_path: &Path) -> Result<SqliteCatalog> {
    let cfg = load_config(config_path)?;
    let db_path = cfg.database.db_path();
    SqliteCatalog::open(&db_path, cfg.database.pool_config()).with_context(|| format!("open catalog {}", db_path.display()))
}

fn job_status(file: &Path) -> Result<LifecycleState> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    let is_yaml = matches!(file.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"));
    let parsed = if is_yaml {
        serde_yaml::from_str::<serde_json::Value>(&raw).map_err(anyhow::Error::from)
    } else {
        serde_json::from_str::<serde_json::Value>(&raw).map_err(anyhow::Error::from)
    };
    // an unreadable manifest still resolves to a state
    let job = parsed.unwrap_or_else(|e| {
        tracing::warn!(file = %file.display(), error = %e, "could not parse job manifest");
        serde_json::Value::Null
    });
    Ok(WorkloadSnapshot::from_job_manifest(&job).lifecycle_state())
}

fn execute(cmd: Command, catalog: &dyn Catalog) -> Result<String> {
    let out = match cmd {
        Command::Provider(ProviderCommand::Register { name, host, ca_data, token }) => {
            catalog.register_provider(Provider {
                name: name.clone(),
                host,
                ca_data,
                bearer_token: token,
            })?;
            format!("Registered provider {}", name)
        }
        Command::Provider(ProviderCommand::Get { name }) => serde_json::to_string_pretty(&catalog.get_provider(&name)?)?,
        Command::Provider(ProviderCommand::List) => serde_json::to_string_pretty(&catalog.list_providers()?)?,
        Command::Resource(ResourceCommand::Record {
            account,
            app,
            task,
            api_group,
            kind,
            name,
            namespace,
            version,
            body_file,
        }) => {
            let resource_body = match body_file {
                Some(path) => std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?,
                None => String::new(),
            };
            let task_id = task.map(TaskId::from_str).unwrap_or_else(TaskId::new);
            catalog.record_resource(Resource {
                account_name: account,
                spinnaker_app: app,
                task_id: task_id.clone(),
                api_group,
                kind,
                name,
                namespace,
                resource_body,
                version,
            })?;
            format!("Recorded resource under task {}", task_id)
        }
        Command::Resource(ResourceCommand::ByTask { task }) => {
            serde_json::to_string_pretty(&catalog.list_resources_by_task(&TaskId::from_str(task))?)?
        }
        Command::Resource(ResourceCommand::Distinct { fields }) => {
            let fields = parse_fields(fields.as_slice())?;
            serde_json::to_string_pretty(&catalog.list_resources_by_fields(&fields)?)?
        }
        Command::Accounts { app } => serde_json::to_string_pretty(&catalog.list_accounts_by_application(&app)?)?,
        Command::Grant(AccessCommand::Read { account, group }) => {
            catalog.grant_read(&account, &group)?;
            format!("Granted read on {} to {}", account, group)
        }
        Command::Grant(AccessCommand::Write { account, group }) => {
            catalog.grant_write(&account, &group)?;
            format!("Granted write on {} to {}", account, group)
        }
        Command::Groups(GroupsCommand::Read { account }) => serde_json::to_string_pretty(&catalog.list_read_groups(&account)?)?,
        Command::Groups(GroupsCommand::Write { account }) => serde_json::to_string_pretty(&catalog.list_write_groups(&account)?)?,
        Command::Init | Command::JobStatus { .. } => anyhow::bail!("command does not operate on the catalog"),
    };
    Ok(out)
}
