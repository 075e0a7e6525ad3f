//! `checkfleet` - CLI for the checklist repository
//!
//! This binary lists, imports, deletes and syncs vehicle inspection
//! checklists through the same repository a client application uses.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;

use checkfleet::checklist::{self, generate_id};
use checkfleet::cli::{
    Cli, Command, ConfigCommand, ImportCommand, ListCommand, StatusCommand, ValidateCommand,
};
use checkfleet::fetch::fetcher_for;
use checkfleet::validate;
use checkfleet::{
    init_logging, ChecklistRepository, Config, FirestoreConnector, ImageNormalizer, LocalStore,
    ReloadingCredentials, VehicleChecklist,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Status(cmd) => handle_status(&config, cli.config, &cmd),
        Command::List(cmd) => handle_list(&open_repository(&config, cli.config)?, &cmd).await,
        Command::Show(cmd) => handle_show(&open_repository(&config, cli.config)?, &cmd.id).await,
        Command::New(cmd) => handle_new(&cmd.user),
        Command::Import(cmd) => {
            handle_import(&open_repository(&config, cli.config)?, &cmd).await
        }
        Command::Delete(cmd) => {
            let repo = open_repository(&config, cli.config)?;
            repo.delete(&cmd.id).await?;
            println!("Deleted {} ({} backend)", cmd.id, repo.active_backend());
            Ok(())
        }
        Command::Sync => handle_sync(&open_repository(&config, cli.config)?).await,
        Command::Validate(cmd) => handle_validate(&cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_repository(
    config: &Config,
    config_path: Option<PathBuf>,
) -> anyhow::Result<ChecklistRepository> {
    let local = LocalStore::open(config.database_path(), config.storage.namespace_key.clone())
        .context("opening local store")?;
    let connector = FirestoreConnector::new(config.remote.timeout())?;
    let fetcher = fetcher_for(config.images.platform, config.fetch_timeout())?;

    Ok(ChecklistRepository::new(
        Arc::new(local),
        Arc::new(connector),
        Arc::new(ReloadingCredentials::new(config_path)),
        ImageNormalizer::new(fetcher),
    ))
}

fn handle_status(
    config: &Config,
    config_path: Option<PathBuf>,
    cmd: &StatusCommand,
) -> anyhow::Result<()> {
    let backend = if config.remote.is_configured() {
        "remote"
    } else {
        "local"
    };
    let config_path = config_path.unwrap_or_else(Config::default_config_path);

    if cmd.json {
        let status = serde_json::json!({
            "backend": backend,
            "config_path": config_path,
            "database_path": config.database_path(),
            "namespace_key": config.storage.namespace_key,
            "project_id": config.remote.project_id,
            "collection": config.remote.collection,
            "platform": config.images.platform,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("checkfleet status");
        println!("-----------------");
        println!("Backend:       {backend}");
        println!("Config:        {}", config_path.display());
        println!("Database:      {}", config.database_path().display());
        println!("Namespace:     {}", config.storage.namespace_key);
        if config.remote.is_configured() {
            println!("Project:       {}", config.remote.project_id);
            println!("Collection:    {}", config.remote.collection);
        }
    }
    Ok(())
}

async fn handle_list(repo: &ChecklistRepository, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut checklists = checklist::filter_visible(repo.get_all().await?, &cmd.viewer());
    checklist::sort_newest_first(&mut checklists);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&checklists)?);
        return Ok(());
    }

    if checklists.is_empty() {
        println!("No checklists.");
        return Ok(());
    }
    println!(
        "{:<15} {:<10} {:<5} {:<8} {:<20} {}",
        "ID", "DATE", "TIME", "PLATE", "DRIVER", "USER"
    );
    for c in &checklists {
        println!(
            "{:<15} {:<10} {:<5} {:<8} {:<20} {}",
            c.id, c.date, c.time, c.plate, c.driver, c.user_id
        );
    }
    Ok(())
}

async fn handle_show(repo: &ChecklistRepository, id: &str) -> anyhow::Result<()> {
    let Some(checklist) = repo.get(id).await? else {
        bail!("no checklist with id {id}");
    };
    println!("{}", serde_json::to_string_pretty(&checklist)?);
    Ok(())
}

fn handle_new(user: &str) -> anyhow::Result<()> {
    let now = Utc::now();
    let checklist = VehicleChecklist::new(generate_id(now), user, now);
    println!("{}", serde_json::to_string_pretty(&checklist)?);
    Ok(())
}

async fn handle_import(repo: &ChecklistRepository, cmd: &ImportCommand) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&cmd.file)
        .with_context(|| format!("reading {}", cmd.file.display()))?;
    let mut checklist: VehicleChecklist = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", cmd.file.display()))?;

    if let Some(user) = &cmd.user {
        checklist.assign_owner_if_missing(user);
    }
    validate::validate_checklist(&checklist)?;
    checklist.touch(Utc::now());

    repo.save(&checklist).await?;
    let unresolved = count_unresolved(repo, &checklist.id).await?;
    println!("Saved {} ({} backend)", checklist.id, repo.active_backend());
    if unresolved > 0 {
        println!("  {unresolved} image(s) could not be embedded and were kept as references");
    }
    Ok(())
}

async fn count_unresolved(repo: &ChecklistRepository, id: &str) -> anyhow::Result<usize> {
    Ok(repo
        .get(id)
        .await?
        .map_or(0, |c| c.unresolved_images().len()))
}

async fn handle_sync(repo: &ChecklistRepository) -> anyhow::Result<()> {
    let sync = repo.sync_orchestrator();
    if !sync.is_available() {
        bail!("remote backend is not configured; set FIREBASE_PROJECT_ID and FIREBASE_API_KEY");
    }

    let report = sync.push_local(repo.local_store().as_ref()).await?;
    println!("Uploaded {} checklist(s)", report.uploaded);
    Ok(())
}

fn handle_validate(cmd: &ValidateCommand) -> anyhow::Result<()> {
    let mut failed = Vec::new();

    for (field, value) in cmd.fields() {
        let ok = match field {
            "plate" => validate::validate_plate(value),
            "driver" => validate::validate_text(value),
            "km" => validate::validate_km(value),
            "date" => validate::validate_date(value),
            _ => validate::validate_time(value),
        };
        println!("{field:<7} {value:<20} {}", if ok { "valid" } else { "invalid" });
        if !ok {
            failed.push(field);
        }
    }

    if !failed.is_empty() {
        bail!("invalid: {}", failed.join(", "));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                let mut shown = config.clone();
                if !shown.remote.api_key.is_empty() {
                    shown.remote.api_key = "<redacted>".to_string();
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Namespace key:      {}", config.storage.namespace_key);
                println!();
                println!("[Remote]");
                println!("  Configured:         {}", config.remote.is_configured());
                println!("  Project id:         {}", config.remote.project_id);
                println!("  Base URL:           {}", config.remote.base_url);
                println!("  Collection:         {}", config.remote.collection);
                println!("  Page size:          {}", config.remote.page_size);
                println!("  Timeout (s):        {}", config.remote.timeout_secs);
                println!();
                println!("[Images]");
                println!("  Platform:           {:?}", config.images.platform);
                println!("  Fetch timeout (s):  {}", config.images.fetch_timeout_secs);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
