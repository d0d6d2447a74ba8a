//! `custreg` - CLI for the customer registry
//!
//! This binary provides the command-line interface for adding, listing,
//! editing and removing customers, and an interactive form shell.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Write};

use anyhow::{bail, Context};
use clap::Parser;

use customer_registry::cli::{
    render, shell, Cli, Command, ConfigCommand, EditCommand, FieldArgs, ListCommand,
    LookupCommand, OutputFormat, RemoveCommand, ShowCommand,
};
use customer_registry::lookup::{LookupOutcome, PostalCode, PostalLookup, ViaCepClient};
use customer_registry::session::{FormSession, LookupNotice, RemoveOutcome, SubmitOutcome};
use customer_registry::{form, init_logging, Config, Field, Registry, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config commands must work even when the config file is broken.
    if let Command::Config(config_cmd) = cli.command {
        return handle_config(cli.config, config_cmd);
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let lookup = build_lookup(&config)?;
    let lookup = lookup.as_ref().map(|client| client as &dyn PostalLookup);

    match cli.command {
        Command::Add(add_cmd) => {
            let mut registry = open_registry(&config)?;
            handle_add(&mut registry, lookup, &add_cmd.fields).await
        }
        Command::List(list_cmd) => handle_list(&open_registry(&config)?, &list_cmd),
        Command::Show(show_cmd) => handle_show(&open_registry(&config)?, &show_cmd),
        Command::Edit(edit_cmd) => {
            let mut registry = open_registry(&config)?;
            handle_edit(&mut registry, lookup, &edit_cmd).await
        }
        Command::Remove(remove_cmd) => {
            let mut registry = open_registry(&config)?;
            handle_remove(&mut registry, &remove_cmd)
        }
        Command::Lookup(lookup_cmd) => handle_lookup(lookup, &lookup_cmd).await,
        Command::Shell => {
            let mut registry = open_registry(&config)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            shell::Shell::new(&mut registry, lookup, stdin.lock(), stdout.lock())
                .run()
                .await?;
            Ok(())
        }
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Config(_) => Ok(()),
    }
}

fn open_registry(config: &Config) -> anyhow::Result<Registry> {
    let path = config.database_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    Ok(Registry::open(storage, config.storage.storage_key.clone()))
}

fn build_lookup(config: &Config) -> customer_registry::Result<Option<ViaCepClient>> {
    if !config.lookup.enabled {
        return Ok(None);
    }
    let client = ViaCepClient::from_config(&config.lookup)?;
    Ok(Some(client))
}

/// Copy command-line field values into the form, then run the postal lookup
/// if a code was given.
async fn fill_form(
    session: &mut FormSession,
    lookup: Option<&dyn PostalLookup>,
    fields: &FieldArgs,
) -> anyhow::Result<()> {
    let values = fields.values();
    for (field, value) in &values {
        if field.is_derived() && lookup.is_some() {
            bail!(
                "the {} is filled in from the postal code; set lookup.enabled = false to enter it by hand",
                field.label()
            );
        }
        session.set(*field, value);
    }

    let postal_code_given = values.iter().any(|(field, _)| *field == Field::PostalCode);
    if let Some(lookup) = lookup.filter(|_| postal_code_given) {
        match session.blur_postal_code(lookup).await {
            LookupNotice::NotFound => eprintln!("Notice: postal code not found."),
            LookupNotice::Failed(reason) => eprintln!("Notice: postal lookup failed: {reason}"),
            LookupNotice::Filled | LookupNotice::Skipped | LookupNotice::Stale => {}
        }
    }
    Ok(())
}

fn print_submit(outcome: &SubmitOutcome) {
    let verb = if outcome.created { "Saved" } else { "Updated" };
    println!(
        "{verb} customer {}: {}",
        outcome.index, outcome.record.full_name
    );
    println!("  Phone:   {}", outcome.record.phone);
    println!("  Address: {}", outcome.record.address);
}

async fn handle_add(
    registry: &mut Registry,
    lookup: Option<&dyn PostalLookup>,
    fields: &FieldArgs,
) -> anyhow::Result<()> {
    let mut session = FormSession::new();
    fill_form(&mut session, lookup, fields).await?;
    let outcome = session.submit(registry)?;
    print_submit(&outcome);
    Ok(())
}

async fn handle_edit(
    registry: &mut Registry,
    lookup: Option<&dyn PostalLookup>,
    cmd: &EditCommand,
) -> anyhow::Result<()> {
    let mut session = FormSession::new();
    session.open_for_edit(registry, cmd.index)?;
    if cmd.fields.postal_code.is_none() {
        bail!("records do not keep the postal code; give it again with --postal-code");
    }
    fill_form(&mut session, lookup, &cmd.fields).await?;
    let outcome = session.submit(registry)?;
    print_submit(&outcome);
    Ok(())
}

fn handle_list(registry: &Registry, cmd: &ListCommand) -> anyhow::Result<()> {
    let rows = registry.filtered(cmd.filter.as_deref().unwrap_or_default());
    println!("{}", render::listing(&rows, cmd.format)?);
    Ok(())
}

fn handle_show(registry: &Registry, cmd: &ShowCommand) -> anyhow::Result<()> {
    let record = registry.get(cmd.index)?;
    if cmd.json {
        println!(
            "{}",
            render::listing(&[(cmd.index, record)], OutputFormat::Json)?
        );
        return Ok(());
    }

    println!("Customer {}", cmd.index);
    println!("  Full name: {}", record.full_name);
    println!("  Phone:     {}", record.phone);
    println!("  Address:   {}", record.address);
    println!();
    match form::decompose(record) {
        Ok(fields) => println!("{}", render::fields(&fields)),
        Err(e) => println!("This record cannot be edited: {e}"),
    }
    Ok(())
}

fn handle_remove(registry: &mut Registry, cmd: &RemoveCommand) -> anyhow::Result<()> {
    let mut confirm = |prompt: &str| {
        if cmd.yes {
            return true;
        }
        shell::ask_yes_no(&mut io::stdin().lock(), &mut io::stdout(), prompt)
    };

    let mut session = FormSession::new();
    match session.remove(registry, cmd.index, &mut confirm)? {
        RemoveOutcome::Declined => println!("Nothing removed."),
        RemoveOutcome::Removed { record, .. } => println!("Removed {}.", record.full_name),
    }
    Ok(())
}

async fn handle_lookup(
    lookup: Option<&dyn PostalLookup>,
    cmd: &LookupCommand,
) -> anyhow::Result<()> {
    let Some(lookup) = lookup else {
        bail!("postal lookup is disabled in the configuration");
    };
    let Some(code) = PostalCode::parse(&cmd.postal_code) else {
        bail!("postal code must have exactly 8 digits: {}", cmd.postal_code);
    };

    let outcome = lookup.lookup(&code).await?;
    match (outcome, cmd.json) {
        (LookupOutcome::Found(fragment), true) => {
            let value = serde_json::json!({
                "postal_code": code.as_str(),
                "found": true,
                "street": fragment.street,
                "neighborhood": fragment.neighborhood,
                "city": fragment.city,
                "state": fragment.state_code,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        (LookupOutcome::Found(fragment), false) => {
            println!("{}", render::address_fragment(&fragment));
        }
        (LookupOutcome::NotFound, true) => {
            let value = serde_json::json!({ "postal_code": code.as_str(), "found": false });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        (LookupOutcome::NotFound, false) => println!("Postal code {code} not found."),
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let registry = open_registry(config)?;
    let stats = registry.storage().stats(registry.key())?;
    let last_saved = stats.last_saved.map(|t| t.to_rfc3339());

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "storage_key": registry.key(),
            "record_count": registry.len(),
            "record_bytes": stats.slot_bytes,
            "last_saved": last_saved,
            "slot_count": stats.slot_count,
            "database_bytes": stats.db_size_bytes,
            "lookup_enabled": config.lookup.enabled,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("custreg status");
        println!("--------------");
        println!("Database:      {}", config.database_path().display());
        println!("Storage key:   {}", registry.key());
        println!("Customers:     {}", registry.len());
        println!("Record bytes:  {}", stats.slot_bytes);
        println!(
            "Last saved:    {}",
            last_saved.as_deref().unwrap_or("never")
        );
        println!("Database size: {} bytes", stats.db_size_bytes);
        println!(
            "Postal lookup: {}",
            if config.lookup.enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

fn handle_config(
    config_path: Option<std::path::PathBuf>,
    cmd: ConfigCommand,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path).context("failed to load configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Storage key:        {}", config.storage.storage_key);
                println!();
                println!("[Lookup]");
                println!("  Enabled:            {}", config.lookup.enabled);
                println!("  Endpoint:           {}", config.lookup.endpoint);
                match config.lookup.timeout() {
                    Some(timeout) => println!("  Timeout:            {}s", timeout.as_secs()),
                    None => println!("  Timeout:            none"),
                }
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    io::stdout().flush()?;
    Ok(())
}
