//! Command-line interface for the customer registry.
//!
//! This module provides the CLI structure, output rendering, and the
//! interactive form shell for the `custreg` binary.

mod commands;
pub mod render;
pub mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, EditCommand, FieldArgs, ListCommand, LookupCommand, OutputFormat,
    RemoveCommand, ShowCommand, StatusCommand,
};

/// custreg - Keep a small list of customers and their addresses
///
/// Records are stored locally. Postal codes (CEP) are resolved to street,
/// neighborhood, city and state through a public lookup service.
#[derive(Debug, Parser)]
#[command(name = "custreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a customer
    Add(AddCommand),

    /// List customers, optionally filtered by name
    List(ListCommand),

    /// Show one customer and its form fields
    Show(ShowCommand),

    /// Change an existing customer
    Edit(EditCommand),

    /// Remove a customer
    Remove(RemoveCommand),

    /// Resolve a postal code to an address
    Lookup(LookupCommand),

    /// Fill in the form interactively
    Shell,

    /// Show storage status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "custreg");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let args = vec![
            "custreg",
            "add",
            "--given",
            "Ana Maria",
            "--surname",
            "Souza",
            "--cep",
            "01001-000",
            "--number",
            "10",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Add(add) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(add.fields.given.as_deref(), Some("Ana Maria"));
        assert_eq!(add.fields.postal_code.as_deref(), Some("01001-000"));
        assert_eq!(add.fields.phone, None);
    }

    #[test]
    fn test_parse_list_with_filter_and_format() {
        let args = vec!["custreg", "list", "ana", "--format", "json"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::List(list) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(list.filter.as_deref(), Some("ana"));
        assert_eq!(list.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["custreg", "list"]).unwrap();
        let Command::List(list) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(list.filter, None);
        assert_eq!(list.format, OutputFormat::Table);
    }

    #[test]
    fn test_parse_edit() {
        let args = vec!["custreg", "edit", "2", "--phone", "11888880000"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Edit(edit) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(edit.index, 2);
        assert_eq!(edit.fields.phone.as_deref(), Some("11888880000"));
    }

    #[test]
    fn test_parse_remove_yes() {
        let cli = Cli::try_parse_from(["custreg", "remove", "0", "-y"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Remove(RemoveCommand { index: 0, yes: true })
        ));
    }

    #[test]
    fn test_parse_rejects_negative_index() {
        assert!(Cli::try_parse_from(["custreg", "show", "-1"]).is_err());
    }

    #[test]
    fn test_parse_shell() {
        let cli = Cli::try_parse_from(["custreg", "shell"]).unwrap();
        assert!(matches!(cli.command, Command::Shell));
    }

    #[test]
    fn test_parse_config_validate() {
        let args = vec!["custreg", "config", "validate", "--file", "/tmp/c.toml"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["custreg", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["custreg", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["custreg", "-q", "status"]).unwrap();
        assert!(cli.quiet);
    }
}
