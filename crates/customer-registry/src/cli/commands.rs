//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::form::Field;

/// Form field values given on the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct FieldArgs {
    /// Given name (may contain spaces)
    #[arg(long)]
    pub given: Option<String>,

    /// Surname (a single word)
    #[arg(long)]
    pub surname: Option<String>,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Postal code (CEP); triggers the address lookup
    #[arg(long = "postal-code", visible_alias = "cep")]
    pub postal_code: Option<String>,

    /// House number
    #[arg(long)]
    pub number: Option<String>,

    /// Street (only when the postal lookup is disabled)
    #[arg(long)]
    pub street: Option<String>,

    /// Neighborhood (only when the postal lookup is disabled)
    #[arg(long)]
    pub neighborhood: Option<String>,

    /// City (only when the postal lookup is disabled)
    #[arg(long)]
    pub city: Option<String>,

    /// State code (only when the postal lookup is disabled)
    #[arg(long)]
    pub state: Option<String>,
}

impl FieldArgs {
    /// The fields that were given, in form order.
    #[must_use]
    pub fn values(&self) -> Vec<(Field, &str)> {
        [
            (Field::GivenName, &self.given),
            (Field::Surname, &self.surname),
            (Field::Phone, &self.phone),
            (Field::PostalCode, &self.postal_code),
            (Field::Street, &self.street),
            (Field::Neighborhood, &self.neighborhood),
            (Field::City, &self.city),
            (Field::State, &self.state),
            (Field::Number, &self.number),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|value| (field, value)))
        .collect()
    }
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Field values for the new customer
    #[command(flatten)]
    pub fields: FieldArgs,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show customers whose name contains this text (case-insensitive)
    pub filter: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Index of the customer, as printed by `list`
    pub index: usize,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Index of the customer, as printed by `list`
    pub index: usize,

    /// Field values to change; the postal code must be given again
    #[command(flatten)]
    pub fields: FieldArgs,
}

/// Remove command arguments.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Index of the customer, as printed by `list`
    pub index: usize,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Lookup command arguments.
#[derive(Debug, Args)]
pub struct LookupCommand {
    /// Postal code (CEP), with or without punctuation
    pub postal_code: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per customer
    Plain,
    /// Aligned table
    #[default]
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_field_args_values_in_form_order() {
        let args = FieldArgs {
            number: Some("10".to_string()),
            given: Some("Ana".to_string()),
            postal_code: Some("01001000".to_string()),
            ..FieldArgs::default()
        };

        assert_eq!(
            args.values(),
            vec![
                (Field::GivenName, "Ana"),
                (Field::PostalCode, "01001000"),
                (Field::Number, "10"),
            ]
        );
    }

    #[test]
    fn test_field_args_empty() {
        assert!(FieldArgs::default().values().is_empty());
    }

    #[test]
    fn test_remove_command_debug() {
        let cmd = RemoveCommand {
            index: 2,
            yes: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("index: 2"));
    }
}
