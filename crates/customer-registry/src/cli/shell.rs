//! Interactive form shell.
//!
//! Reads one command per line and drives a [`FormSession`] against the
//! registry. Bad input and recoverable failures are printed as notices;
//! only I/O and storage failures end the loop.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{Error, Result};
use crate::form::Field;
use crate::lookup::PostalLookup;
use crate::registry::Registry;
use crate::session::{FormSession, LookupNotice, RemoveOutcome, SubmitOutcome};

use super::commands::OutputFormat;
use super::render;

const HELP: &str = "\
Commands:
  set <field> <value>  fill a field (given, surname, phone, cep, number,
                       street, neighborhood, city, state)
  blur                 look up the address for the current postal code
  submit               save the form (alias: save, update)
  clear                empty the form, keeping the edit mode
  cancel               leave edit mode and empty the form
  edit <index>         load a customer into the form
  remove <index>       remove a customer
  filter [text]        only list customers whose name contains text
  list                 list customers
  form                 show the form
  help                 show this help
  quit                 leave the shell (alias: exit)";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Overwrite a form field.
    Set {
        /// Target field.
        field: Field,
        /// New value; may be empty.
        value: String,
    },
    /// Run the postal lookup for the current code.
    Blur,
    /// Save or update.
    Submit,
    /// Empty the form.
    Clear,
    /// Leave edit mode.
    Cancel,
    /// Open a record for editing.
    Edit(usize),
    /// Remove a record.
    Remove(usize),
    /// Change the listing filter.
    Filter(String),
    /// Print the listing.
    List,
    /// Print the form.
    Form,
    /// Print the command summary.
    Help,
    /// Leave the shell.
    Quit,
}

impl ShellCommand {
    /// Parse a line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a message for the user when the line is not a command.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        let command = match verb.to_lowercase().as_str() {
            "set" => {
                let (name, value) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(name, value)| (name, value.trim()));
                if name.is_empty() {
                    return Err("usage: set <field> <value>".to_string());
                }
                let field = name.parse::<Field>()?;
                Self::Set {
                    field,
                    value: value.to_string(),
                }
            }
            "blur" => Self::Blur,
            "submit" | "save" | "update" => Self::Submit,
            "clear" => Self::Clear,
            "cancel" => Self::Cancel,
            "edit" => Self::Edit(parse_index(rest, "edit")?),
            "remove" | "rm" => Self::Remove(parse_index(rest, "remove")?),
            "filter" => Self::Filter(rest.to_string()),
            "list" | "ls" => Self::List,
            "form" => Self::Form,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{other}'; try 'help'")),
        };
        Ok(Some(command))
    }
}

fn parse_index(raw: &str, verb: &str) -> std::result::Result<usize, String> {
    raw.parse()
        .map_err(|_| format!("usage: {verb} <index> (as shown by 'list')"))
}

/// The interactive session loop.
pub struct Shell<'a, R, W> {
    registry: &'a mut Registry,
    lookup: Option<&'a dyn PostalLookup>,
    session: FormSession,
    filter: String,
    input: R,
    output: W,
}

impl<R, W> std::fmt::Debug for Shell<'_, R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("session", &self.session)
            .field("filter", &self.filter)
            .field("lookup_enabled", &self.lookup.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    /// Create a shell over `registry`. Without `lookup`, address fields are
    /// typed by hand.
    pub fn new(
        registry: &'a mut Registry,
        lookup: Option<&'a dyn PostalLookup>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            registry,
            lookup,
            session: FormSession::new(),
            filter: String::new(),
            input,
            output,
        }
    }

    /// The form session as it stands.
    #[must_use]
    pub fn session(&self) -> &FormSession {
        &self.session
    }

    /// Read and run commands until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the terminal fails, or on a
    /// storage failure that is not a user mistake.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Type 'help' for commands.")?;
        let mut line = String::new();
        loop {
            write!(self.output, "{}> ", self.session.mode().submit_label().to_lowercase())?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            match ShellCommand::parse(&line) {
                Ok(None) => {}
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => self.execute(command).await?,
                Err(message) => writeln!(self.output, "{message}")?,
            }
        }
        debug!("Shell closed");
        Ok(())
    }

    /// Run one command.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures the user cannot fix from the
    /// shell; recoverable ones are printed.
    pub async fn execute(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Set { field, value } => self.set(field, &value).await?,
            ShellCommand::Blur => match self.lookup {
                Some(lookup) => {
                    let notice = self.session.blur_postal_code(lookup).await;
                    self.report_lookup(&notice, true)?;
                }
                None => writeln!(self.output, "Postal lookup is disabled.")?,
            },
            ShellCommand::Submit => {
                let result = self.session.submit(self.registry);
                match result {
                    Ok(outcome) => self.report_submit(&outcome)?,
                    Err(e) => self.notice(e)?,
                }
            }
            ShellCommand::Clear => {
                self.session.clear();
                self.print_form()?;
            }
            ShellCommand::Cancel => {
                self.session.cancel_edit();
                self.print_form()?;
            }
            ShellCommand::Edit(index) => match self.session.open_for_edit(self.registry, index) {
                Ok(()) => {
                    writeln!(self.output, "Postal code must be entered again before updating.")?;
                    self.print_form()?;
                }
                Err(e) => self.notice(e)?,
            },
            ShellCommand::Remove(index) => self.remove(index)?,
            ShellCommand::Filter(text) => {
                self.filter = text;
                self.print_list()?;
            }
            ShellCommand::List => self.print_list()?,
            ShellCommand::Form => self.print_form()?,
            ShellCommand::Help => writeln!(self.output, "{HELP}")?,
            ShellCommand::Quit => {}
        }
        Ok(())
    }

    async fn set(&mut self, field: Field, value: &str) -> Result<()> {
        if field.is_derived() && self.lookup.is_some() {
            writeln!(
                self.output,
                "The {} is filled in from the postal code.",
                field.label()
            )?;
            return Ok(());
        }

        self.session.set(field, value);
        if field == Field::PostalCode {
            if let Some(lookup) = self.lookup {
                let notice = self.session.blur_postal_code(lookup).await;
                self.report_lookup(&notice, false)?;
            }
        }
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<()> {
        let input = &mut self.input;
        let output = &mut self.output;
        let mut ask = |prompt: &str| ask_yes_no(&mut *input, &mut *output, prompt);

        match self.session.remove(self.registry, index, &mut ask) {
            Ok(RemoveOutcome::Declined) => writeln!(self.output, "Nothing removed.")?,
            Ok(RemoveOutcome::Removed {
                record,
                cancelled_edit,
            }) => {
                writeln!(self.output, "Removed {}.", record.full_name)?;
                if cancelled_edit {
                    writeln!(self.output, "The edit of that customer was cancelled.")?;
                }
            }
            Err(e) => self.notice(e)?,
        }
        Ok(())
    }

    fn report_submit(&mut self, outcome: &SubmitOutcome) -> Result<()> {
        let verb = if outcome.created { "Saved" } else { "Updated" };
        writeln!(
            self.output,
            "{verb} customer {}: {}",
            outcome.index, outcome.record.full_name
        )?;
        Ok(())
    }

    fn report_lookup(&mut self, notice: &LookupNotice, explicit: bool) -> Result<()> {
        match notice {
            LookupNotice::Skipped if explicit => {
                writeln!(self.output, "Postal code needs exactly 8 digits.")?;
            }
            LookupNotice::Skipped | LookupNotice::Stale => {}
            LookupNotice::Filled => {
                let fields = self.session.fields();
                writeln!(
                    self.output,
                    "Address: {}, {}, {} - {}",
                    fields.street, fields.neighborhood, fields.city, fields.state
                )?;
            }
            LookupNotice::NotFound => writeln!(self.output, "Postal code not found.")?,
            LookupNotice::Failed(reason) => {
                writeln!(self.output, "Postal lookup failed: {reason}")?;
            }
        }
        Ok(())
    }

    /// Print a recoverable error, or hand back one that is not.
    fn notice(&mut self, error: Error) -> Result<()> {
        if error.is_recoverable() {
            writeln!(self.output, "{error}")?;
            Ok(())
        } else {
            Err(error)
        }
    }

    fn print_form(&mut self) -> Result<()> {
        writeln!(self.output, "{}", render::session(&self.session))?;
        Ok(())
    }

    fn print_list(&mut self) -> Result<()> {
        let rows = self.registry.filtered(&self.filter);
        let text = render::listing(&rows, OutputFormat::Table)?;
        writeln!(self.output, "{text}")?;
        Ok(())
    }
}

/// Ask `prompt` on `output` and read the answer from `input`.
///
/// Anything but `y` or `yes` counts as no, including read failures.
pub fn ask_yes_no(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> bool {
    if write!(output, "{prompt} [y/N] ").and_then(|()| output.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::lookup::{AddressFragment, LookupError, LookupOutcome, PostalCode};
    use crate::record::CustomerRecord;
    use crate::storage::Storage;

    struct StubLookup;

    #[async_trait::async_trait]
    impl PostalLookup for StubLookup {
        async fn lookup(
            &self,
            code: &PostalCode,
        ) -> std::result::Result<LookupOutcome, LookupError> {
            match code.as_str() {
                "01001000" => Ok(LookupOutcome::Found(AddressFragment {
                    street: "Praça da Sé".to_string(),
                    neighborhood: "Sé".to_string(),
                    city: "São Paulo".to_string(),
                    state_code: "SP".to_string(),
                })),
                "99999999" => Err(LookupError::Request("timed out".to_string())),
                _ => Ok(LookupOutcome::NotFound),
            }
        }
    }

    fn create_test_registry() -> Registry {
        Registry::open(Storage::open_in_memory().unwrap(), "clientes")
    }

    async fn run_script(
        registry: &mut Registry,
        lookup: Option<&dyn PostalLookup>,
        script: &str,
    ) -> String {
        let mut output = Vec::new();
        let mut shell = Shell::new(registry, lookup, Cursor::new(script.to_string()), &mut output);
        shell.run().await.unwrap();
        String::from_utf8(output).unwrap()
    }

    const ADD_ANA: &str = "\
set given Ana Maria
set surname Souza
set phone 11999990000
set cep 01001-000
set number 10
submit
";

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("  "), Ok(None));
        assert_eq!(
            ShellCommand::parse("set given Ana Maria"),
            Ok(Some(ShellCommand::Set {
                field: Field::GivenName,
                value: "Ana Maria".to_string()
            }))
        );
        assert_eq!(
            ShellCommand::parse("set street"),
            Ok(Some(ShellCommand::Set {
                field: Field::Street,
                value: String::new()
            }))
        );
        assert_eq!(ShellCommand::parse("SAVE"), Ok(Some(ShellCommand::Submit)));
        assert_eq!(ShellCommand::parse("edit 3"), Ok(Some(ShellCommand::Edit(3))));
        assert_eq!(
            ShellCommand::parse("filter  ana "),
            Ok(Some(ShellCommand::Filter("ana".to_string())))
        );
        assert_eq!(
            ShellCommand::parse("filter"),
            Ok(Some(ShellCommand::Filter(String::new())))
        );
        assert_eq!(ShellCommand::parse("exit"), Ok(Some(ShellCommand::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(ShellCommand::parse("frobnicate").is_err());
        assert!(ShellCommand::parse("set").is_err());
        assert!(ShellCommand::parse("set color blue").is_err());
        assert!(ShellCommand::parse("edit").is_err());
        assert!(ShellCommand::parse("remove -1").is_err());
    }

    #[test]
    fn test_ask_yes_no() {
        let mut out = Vec::new();
        assert!(ask_yes_no(&mut Cursor::new("y\n"), &mut out, "Go?"));
        assert!(ask_yes_no(&mut Cursor::new("YES\n"), &mut out, "Go?"));
        assert!(!ask_yes_no(&mut Cursor::new("\n"), &mut out, "Go?"));
        assert!(!ask_yes_no(&mut Cursor::new(""), &mut out, "Go?"));
        assert!(String::from_utf8(out).unwrap().contains("Go? [y/N]"));
    }

    #[tokio::test]
    async fn test_add_with_lookup() {
        let mut registry = create_test_registry();
        let out = run_script(&mut registry, Some(&StubLookup), ADD_ANA).await;

        assert!(out.contains("Address: Praça da Sé, Sé, São Paulo - SP"));
        assert!(out.contains("Saved customer 0: Ana Maria Souza"));
        assert_eq!(
            registry.records(),
            &[CustomerRecord::new(
                "Ana Maria Souza",
                "11999990000",
                "Praça da Sé, 10, Sé, São Paulo - SP"
            )]
        );
    }

    #[tokio::test]
    async fn test_derived_fields_refused_when_lookup_enabled() {
        let mut registry = create_test_registry();
        let out = run_script(&mut registry, Some(&StubLookup), "set street Rua X\nform\n").await;

        assert!(out.contains("The street is filled in from the postal code."));
        assert!(!out.contains("Rua X"));
    }

    #[tokio::test]
    async fn test_manual_address_without_lookup() {
        let mut registry = create_test_registry();
        let script = "set given Bruno\nset surname Lima\nset phone 21\nset cep 20040002\n\
                      set number 5\nset street Rua B\nset neighborhood Centro\nset city Rio\n\
                      set state RJ\nsubmit\n";
        let out = run_script(&mut registry, None, script).await;

        assert!(out.contains("Saved customer 0: Bruno Lima"));
        assert_eq!(registry.records()[0].address, "Rua B, 5, Centro, Rio - RJ");
    }

    #[tokio::test]
    async fn test_ambiguous_value_is_refused() {
        let mut registry = create_test_registry();
        let script = "set given Bruno\nset surname Lima\nset phone 21\nset cep 20040002\n\
                      set number 5\nset street Rua B, fundos\nsubmit\n";
        let out = run_script(&mut registry, None, script).await;

        assert!(out.contains("cannot be stored unambiguously"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_notices_are_not_fatal() {
        let mut registry = create_test_registry();
        let out = run_script(
            &mut registry,
            Some(&StubLookup),
            "set cep 00000000\nset cep 99999999\nset cep 123\nblur\nform\n",
        )
        .await;

        assert!(out.contains("Postal code not found."));
        assert!(out.contains("Postal lookup failed: "));
        assert!(out.contains("timed out"));
        assert!(out.contains("Postal code needs exactly 8 digits."));
        assert!(out.contains("[Save]"));
    }

    #[tokio::test]
    async fn test_blur_without_lookup() {
        let mut registry = create_test_registry();
        let out = run_script(&mut registry, None, "blur\n").await;
        assert!(out.contains("Postal lookup is disabled."));
    }

    #[tokio::test]
    async fn test_edit_and_update() {
        let mut registry = create_test_registry();
        let script = format!(
            "{ADD_ANA}edit 0\nset phone 11888880000\nset cep 01001000\nupdate\n"
        );
        let out = run_script(&mut registry, Some(&StubLookup), &script).await;

        assert!(out.contains("[editing customer 0]"));
        assert!(out.contains("update> "));
        assert!(out.contains("Updated customer 0: Ana Maria Souza"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.records()[0].phone, "11888880000");
    }

    #[tokio::test]
    async fn test_remove_asks_and_reads_answer() {
        let mut registry = create_test_registry();
        let script = format!("{ADD_ANA}remove 0\nn\nremove 0\ny\nlist\n");
        let out = run_script(&mut registry, Some(&StubLookup), &script).await;

        assert!(out.contains("Remove customer 'Ana Maria Souza'? [y/N]"));
        assert!(out.contains("Nothing removed."));
        assert!(out.contains("Removed Ana Maria Souza."));
        assert!(out.contains(render::EMPTY_LISTING));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_remove_always_prompts() {
        let mut registry = create_test_registry();
        registry
            .upsert(None, CustomerRecord::new("Ana Souza", "1", "Rua A, 10, Centro, Recife - PE"))
            .unwrap();

        // Input ends before an answer is given.
        let out = run_script(&mut registry, None, "remove 0\n").await;

        assert!(out.contains("Remove customer 'Ana Souza'? [y/N]"));
        assert!(out.contains("Nothing removed."));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_filter_keeps_store_indices() {
        let mut registry = create_test_registry();
        registry
            .upsert(None, CustomerRecord::new("Bruno Lima", "21", "Rua B, 5, Centro, Rio - RJ"))
            .unwrap();
        let out = run_script(&mut registry, Some(&StubLookup), &format!("{ADD_ANA}filter ana\n"))
            .await;

        let listing = out.rsplit("Saved customer").next().unwrap();
        assert!(listing.contains("1 | Ana Maria Souza"));
        assert!(!listing.contains("Bruno Lima"));
    }

    #[tokio::test]
    async fn test_recoverable_errors_keep_shell_running() {
        let mut registry = create_test_registry();
        let out = run_script(
            &mut registry,
            Some(&StubLookup),
            "submit\nedit 7\nremove 7\nbogus\nhelp\n",
        )
        .await;

        assert!(out.contains("required fields missing"));
        assert!(out.contains("no record at index 7"));
        assert!(out.contains("unknown command 'bogus'"));
        assert!(out.contains("Commands:"));
    }
}
