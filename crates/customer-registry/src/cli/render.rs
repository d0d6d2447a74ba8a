//! Text rendering for listings and the form.

use std::fmt::Write;

use serde::Serialize;

use crate::form::{Field, FormFields};
use crate::lookup::AddressFragment;
use crate::record::CustomerRecord;
use crate::session::{EditMode, FormSession};

use super::commands::OutputFormat;

/// Printed instead of an empty listing.
pub const EMPTY_LISTING: &str = "No customers found.";

const HEADERS: [&str; 4] = ["#", "Full name", "Phone", "Address"];

#[derive(Serialize)]
struct ListedRecord<'a> {
    index: usize,
    #[serde(flatten)]
    record: &'a CustomerRecord,
}

/// Render listing rows in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn listing(
    rows: &[(usize, &CustomerRecord)],
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => {
            let listed: Vec<ListedRecord<'_>> = rows
                .iter()
                .map(|(index, record)| ListedRecord {
                    index: *index,
                    record,
                })
                .collect();
            serde_json::to_string_pretty(&listed)
        }
        OutputFormat::Plain => Ok(plain(rows)),
        OutputFormat::Table => Ok(table(rows)),
    }
}

fn plain(rows: &[(usize, &CustomerRecord)]) -> String {
    if rows.is_empty() {
        return EMPTY_LISTING.to_string();
    }
    rows.iter()
        .map(|(index, r)| format!("{index}: {} | {} | {}", r.full_name, r.phone, r.address))
        .collect::<Vec<_>>()
        .join("\n")
}

fn table(rows: &[(usize, &CustomerRecord)]) -> String {
    if rows.is_empty() {
        return EMPTY_LISTING.to_string();
    }

    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|(index, r)| {
            [
                index.to_string(),
                r.full_name.clone(),
                r.phone.clone(),
                r.address.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out.truncate(out.trim_end().len());
    out
}

fn push_row(out: &mut String, row: &[String; 4], widths: &[usize; 4]) {
    let padded: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

/// Render the form fields one per line.
#[must_use]
pub fn fields(fields: &FormFields) -> String {
    let width = Field::ALL
        .iter()
        .map(|f| f.label().len())
        .max()
        .unwrap_or(0);
    Field::ALL
        .iter()
        .map(|field| {
            let marker = if field.is_required() { "*" } else { " " };
            format!(
                "{marker} {:<width$}  {}",
                field.label(),
                fields.get(*field),
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the whole form session: mode, fields and submit label.
#[must_use]
pub fn session(session: &FormSession) -> String {
    let mode = match session.mode() {
        EditMode::Idle => "new customer".to_string(),
        EditMode::Editing(index) => format!("editing customer {index}"),
    };
    format!(
        "[{mode}]\n{}\n[{}]",
        fields(session.fields()),
        session.mode().submit_label()
    )
}

/// Render a lookup result.
#[must_use]
pub fn address_fragment(fragment: &AddressFragment) -> String {
    format!(
        "street        {}\nneighborhood  {}\ncity          {}\nstate         {}",
        fragment.street, fragment.neighborhood, fragment.city, fragment.state_code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CustomerRecord> {
        vec![
            CustomerRecord::new("Ana Souza", "11999990000", "Rua A, 10, Centro, São Paulo - SP"),
            CustomerRecord::new("Bruno Lima", "21", "Rua B, 2, Vila, Rio - RJ"),
        ]
    }

    fn rows(records: &[CustomerRecord]) -> Vec<(usize, &CustomerRecord)> {
        records.iter().enumerate().collect()
    }

    #[test]
    fn test_empty_listing() {
        for format in [OutputFormat::Plain, OutputFormat::Table] {
            assert_eq!(listing(&[], format).unwrap(), EMPTY_LISTING);
        }
        assert_eq!(listing(&[], OutputFormat::Json).unwrap(), "[]");
    }

    #[test]
    fn test_plain_listing() {
        let records = sample();
        let out = listing(&rows(&records), OutputFormat::Plain).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "0: Ana Souza | 11999990000 | Rua A, 10, Centro, São Paulo - SP"
        );
    }

    #[test]
    fn test_table_listing_aligns_columns() {
        let records = sample();
        let out = listing(&rows(&records), OutputFormat::Table).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# | Full name"));
        assert!(lines[1].starts_with("--+-"));
        // "Ana Souza" and "Bruno Lima" padded to the same width
        let phone_col = |line: &str| {
            line.char_indices()
                .filter(|(_, c)| *c == '|')
                .nth(1)
                .map(|(i, _)| i)
                .unwrap()
        };
        assert_eq!(phone_col(lines[2]), phone_col(lines[3]));
        assert!(lines[2].contains("São Paulo"));
    }

    #[test]
    fn test_json_listing_keeps_store_index() {
        let records = sample();
        let filtered = vec![(1, &records[1])];
        let out = listing(&filtered, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value[0]["index"], 1);
        assert_eq!(value[0]["fullName"], "Bruno Lima");
        assert_eq!(value[0]["address"], "Rua B, 2, Vila, Rio - RJ");
    }

    #[test]
    fn test_session_render_labels() {
        let mut session = FormSession::new();
        session.set(Field::GivenName, "Ana");

        let out = super::session(&session);
        assert!(out.starts_with("[new customer]"));
        assert!(out.contains("* given name"));
        assert!(out.contains("Ana"));
        assert!(out.ends_with("[Save]"));
    }

    #[test]
    fn test_address_fragment_render() {
        let out = address_fragment(&AddressFragment {
            street: "Praça da Sé".to_string(),
            neighborhood: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state_code: "SP".to_string(),
        });
        assert!(out.contains("Praça da Sé"));
        assert!(out.ends_with("SP"));
    }
}
