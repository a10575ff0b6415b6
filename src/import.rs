//! Bulk CSV import: header row + value rows parsed into column → value
//! maps and appended to the record store as a single batch.
//!
//! The append is all-or-nothing (one batch call, never per-row) and
//! a malformed file fails fast before anything reaches the store.

use crate::state::DashboardState;
use crate::store::{ImportRow, RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("CSV file is empty or contains only a header row.")]
    TooFewLines,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parse CSV text into column → value rows keyed by the header line.
///
/// Double-quoted fields may contain commas; a doubled quote inside a
/// quoted field is a literal quote. Headers and unquoted values are
/// trimmed; missing trailing fields become empty strings. Blank lines
/// are skipped entirely.
pub fn parse_csv(text: &str) -> Result<Vec<ImportRow>, ImportError> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(ImportError::TooFewLines);
    }

    let headers: Vec<String> = split_line(lines[0]);

    let rows = lines[1..]
        .iter()
        .map(|line| {
            let values = split_line(line);
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    (header.clone(), values.get(i).cloned().unwrap_or_default())
                })
                .collect()
        })
        .collect();

    Ok(rows)
}

/// Split one CSV line into fields, honoring double-quote quoting.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            // An opening quote may follow leading whitespace
            '"' if !quoted && field.trim().is_empty() => {
                field.clear();
                quoted = true;
                in_quotes = true;
            }
            '"' => field.push(c),
            ',' if !in_quotes => {
                fields.push(finish_field(field, quoted));
                field = String::new();
                quoted = false;
            }
            _ => field.push(c),
        }
    }
    fields.push(finish_field(field, quoted));
    fields
}

fn finish_field(field: String, quoted: bool) -> String {
    if quoted {
        field
    } else {
        field.trim().to_string()
    }
}

/// Run a full import: parse, append as one batch, then refetch the
/// set and jump back to the first page. Returns the number of rows
/// handed to the store.
pub fn import_csv(
    state: &DashboardState,
    store: &dyn RecordStore,
    text: &str,
) -> Result<usize, ImportError> {
    let rows = match parse_csv(text) {
        Ok(rows) => rows,
        Err(err) => {
            state.notify_error(format!("Upload failed: {err}"));
            return Err(err);
        }
    };

    if let Err(err) = store.append(&rows) {
        state.notify_error(format!("Upload failed: {err}"));
        return Err(err.into());
    }

    state.notify_success(format!("{} records uploaded successfully!", rows.len()));
    state.reset_page();

    // Refetch so the new rows (with their store-assigned ids) show up.
    // A failure here is not an import failure; the append landed.
    if let Err(err) = state.refresh_from_store(store) {
        tracing::warn!(error = %err, "Refetch after import failed");
    }

    Ok(rows.len())
}
