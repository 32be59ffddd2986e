//! CSV source — reads order and spend files into raw rows.
//!
//! RFC-4180 quoting (a quoted field may span lines), header lookup by
//! name. Rows carry the line they start on. Validation happens in the
//! normalizer.

use crate::{
    error::{CohortError, CohortResult, RecordSource},
    normalizer::{RawOrderRow, RawSpendRow},
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub fn read_orders_file(path: impl AsRef<Path>) -> CohortResult<Vec<RawOrderRow>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open orders file {}: {e}", path.display()))?;
    read_orders(BufReader::new(file))
}

pub fn read_spend_file(path: impl AsRef<Path>) -> CohortResult<Vec<RawSpendRow>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open spend file {}: {e}", path.display()))?;
    read_spend(BufReader::new(file))
}

pub fn read_orders<R: BufRead>(reader: R) -> CohortResult<Vec<RawOrderRow>> {
    let table = CsvTable::read(reader, RecordSource::Orders)?;
    let order_id = table.column("order_id")?;
    let order_date = table.column("order_date")?;
    let customer_id = table.column("customer_id")?;
    let channel = table.column("channel")?;
    let revenue = table.column("revenue")?;

    Ok(table
        .rows
        .iter()
        .map(|(line, cells)| RawOrderRow {
            line:        *line,
            order_id:    cell(cells, order_id),
            order_date:  cell(cells, order_date),
            customer_id: cell(cells, customer_id),
            channel:     cell(cells, channel),
            revenue:     cell(cells, revenue),
        })
        .collect())
}

pub fn read_spend<R: BufRead>(reader: R) -> CohortResult<Vec<RawSpendRow>> {
    let table = CsvTable::read(reader, RecordSource::Spend)?;
    let month = table.column("month")?;
    let spend = table.column("spend")?;
    // channel is informational; tolerate files without it
    let channel = table.header.get("channel").copied();

    Ok(table
        .rows
        .iter()
        .map(|(line, cells)| RawSpendRow {
            line:    *line,
            month:   cell(cells, month),
            channel: channel.and_then(|c| cell(cells, c)),
            spend:   cell(cells, spend),
        })
        .collect())
}

struct CsvTable {
    source: RecordSource,
    header: HashMap<String, usize>,
    rows:   Vec<(usize, Vec<String>)>,
}

impl CsvTable {
    fn read<R: BufRead>(mut reader: R, source: RecordSource) -> CohortResult<Self> {
        let mut header: Option<HashMap<String, usize>> = None;
        let mut rows = Vec::new();
        let mut raw = Vec::new();
        let mut line_no = 0;
        // (first line, text so far) of a record whose quoted field spans lines
        let mut pending: Option<(usize, String)> = None;

        loop {
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            line_no += 1;
            let text = String::from_utf8(std::mem::take(&mut raw))
                .map_err(|_| CohortError::malformed(source, line_no, "invalid UTF-8"))?;
            let text = if line_no == 1 { text.trim_start_matches('\u{feff}') } else { text.as_str() };
            let text = text.trim_end_matches('\n').trim_end_matches('\r');

            let (start, record) = match pending.take() {
                Some((start, mut record)) => {
                    record.push('\n');
                    record.push_str(text);
                    (start, record)
                }
                None if text.trim().is_empty() => continue,
                None => (line_no, text.to_string()),
            };
            if has_open_quote(&record) {
                pending = Some((start, record));
                continue;
            }

            let cells = split_csv_line(&record)
                .map_err(|reason| CohortError::malformed(source, start, reason))?;

            match header {
                None => {
                    header = Some(
                        cells
                            .iter()
                            .enumerate()
                            .map(|(i, name)| (name.trim().to_ascii_lowercase(), i))
                            .collect(),
                    );
                }
                Some(_) => rows.push((start, cells)),
            }
        }

        if let Some((start, _)) = pending {
            return Err(CohortError::malformed(source, start, "unterminated quoted field"));
        }
        let header = header
            .ok_or_else(|| CohortError::malformed(source, 1, "file has no header row"))?;
        Ok(Self { source, header, rows })
    }

    fn column(&self, name: &str) -> CohortResult<usize> {
        self.header.get(name).copied().ok_or_else(|| {
            CohortError::malformed(self.source, 1, format!("missing required column '{name}'"))
        })
    }
}

/// An odd quote count means a quoted field is still open; doubled
/// quotes inside a field count twice and cancel out.
fn has_open_quote(record: &str) -> bool {
    record.bytes().filter(|b| *b == b'"').count() % 2 == 1
}

fn cell(cells: &[String], idx: usize) -> Option<String> {
    cells
        .get(idx)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Split one CSV line into fields. Quoted fields may contain commas
/// and doubled quotes; a quote must open at the start of a field.
pub fn split_csv_line(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut was_quoted = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            ',' => {
                fields.push(std::mem::take(&mut field));
                was_quoted = false;
            }
            '"' if field.trim().is_empty() && !was_quoted => {
                field.clear();
                in_quotes = true;
                was_quoted = true;
            }
            '"' => return Err("unexpected quote inside unquoted field".into()),
            _ if was_quoted && !c.is_whitespace() => {
                return Err("unexpected text after closing quote".into())
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".into());
    }
    fields.push(field);
    Ok(fields)
}
