//! Parses CSV statement exports into transaction builders.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    transaction::{Direction, Transaction, TransactionBuilder},
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parses CSV data from a statement export.
///
/// Expects `text` to contain a header row with `Date`, `Amount`, and
/// `Description` columns (in any order, any casing; extra columns are
/// ignored). Dates must be in `YYYY-MM-DD` format. Negative amounts become
/// debits, positive amounts credits; the sign is folded into the direction so
/// amounts are stored as magnitudes.
///
/// Each row gets an import ID derived from its raw content, so importing the
/// same statement twice skips the rows that are already in the database.
///
/// # Errors
/// Returns [Error::InvalidCSV] if the header is missing a required column or
/// a row cannot be parsed.
pub fn parse_csv(text: &str) -> Result<Vec<TransactionBuilder>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    // Cloned so the reader can be borrowed again for the records.
    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(format!("could not read header row: {error}")))?
        .clone();

    let date_column = find_column(&headers, "date")?;
    let amount_column = find_column(&headers, "amount")?;
    let description_column = find_column(&headers, "description")?;

    let mut transactions = Vec::new();

    for (row_number, record) in reader.records().enumerate() {
        // Header is row 1, so data rows start at 2.
        let row_number = row_number + 2;

        let record = record
            .map_err(|error| Error::InvalidCSV(format!("row {row_number}: {error}")))?;

        let raw_date = record.get(date_column).unwrap_or_default();
        let date = Date::parse(raw_date, DATE_FORMAT).map_err(|error| {
            Error::InvalidCSV(format!("row {row_number}: invalid date \"{raw_date}\": {error}"))
        })?;

        let raw_amount = record.get(amount_column).unwrap_or_default();
        let signed_amount: f64 = raw_amount.parse().map_err(|error| {
            Error::InvalidCSV(format!(
                "row {row_number}: invalid amount \"{raw_amount}\": {error}"
            ))
        })?;

        let direction = if signed_amount < 0.0 {
            Direction::Debit
        } else {
            Direction::Credit
        };

        let description = record.get(description_column).unwrap_or_default();

        transactions.push(
            Transaction::build(signed_amount.abs(), date, description)
                .direction(direction)
                .import_id(Some(create_import_id(&record))),
        );
    }

    Ok(transactions)
}

/// Find the index of a named column in the header row (case-insensitive).
fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize, Error> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::InvalidCSV(format!("missing '{name}' column")))
}

/// Derive a stable import ID from the raw content of a CSV record.
///
/// The same row always hashes to the same ID, which is what makes re-imports
/// of an overlapping statement skip the rows that already exist.
fn create_import_id(record: &csv::StringRecord) -> i64 {
    let line = record.iter().collect::<Vec<_>>().join(",");
    let digest = md5::compute(line.as_bytes());

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.0[..8]);

    i64::from_le_bytes(bytes)
}
