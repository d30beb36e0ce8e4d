// Primitives for reading vote counts from CSV files.

use std::io::Read;

use csv::Reader;

use crate::tally::*;

pub fn read_csv_counts(path: &str, cfs: &CountSource) -> AppResult<Vec<VoteCount>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(cfs.has_header.unwrap_or(true))
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_counts(rdr, cfs)
}

/// Reads one count per line. Lines without an id or with an invalid count are
/// skipped. A line that cannot be decoded at all fails the whole file.
pub fn read_counts<R: Read>(rdr: Reader<R>, cfs: &CountSource) -> AppResult<Vec<VoteCount>> {
    let id_idx = cfs.id_column_index()?;
    let count_idx = cfs.count_column_index()?;
    let row_offset = if rdr.has_headers() { 2 } else { 1 };

    let mut res: Vec<VoteCount> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_counts: lineno: {:?} row: {:?}", lineno, line);
        let option_id = match line.get(id_idx).map(|s| s.trim()) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                warn!("read_counts: line {}: missing option id", lineno);
                continue;
            }
        };
        match line.get(count_idx).and_then(|s| s.trim().parse::<u64>().ok()) {
            Some(count) => res.push(VoteCount::new(option_id, count)),
            None => {
                warn!(
                    "read_counts: line {}: invalid count {:?} for {}",
                    lineno,
                    line.get(count_idx),
                    option_id
                );
            }
        }
    }
    Ok(res)
}
