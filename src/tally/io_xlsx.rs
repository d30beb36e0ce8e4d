// Primitives for reading vote counts from Excel exports.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::tally::*;

fn get_range(path: &str, cfs: &CountSource) -> AppResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match cfs.excel_worksheet_name.as_ref() {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

pub fn read_xlsx_counts(path: &str, cfs: &CountSource) -> AppResult<Vec<VoteCount>> {
    let wrange = get_range(path, cfs)?;
    let mut iter = wrange.rows();
    // The first row is the header.
    if let Some(header) = iter.next() {
        debug!("read_xlsx_counts: header: {:?}", header);
    }
    counts_from_rows(iter, cfs.id_column_index()?, cfs.count_column_index()?)
}

fn read_cell_id(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        _ => None,
    }
}

fn read_cell_count(cell: &DataType) -> Option<u64> {
    match cell {
        DataType::Int(i) if *i >= 0 => Some(*i as u64),
        DataType::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
        DataType::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Reads one count per row. Rows without an id are skipped, as are rows with
/// an invalid count.
pub fn counts_from_rows<'a, I>(rows: I, id_idx: usize, count_idx: usize) -> AppResult<Vec<VoteCount>>
where
    I: Iterator<Item = &'a [DataType]>,
{
    let mut res: Vec<VoteCount> = Vec::new();
    for (idx, row) in rows.enumerate() {
        // Row numbers as displayed by spreadsheets, after the header.
        let lineno = idx + 2;
        let option_id = match row.get(id_idx).and_then(read_cell_id) {
            Some(x) => x,
            None => {
                debug!("counts_from_rows: row {}: no option id, skipping", lineno);
                continue;
            }
        };
        match row.get(count_idx).and_then(read_cell_count) {
            Some(count) => res.push(VoteCount::new(option_id, count)),
            None => {
                warn!(
                    "counts_from_rows: row {}: invalid count {:?} for {}",
                    lineno,
                    row.get(count_idx),
                    option_id
                );
            }
        }
    }
    Ok(res)
}
