use ::scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::{MtbError, Result};
use crate::model::RaceResult;
use crate::scraper::events::FLAG_PREFIX;
use crate::scraper::pairing::consecutive_pairs;
use crate::scraper::standardize_header;
use crate::scraper::tree::{self, Query};
use crate::validate::{FromRaw, RawRecord};

/// Attribute the site puts on rows it shows and hides on demand (the nested detail rows).
const VISIBILITY_ATTR: &str = "x-show";
/// Header columns announcing per-segment detail rows.
const DETAIL_COLUMNS: [&str; 3] = ["splits", "laps", "stages"];

const ROW_SECTIONS: [&str; 3] = ["thead", "tbody", "tfoot"];

/// How a results table lays out its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TableLayout {
    /// One row per athlete.
    Flat,
    /// Each athlete row is followed by a row holding a nested per-segment table.
    Detailed,
}

/// Extract and validate every athlete's result on a race-results page.
pub fn extract_results(document: &Html) -> Result<Vec<RaceResult>> {
    let results = extract_raw_results(document)?
        .iter()
        .map(RaceResult::from_raw)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    debug!(count = results.len(), "parsed results page");
    Ok(results)
}

/// Raw field dictionaries of every athlete row. Fails when the page has no table at all or
/// the table's rows do not line up with its header.
pub fn extract_raw_results(document: &Html) -> Result<Vec<RawRecord>> {
    let table = find_results_table(document)?;
    let header = header_row(table);
    let headers = header.map(header_names).unwrap_or_default();
    let rows = body_rows(table, header);
    let layout = detect_layout(&headers, &rows);
    debug!(%layout, rows = rows.len(), columns = headers.len(), "detected results table layout");

    match layout {
        TableLayout::Flat => rows
            .iter()
            .enumerate()
            .map(|(i, row)| overall_row(&headers, *row, i))
            .collect(),
        TableLayout::Detailed => consecutive_pairs(rows, "detailed results table")?
            .into_iter()
            .enumerate()
            .map(|(i, (overall, detail))| -> Result<RawRecord> {
                let mut raw = overall_row(&headers, overall, i * 2)?;
                raw.insert_records("details", detail_rows(detail)?);
                Ok(raw)
            })
            .collect(),
    }
}

pub(crate) fn find_results_table(document: &Html) -> Result<ElementRef<'_>> {
    tree::find_first(document.root_element(), &Query::tag("table")).ok_or(
        MtbError::ElementNotFound {
            context: "results table",
        },
    )
}

/// Rows belonging to `table` itself, not to tables nested inside it.
fn table_rows(table: ElementRef) -> Vec<ElementRef> {
    tree::children(table, &Query::tags(&ROW_SECTIONS))
        .into_iter()
        .flat_map(|section| tree::children(section, &Query::tag("tr")))
        .collect()
}

/// The `thead` row, or failing that the first row made of `th` cells.
pub(crate) fn header_row(table: ElementRef) -> Option<ElementRef> {
    let thead_row = tree::children(table, &Query::tag("thead"))
        .into_iter()
        .find_map(|thead| tree::children(thead, &Query::tag("tr")).into_iter().next());
    thead_row.or_else(|| {
        table_rows(table)
            .into_iter()
            .find(|row| !tree::children(*row, &Query::tag("th")).is_empty())
    })
}

fn row_cells(row: ElementRef) -> Vec<ElementRef> {
    tree::children(row, &Query::tags(&["td", "th"]))
}

pub(crate) fn header_names(row: ElementRef) -> Vec<String> {
    row_cells(row)
        .iter()
        .map(|cell| standardize_header(&tree::text_of(cell)))
        .collect()
}

pub(crate) fn body_rows<'a>(
    table: ElementRef<'a>,
    header: Option<ElementRef>,
) -> Vec<ElementRef<'a>> {
    let header = header.map(|h| h.id());
    tree::children(table, &Query::tag("tbody"))
        .into_iter()
        .flat_map(|tbody| tree::children(tbody, &Query::tag("tr")))
        .filter(|row| Some(row.id()) != header)
        .collect()
}

pub fn detect_layout(headers: &[String], rows: &[ElementRef]) -> TableLayout {
    let toggled_rows = rows
        .iter()
        .any(|row| row.value().attr(VISIBILITY_ATTR).is_some());
    let detail_columns = headers
        .iter()
        .any(|h| DETAIL_COLUMNS.contains(&h.as_str()));
    if toggled_rows || detail_columns {
        TableLayout::Detailed
    } else {
        TableLayout::Flat
    }
}

/// Key `row`'s cell texts by `headers`, then apply the per-row link and flag heuristics.
fn overall_row(headers: &[String], row: ElementRef, index: usize) -> Result<RawRecord> {
    let mut raw = keyed_cells(headers, row, index, "results table")?;

    if let Some(nation) = row_nation(row) {
        raw.insert_text("nation", nation);
    }
    for (key, value) in [("rider", row_rider(row)), ("team", row_team(row))] {
        match value {
            Some(value) => raw.insert_text(key, value),
            None if !raw.contains_key(key) => raw.insert_text(key, ""),
            None => {}
        }
    }
    Ok(raw)
}

fn keyed_cells(
    headers: &[String],
    row: ElementRef,
    index: usize,
    context: &'static str,
) -> Result<RawRecord> {
    let cells = row_cells(row);
    if cells.len() != headers.len() {
        return Err(MtbError::ColumnMismatch {
            context,
            row: index,
            headers: headers.len(),
            cells: cells.len(),
        });
    }
    Ok(headers
        .iter()
        .zip(cells.iter().map(tree::text_of))
        .map(|(header, text)| (header.clone(), text))
        .collect())
}

/// Segment dictionaries from the table nested in a detail row, keyed by that table's own
/// first row.
pub(crate) fn detail_rows(detail: ElementRef) -> Result<Vec<RawRecord>> {
    let Some(nested) = tree::find_first(detail, &Query::tag("table")) else {
        debug!("detail row without nested table");
        return Ok(vec![]);
    };
    let mut rows = table_rows(nested).into_iter();
    let Some(header) = rows.next() else {
        return Ok(vec![]);
    };
    let headers = header_names(header);
    rows.enumerate()
        .map(|(i, row)| keyed_cells(&headers, row, i + 1, "nested detail table"))
        .collect()
}

/// Country code from a flag icon anywhere in the row, upper-cased.
pub(crate) fn row_nation(row: ElementRef) -> Option<String> {
    tree::find_first(row, &Query::any().attr_prefix("id", FLAG_PREFIX))
        .and_then(|flag| tree::attr_of(&flag, "id"))
        .and_then(|id| id.strip_prefix(FLAG_PREFIX).map(str::to_uppercase))
        .filter(|code| !code.is_empty())
}

fn row_link_text(row: ElementRef, index: usize) -> Option<String> {
    tree::find_all(row, &Query::tag("a"))
        .get(index)
        .map(tree::text_of)
}

/// The first link is the profile photo; the second carries the rider name.
pub(crate) fn row_rider(row: ElementRef) -> Option<String> {
    row_link_text(row, 1)
}

/// The third link, when present, carries the team name.
pub(crate) fn row_team(row: ElementRef) -> Option<String> {
    row_link_text(row, 2)
}
