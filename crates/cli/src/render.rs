//! Text and JSON rendering of records and history.

use std::fmt::Write as _;

use coldstore_inventory::{HistoryEntry, InventoryRecord};

const RECORD_HEADER: [&str; 9] = [
    "ID", "NAME", "TAX ID", "START", "END", "DAYS", "QTY", "RATE/DAY", "BILL",
];

const HISTORY_HEADER: [&str; 11] = [
    "ENTRY", "ITEM", "CHANGE", "TIMESTAMP", "NAME", "TAX ID", "START", "END", "QTY", "RATE/DAY",
    "BILL",
];

pub fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Render records as an aligned table.
pub fn record_table(records: &[InventoryRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.name.clone(),
                r.tax_id.clone(),
                r.start_date.to_string(),
                r.end_date.to_string(),
                r.days_stored().to_string(),
                r.quantity.to_string(),
                money(r.rate_per_day),
                money(r.bill_amount),
            ]
        })
        .collect();

    table(&RECORD_HEADER, &rows)
}

pub fn history_table(entries: &[HistoryEntry]) -> String {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.inventory_id.to_string(),
                e.change.to_string(),
                e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                e.name.clone(),
                e.tax_id.clone(),
                e.start_date.to_string(),
                e.end_date.to_string(),
                e.quantity.to_string(),
                money(e.rate_per_day),
                money(e.bill_amount),
            ]
        })
        .collect();

    table(&HISTORY_HEADER, &rows)
}

/// Render one record as `field: value` lines.
pub fn record_detail(record: &InventoryRecord) -> String {
    let fields = [
        ("id", record.id.to_string()),
        ("name", record.name.clone()),
        ("tax id", record.tax_id.clone()),
        ("start date", record.start_date.to_string()),
        ("end date", record.end_date.to_string()),
        ("days stored", record.days_stored().to_string()),
        ("quantity", record.quantity.to_string()),
        ("rate per day", money(record.rate_per_day)),
        ("bill amount", money(record.bill_amount)),
    ];

    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in fields {
        let _ = writeln!(out, "{key:<width$}  {value}");
    }
    out
}

fn table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_row(&mut out, header.iter().copied(), &widths);
    for row in rows {
        write_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn write_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}
