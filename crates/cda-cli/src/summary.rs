//! Summary tables printed after a run.
//!
//! Tables go to stderr so stdout stays reserved for JSON output.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::{ConvertResult, ExtractResult};

pub fn print_extract_summary(result: &ExtractResult) {
    eprintln!("Work unit: {}", result.work_unit_id);
    if let Some(path) = &result.output {
        eprintln!("Output: {}", path.display());
    }
    for path in &result.csv_files {
        eprintln!("CSV: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Document"),
        header_cell("Authors"),
        header_cell("Sections"),
        header_cell("Entries"),
        header_cell("Values"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for document in &result.documents {
        table.add_row(vec![
            Cell::new(&document.file_name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(document.authors),
            Cell::new(document.sections),
            Cell::new(document.entries),
            Cell::new(document.values),
        ]);
    }
    for failure in &result.failures {
        table.add_row(vec![
            Cell::new(&failure.file_name).fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    eprintln!("{table}");

    let mut rows = Table::new();
    rows.set_header(vec![header_cell("Table"), header_cell("Rows")]);
    apply_table_style(&mut rows);
    align_column(&mut rows, 1, CellAlignment::Right);
    for (name, count) in &result.table_rows {
        rows.add_row(vec![Cell::new(name), count_cell(*count)]);
    }
    eprintln!("{rows}");

    if !result.failures.is_empty() {
        eprintln!("Errors:");
        for failure in &result.failures {
            eprintln!("- {}", failure.error);
        }
    }
}

pub fn print_convert_summary(result: &ConvertResult) {
    print_extract_summary(&result.extract);

    let mut table = Table::new();
    table.set_header(vec![header_cell("Resource type"), header_cell("Records")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let mut total = 0usize;
    for (resource_type, count) in &result.records {
        total += count;
        table.add_row(vec![Cell::new(resource_type), count_cell(*count)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total).add_attribute(Attribute::Bold),
    ]);
    eprintln!("{table}");

    if result.skipped.is_empty() {
        return;
    }
    let mut skipped = Table::new();
    skipped.set_header(vec![
        header_cell("Content"),
        header_cell("Section"),
        header_cell("Kind"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut skipped);
    for entry in &result.skipped {
        skipped.add_row(vec![
            Cell::new(&entry.content_id),
            Cell::new(entry.section_code.as_deref().unwrap_or("-")),
            Cell::new(entry.kind),
            Cell::new(&entry.error).fg(Color::Yellow),
        ]);
    }
    eprintln!("Skipped entries:");
    eprintln!("{skipped}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
