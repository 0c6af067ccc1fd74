use tabled::{Table, Tabled, builder::Builder, settings::Style};

/// Table of preformatted cells with a header row.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

pub fn render_records<T: Tabled>(records: &[T]) -> String {
    let mut table = Table::new(records);
    table.with(Style::modern_rounded());
    table.to_string()
}

pub fn fmt_value(x: f64) -> String {
    format!("{:.6}", x)
}

pub fn fmt_error(x: f64) -> String {
    format!("{:.3e}", x)
}
