//! Vertical card display for a single looked-up book.
//!
//! Renders the fields of one service as a grouped card: bibliographic details
//! and metadata first, then the description wrapped to a readable width.

use std::fmt::Write;

use bookfill_core::{Fields, SearchKey, ServiceSchema};

const LABEL_WIDTH: usize = 18;
const WRAP_CHARS: usize = 60;

// ── Public API ──

/// Render `fields` as a card headed by the title (or the search key).
pub fn render_card(key: &SearchKey, fields: &Fields, schema: &ServiceSchema) -> String {
    let mut out = String::new();
    let heading = schema
        .title_column
        .and_then(|c| fields.get(c))
        .unwrap_or(key.as_str());

    let _ = writeln!(out, "=== {heading} ===");
    let _ = writeln!(out, "({} lookup for \"{key}\")", schema.service);
    out.push('\n');

    render_section(&mut out, "Book", schema.detail_columns, fields);

    let metadata: Vec<&str> = schema
        .columns
        .iter()
        .copied()
        .filter(|c| *c != schema.description_column)
        .collect();
    render_section(&mut out, "Metadata", &metadata, fields);

    let extra: Vec<&str> = fields
        .names()
        .filter(|n| !schema.is_enrichment_column(n) && !schema.is_detail_column(n))
        .collect();
    render_section(&mut out, "Other", &extra, fields);

    if let Some(description) = fields.get(schema.description_column) {
        let _ = writeln!(out, "Description");
        for line in wrap(description, WRAP_CHARS) {
            let _ = writeln!(out, "  {line}");
        }
        out.push('\n');
    }
    out
}

// ── Section rendering ──

fn render_section(out: &mut String, header: &str, cols: &[&str], fields: &Fields) {
    let present: Vec<(&str, &str)> = cols
        .iter()
        .filter_map(|&c| fields.get(c).map(|v| (c, v)))
        .collect();
    if present.is_empty() {
        return;
    }

    let _ = writeln!(out, "{header}");
    for (name, value) in present {
        let _ = writeln!(out, "  {name:<LABEL_WIDTH$} {value}");
    }
    out.push('\n');
}

/// Split on character count; descriptions rarely contain spaces worth breaking on.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width)
        .map(|line| line.iter().collect::<String>().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
