// 🖨️ Report Formatters - packing list, reserve report, claim stubs
// Pure render functions return Strings; write_* helpers put them on disk.

use crate::engine::ReserveLine;
use crate::model::Household;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

const PAGE_STYLE: &str = "body{font-family: Arial, sans-serif; background: linear-gradient(to bottom, #47BECE, #F3F3EF); margin: 0; padding: 20px;}
h1 {color: #21AEC0; text-align: center; letter-spacing: 2px;}
table {width: 100%; border-collapse: collapse; background-color: #fff; box-shadow: 0 4px 8px rgba(0, 0, 0, 0.1);}
th {background: #21aec0; color: #fff; padding: 12px; text-align: left; border: 2px solid #fff;}
td {padding: 10px; border-bottom: 1px solid #ddd;}
tr:hover {background-color: #f1f1f1;}
.priority {color: #d32f2f; font-weight: bold; font-size: 12px;}
.allocation {color: #555; font-size: 14px;}";

const STUB_STYLE: &str = "body { font-family: Arial, sans-serif; background: #f0f0f0; }
.ticket { background: #fff; width: 300px; border: 2px dashed #333; padding: 15px; margin: 10px; display: inline-block; vertical-align: top; }
.header { font-weight: bold; font-size: 16px; border-bottom: 2px solid black; margin-bottom: 10px; }
.item { font-size: 14px; padding: 2px 0; }
.footer { margin-top: 10px; font-size: 10px; color: grey; text-align: right; }
.prio { color: red; font-weight: bold; font-size: 11px; }";

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// ============================================================================
// PACKING LIST
// ============================================================================

pub fn render_packing_list(households: &[Household]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html><head><meta charset='UTF-8'>\n");
    html.push_str("<title>EquiEat - Packing List</title>\n<style>\n");
    html.push_str(PAGE_STYLE);
    html.push_str("\n</style></head><body>\n<h1>EquiEat - Final Packing List</h1>\n");
    html.push_str("<table><tr><th>Family ID</th><th>Head of Family</th><th>Size</th><th>Priorities</th><th>Ration Allocation</th></tr>\n");

    for h in households {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class='priority'>{}</td><td class='allocation'>{}</td></tr>",
            escape_html(&h.id),
            escape_html(&h.head_name),
            h.member_count(),
            escape_html(&h.attribute_labels()),
            escape_html(&h.received().packing_list()),
        );
    }

    html.push_str("</table>\n</body></html>\n");
    html
}

// ============================================================================
// RESERVE REPORT
// ============================================================================

pub fn render_reserve_report(lines: &[ReserveLine], generated_at: DateTime<Local>) -> String {
    let rule = "-".repeat(58);
    let mut text = String::new();
    let _ = writeln!(text, "=== RESERVE & MEDICAL REPORT ===");
    let _ = writeln!(text, "Date: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(text, "{}", rule);
    let _ = writeln!(text, "{:<20} | {:<18} | {:<15}", "ITEM", "CATEGORY", "RESERVE QTY");
    let _ = writeln!(text, "{}", rule);
    for line in lines {
        let _ = writeln!(
            text,
            "{:<20} | {:<18} | {:<15}",
            line.name,
            line.category.as_str(),
            line.quantity
        );
    }
    text
}

// ============================================================================
// CLAIM STUBS
// ============================================================================

/// One printable ticket per household that actually receives something
pub fn render_claim_stubs(households: &[Household]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html><head><meta charset='UTF-8'><style>\n");
    html.push_str(STUB_STYLE);
    html.push_str("\n</style></head><body>\n<h2>Relief Distribution Claim Stubs</h2>\n");

    for h in households.iter().filter(|h| !h.received().is_empty()) {
        html.push_str("<div class='ticket'>");
        let _ = write!(html, "<div class='header'>FAMILY: {}</div>", escape_html(&h.head_name));
        let _ = write!(html, "<div><strong>ID:</strong> {}</div>", escape_html(&h.id));
        let _ = write!(html, "<div><strong>Members:</strong> {}</div>", h.member_count());
        if !h.attributes.is_empty() {
            let _ = write!(
                html,
                "<div class='prio'>NOTES: {}</div>",
                escape_html(&h.attribute_labels())
            );
        }
        html.push_str("<hr>");
        for (item, qty) in h.received().iter() {
            let _ = write!(
                html,
                "<div class='item'>&#9744; {} pcs of {}</div>",
                qty,
                escape_html(item)
            );
        }
        html.push_str("<div class='footer'>EquiEat Distribution</div></div>\n");
    }

    html.push_str("</body></html>\n");
    html
}

// ============================================================================
// WRITERS
// ============================================================================

pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(())
}
