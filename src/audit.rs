// 📝 Audit Log - an HTML trail of every operator action
//
// The log is a standalone HTML page. New rows are inserted just before a
// marker comment, so the file stays a valid document after every write.

use crate::reports::escape_html;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const ENTRY_MARKER: &str = "<!-- LOG_ENTRIES -->";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    SystemStartup,
    DataLoad,
    InventoryAdd,
    InventoryRemove,
    DistributionRun,
    Export,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::SystemStartup => "SYSTEM_STARTUP",
            AuditAction::DataLoad => "DATA_LOAD",
            AuditAction::InventoryAdd => "INVENTORY_ADD",
            AuditAction::InventoryRemove => "INVENTORY_REMOVE",
            AuditAction::DistributionRun => "DISTRIBUTION_RUN",
            AuditAction::Export => "EXPORT",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn template() -> String {
    format!(
        "<!DOCTYPE html>
<html><head><title>EquiEat - Audit Log</title>
<meta charset='UTF-8'>
<style>
body {{font-family: Arial, sans-serif; background: #F3F3EF; padding: 20px;}}
h1 {{color: #21AEC0; text-align: center; letter-spacing: 2px;}}
table {{width: 100%; border-collapse: collapse; background-color: #fff;}}
th {{background: #21aec0; color: #fff; padding: 12px; text-align: left;}}
td {{padding: 10px; border-bottom: 1px solid #ddd;}}
.timestamp {{color: #666; font-size: 14px;}}
.action {{color: #333; font-weight: bold;}}
.details {{color: #555; font-size: 14px;}}
.SYSTEM_STARTUP {{color: #4CAF50;}}
.DATA_LOAD {{color: #2196F3;}}
.INVENTORY_ADD {{color: #FF9800;}}
.INVENTORY_REMOVE {{color: #795548;}}
.DISTRIBUTION_RUN {{color: #9C27B0;}}
.EXPORT {{color: #E91E63;}}
</style></head><body>
<h1>EquiEat Audit Log</h1>
<table><tr><th>Timestamp</th><th>Action</th><th>Details</th></tr>
{}
</table>
</body></html>
",
        ENTRY_MARKER
    )
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AuditLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry stamped with the current local time
    pub fn record(&self, action: AuditAction, details: &str) -> Result<()> {
        self.record_at(action, details, Local::now().naive_local())
    }

    pub fn record_at(&self, action: AuditAction, details: &str, at: NaiveDateTime) -> Result<()> {
        let content = if self.path.exists() {
            fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read audit log: {}", self.path.display()))?
        } else {
            template()
        };

        let entry = format!(
            "<tr><td class='timestamp'>{}</td><td class='action {}'>{}</td><td class='details'>{}</td></tr>\n{}",
            at.format("%Y-%m-%d %H:%M:%S"),
            action.as_str(),
            action.as_str(),
            escape_html(details),
            ENTRY_MARKER
        );

        // A hand-edited log without the marker still gets the entry appended
        let updated = if content.contains(ENTRY_MARKER) {
            content.replacen(ENTRY_MARKER, &entry, 1)
        } else {
            format!("{}\n{}", content, entry)
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&self.path, updated)
            .with_context(|| format!("Failed to write audit log: {}", self.path.display()))
    }

    /// Record, logging a warning instead of returning the error
    pub fn record_or_warn(&self, action: AuditAction, details: &str) {
        if let Err(e) = self.record(action, details) {
            warn!(action = %action, error = %e, "audit log write failed");
        }
    }
}
