//! Shared utilities for CLI commands.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use ms_core::{AnalysisWindow, SubjectId};
use serde_json::Value;

/// Formats minutes as "Xh Ym" if >= 1 hour, "Xm" otherwise.
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let minutes = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// The window's local offset as a chrono timezone.
pub fn window_offset(window: &AnalysisWindow) -> FixedOffset {
    FixedOffset::east_opt(window.utc_offset_minutes() * 60).unwrap_or_else(|| Utc.fix())
}

/// Formats an instant as local `HH:MM`.
pub fn local_hm(instant: DateTime<Utc>, offset: &FixedOffset) -> String {
    instant.with_timezone(offset).format("%H:%M").to_string()
}

/// Subject ID for a calendar file: its name without extension.
pub fn subject_for(path: &Path) -> anyhow::Result<SubjectId> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    SubjectId::new(stem).with_context(|| format!("cannot derive a subject from {}", path.display()))
}

/// Reads and parses a calendar JSON document.
pub fn read_calendar(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {} as JSON", path.display()))
}
