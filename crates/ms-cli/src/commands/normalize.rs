//! Normalize command: prints provider events in normalized form.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ms_core::{AnalysisConfig, NormalizeOptions, normalize_calendar};

use super::util::read_calendar;

/// Writes one JSON line per event to `out` and one per skipped record to `err`.
pub fn run<W: Write, E: Write>(
    out: &mut W,
    err: &mut E,
    path: &Path,
    config: &AnalysisConfig,
) -> Result<()> {
    let calendar = read_calendar(path)?;
    let options = NormalizeOptions {
        default_utc_offset_minutes: config.utc_offset_minutes,
    };
    let normalized = normalize_calendar(&calendar, &options)
        .with_context(|| format!("failed to normalize {}", path.display()))?;

    for event in &normalized.events {
        writeln!(out, "{}", serde_json::to_string(event)?)?;
    }
    for skipped in &normalized.skipped {
        writeln!(err, "{}", serde_json::to_string(skipped)?)?;
    }

    tracing::debug!(
        path = ?path,
        events = normalized.events.len(),
        skipped = normalized.skipped.len(),
        "normalized calendar"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use tempfile::NamedTempFile;

    #[test]
    fn test_normalize_google_export() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"items": [
                {{"id": "g1", "summary": "Weekly sync", "status": "confirmed",
                  "start": {{"dateTime": "2025-01-27T10:00:00+01:00"}},
                  "end": {{"dateTime": "2025-01-27T10:30:00+01:00"}},
                  "attendees": [{{"email": "a@example.com"}}, {{"email": "b@example.com"}}]}},
                {{"id": "g2", "summary": "Offsite", "start": {{"date": "2025-01-27"}},
                  "end": {{"date": "2025-01-28"}}}}
            ]}}"#
        )
        .unwrap();

        let mut out = Vec::new();
        let mut err = Vec::new();
        run(&mut out, &mut err, file.path(), &AnalysisConfig::default()).unwrap();

        assert_snapshot!(String::from_utf8(out).unwrap(), @r#"{"id":"g1","title":"Weekly sync","start":"2025-01-27T09:00:00Z","end":"2025-01-27T09:30:00Z","category":"meeting","attendee_count":2,"importance":"normal"}"#);
        assert_snapshot!(String::from_utf8(err).unwrap(), @r#"{"index":1,"provider":"google","id":"g2","reason":"all_day"}"#);
    }

    #[test]
    fn test_normalize_rejects_unknown_format() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"rows": []}}"#).unwrap();

        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = run(&mut out, &mut err, file.path(), &AnalysisConfig::default());
        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
