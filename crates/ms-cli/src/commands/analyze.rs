//! Analyze command: scores calendars and prints break plans.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use ms_core::{
    Analysis, AnalysisConfig, AnalysisRequest, Event, LoadScore, NormalizeOptions, analyze_events,
    normalize_calendar,
};
use rayon::prelude::*;

use super::util::{format_minutes, local_hm, read_calendar, subject_for, window_offset};

/// Options for the analyze command.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    pub date: Option<NaiveDate>,
    pub json: bool,
    pub previous_peak: Option<f64>,
}

/// Analyzes every file in parallel and writes the results in input order.
///
/// A file that fails is reported on stderr; the others still print. Returns
/// an error if any file failed.
pub fn run<W: Write>(
    writer: &mut W,
    files: &[PathBuf],
    options: &AnalyzeOptions,
    config: &AnalysisConfig,
) -> Result<()> {
    config.validate().context("invalid configuration")?;
    let previous_peak = options
        .previous_peak
        .map(LoadScore::new)
        .transpose()
        .context("invalid --previous-peak")?;

    let results: Vec<(&PathBuf, Result<Analysis>)> = files
        .par_iter()
        .map(|path| (path, analyze_file(path, options.date, previous_peak, config)))
        .collect();

    let mut analyses = Vec::new();
    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(analysis) => analyses.push(analysis),
            Err(e) => {
                failed += 1;
                tracing::warn!(path = ?path, error = %e, "analysis failed");
                eprintln!("error: {}: {e:#}", path.display());
            }
        }
    }

    if options.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&analyses)?)?;
    } else {
        for (i, analysis) in analyses.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            write!(writer, "{}", format_analysis(analysis))?;
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} calendar(s) could not be analyzed", files.len());
    }
    Ok(())
}

fn analyze_file(
    path: &Path,
    date: Option<NaiveDate>,
    previous_peak: Option<LoadScore>,
    config: &AnalysisConfig,
) -> Result<Analysis> {
    let subject = subject_for(path)?;
    let calendar = read_calendar(path)?;
    let options = NormalizeOptions {
        default_utc_offset_minutes: config.utc_offset_minutes,
    };
    let normalized = normalize_calendar(&calendar, &options)
        .with_context(|| format!("failed to normalize {}", path.display()))?;
    let date = date.unwrap_or_else(|| default_date(&normalized.events, config.utc_offset_minutes));
    tracing::debug!(
        path = ?path,
        %subject,
        %date,
        skipped = normalized.skipped.len(),
        "analyzing calendar"
    );

    let request = AnalysisRequest::for_day(subject, date, config)?.with_previous_peak(previous_peak);
    let mut analysis = analyze_events(&request, &normalized.events, config)
        .with_context(|| format!("failed to analyze {}", path.display()))?;
    analysis.skipped = normalized.skipped;
    Ok(analysis)
}

/// Local date of the earliest event, or today when there are none.
fn default_date(events: &[Event], utc_offset_minutes: i32) -> NaiveDate {
    let offset = Duration::minutes(i64::from(utc_offset_minutes));
    let earliest = events.first().map_or_else(Utc::now, Event::start);
    (earliest + offset).date_naive()
}

/// Formats the human-readable analysis output.
pub fn format_analysis(analysis: &Analysis) -> String {
    let mut output = String::new();
    let offset = window_offset(&analysis.window);
    let start = analysis.window.start().with_timezone(&offset);

    writeln!(output, "STRESS REPORT: {}", analysis.subject).unwrap();
    writeln!(
        output,
        "{}  {}-{} (UTC{offset})",
        start.format("%A, %b %-d, %Y"),
        local_hm(analysis.window.start(), &offset),
        local_hm(analysis.window.end(), &offset),
    )
    .unwrap();

    let summary = &analysis.summary;
    let meetings = &summary.meetings;
    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Stress level:  {}", summary.level).unwrap();
    writeln!(output, "Peak load:     {}", summary.peak_load).unwrap();
    writeln!(output, "Mean load:     {}", summary.mean_load).unwrap();
    if meetings.total == 0 {
        writeln!(output, "Meetings:      none").unwrap();
    } else {
        writeln!(
            output,
            "Meetings:      {} ({})",
            meetings.total,
            format_minutes(meetings.minutes)
        )
        .unwrap();
        writeln!(output, "Back-to-back:  {}", meetings.back_to_back).unwrap();
        writeln!(output, "Over lunch:    {}", meetings.lunch).unwrap();
        writeln!(output, "High-stress:   {}", meetings.high_stress).unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "BREAK PLAN").unwrap();
    writeln!(output, "──────────").unwrap();
    if analysis.plan.is_empty() {
        writeln!(output, "(no breaks fit this calendar)").unwrap();
    }
    for intervention in &analysis.plan {
        let rec = &intervention.recommendation;
        writeln!(
            output,
            "  {}  {:<12}{:>4}  {} ({}, load {})",
            local_hm(intervention.slot.start(), &offset),
            rec.activity.as_str(),
            format_minutes(i64::from(rec.duration_minutes)),
            rec.activity.suggestion(rec.duration_minutes),
            rec.rationale,
            rec.local_load,
        )
        .unwrap();
    }

    let tips = &summary.tips;
    if !summary.advice.is_empty() || !tips.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "ADVICE").unwrap();
        writeln!(output, "──────").unwrap();
        for line in summary.advice {
            writeln!(output, "  - {line}").unwrap();
        }
        for tip in tips {
            writeln!(output, "  - {tip}").unwrap();
        }
    }

    if !analysis.skipped.is_empty() {
        writeln!(output).unwrap();
        writeln!(
            output,
            "Skipped {} calendar record(s); run `mindsync normalize` for details.",
            analysis.skipped.len()
        )
        .unwrap();
    }

    output
}
