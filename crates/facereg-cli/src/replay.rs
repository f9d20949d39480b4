//! Offline session driver: feeds a JSON-lines file of events through an
//! in-process session and reports every state change and effect.

use anyhow::{Context, Result};
use facereg_core::{Effect, Event, FaceRegistry, Session, SessionState};
use serde::Serialize;
use std::io::{BufRead, Write};

/// One output record per replayed event.
#[derive(Debug, Serialize)]
struct ReplayRecord<'a> {
    line: usize,
    event: &'static str,
    state: &'a SessionState,
    effects: &'a [Effect],
}

#[derive(Debug, Default, PartialEq)]
pub struct ReplaySummary {
    pub events: usize,
    /// Events the session refused (state left unchanged).
    pub rejected: usize,
}

/// Replay every event in `input` through `session`, writing one JSON record
/// per event to `out`. Blank lines and lines starting with `#` are skipped.
pub fn replay<R: FaceRegistry>(
    session: &mut Session<R>,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("reading line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let event: Event = serde_json::from_str(trimmed)
            .with_context(|| format!("line {line_no}: invalid event"))?;
        let event_name = event.name();
        summary.events += 1;
        let effects = match session.handle(event) {
            Ok(effects) => effects,
            Err(err) => {
                tracing::warn!(line = line_no, error = %err, "event rejected");
                summary.rejected += 1;
                vec![Effect::ShowError(err.to_string())]
            }
        };

        let record = ReplayRecord {
            line: line_no,
            event: event_name,
            state: session.state(),
            effects: &effects,
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }

    tracing::debug!(events = summary.events, rejected = summary.rejected, "replay finished");
    Ok(summary)
}
