//! Status command implementation
//!
//! Active claims with their age, recent publications, timeline progress and
//! summary counts.

use std::path::PathBuf;

use editorial_core::{
    timeline::{self, SeriesProgress},
    ClaimCoordinator, StatusReport,
};
use serde::Serialize;

use crate::{
    output::{print_json, OutputFormat},
    Result,
};

/// Status command options
#[derive(Debug, Clone)]
pub struct StatusOptions {
    /// Location of `timeline.json`
    pub timeline_path: PathBuf,
    pub format: OutputFormat,
}

/// Everything the status command shows
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    #[serde(flatten)]
    pub report: StatusReport,
    pub timeline: Vec<SeriesProgress>,
}

/// Run the status command
///
/// # Errors
///
/// Returns an error if the claim store, ledger or registry cannot be read.
pub fn run(options: &StatusOptions, coordinator: &ClaimCoordinator) -> Result<()> {
    let view = StatusView {
        report: coordinator.status()?,
        timeline: timeline::latest_days(&timeline::load(&options.timeline_path)),
    };

    if options.format.is_json() {
        return print_json(&view);
    }

    print!("{}", render(&view));
    Ok(())
}

/// Human-readable report
#[must_use]
pub fn render(view: &StatusView) -> String {
    let report = &view.report;
    let mut out = String::from("📊 Editorial Status\n\n");

    if !report.active.is_empty() {
        out.push_str("🔥 Active Claims:\n");
        for active in &report.active {
            let lease = &active.lease;
            out.push_str(&format!(
                "   {}: {} ({} on {}) - {}m ago\n",
                lease.agent, lease.content_id, lease.action, lease.channel, active.age_minutes
            ));
        }
        out.push('\n');
    }

    if !report.recent.is_empty() {
        out.push_str(&format!(
            "📰 Recent Publications ({}h):\n",
            report.recent_window_hours
        ));
        for entry in &report.recent {
            out.push_str(&format!(
                "   {} | {:<10} | {:<8} | {}\n",
                entry.published_at.format("%Y-%m-%d"),
                entry.channel,
                entry.author,
                entry.title
            ));
        }
        out.push('\n');
    }

    if !view.timeline.is_empty() {
        out.push_str("📅 Timeline Status:\n");
        for progress in &view.timeline {
            out.push_str(&format!(
                "   {}: Day {} ({}) - \"{}\"\n",
                progress.series, progress.day, progress.date, progress.title
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "📊 Registry: {} total entries\n",
        report.registry_total
    ));
    out.push_str(&format!("📋 Ledger: {} publications\n", report.ledger_total));
    out.push_str(&format!("🔥 Claims: {} active\n", report.active_total));
    out
}
