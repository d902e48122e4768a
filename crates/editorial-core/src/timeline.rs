//! Editorial timeline (optional `timeline.json`)
//!
//! ```json
//! { "series": { "launch-week": { "days": [ { "day": 1, "date": "2025-06-01", "title": "Kickoff" } ] } } }
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::json_file;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub series: BTreeMap<String, Series>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub days: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    #[serde(default)]
    pub day: serde_json::Value,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
}

/// Latest day of one series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesProgress {
    pub series: String,
    pub day: String,
    pub date: String,
    pub title: String,
}

/// Path of the timeline inside an editorial directory
#[must_use]
pub fn timeline_path(editorial_dir: &Path) -> PathBuf {
    editorial_dir.join("timeline.json")
}

/// Load the timeline; absent or unreadable files yield an empty timeline
#[must_use]
pub fn load(path: &Path) -> Timeline {
    json_file::read::<Timeline>(path)
        .unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable timeline: {e}");
            None
        })
        .unwrap_or_default()
}

/// The last day of every series with at least one day, in series name order
#[must_use]
pub fn latest_days(timeline: &Timeline) -> Vec<SeriesProgress> {
    timeline
        .series
        .iter()
        .filter_map(|(name, series)| {
            series.days.last().map(|last| SeriesProgress {
                series: name.clone(),
                day: match &last.day {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
                date: last.date.clone(),
                title: last.title.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_latest_day_per_series() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = timeline_path(dir.path());
        fs::write(
            &path,
            r#"{"series": {
                "zeta": {"days": [{"day": 1, "date": "2025-06-01", "title": "Start"},
                                  {"day": 2, "date": "2025-06-02", "title": "Follow-up"}]},
                "alpha": {"days": [{"day": "intro", "date": "2025-05-30", "title": "Teaser"}]},
                "empty": {"days": []}
            }}"#,
        )?;

        let progress = latest_days(&load(&path));

        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].series, "alpha");
        assert_eq!(progress[0].day, "intro");
        assert_eq!(progress[1].series, "zeta");
        assert_eq!(progress[1].day, "2");
        assert_eq!(progress[1].title, "Follow-up");
        Ok(())
    }

    #[test]
    fn test_missing_or_corrupt_timeline_is_empty() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = timeline_path(dir.path());
        assert!(latest_days(&load(&path)).is_empty());

        fs::write(&path, "not json")?;
        assert!(latest_days(&load(&path)).is_empty());
        Ok(())
    }
}
