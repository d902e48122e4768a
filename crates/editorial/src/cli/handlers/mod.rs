//! Argument extraction and dispatch to command implementations

use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;
use editorial_core::{load_config, timeline, ClaimCoordinator, Config};

use super::{CHECK_USAGE, CLAIM_USAGE, PUBLISH_USAGE, RELEASE_USAGE};
use crate::{
    commands::{
        check::{self, CheckOptions},
        claim::{self, ClaimOptions},
        publish::{self, PublishOptions},
        release::{self, ReleaseOptions},
        status::{self, StatusOptions},
    },
    output::OutputFormat,
    Error,
};

/// Agent name used when nothing else identifies the caller
pub const UNKNOWN_AGENT: &str = "unknown";

/// Run the selected subcommand, returning the process exit code
///
/// # Errors
///
/// Returns the command's error; see [`crate::error::exit_code_of`] for the
/// exit code it maps to.
pub fn dispatch(matches: &ArgMatches) -> Result<i32> {
    let Some((name, sub)) = matches.subcommand() else {
        anyhow::bail!("Unknown command. Run 'editorial --help' for usage.");
    };

    let agent = resolve_agent(sub.get_one::<String>("agent").map(String::as_str), |key| {
        std::env::var(key).ok()
    });
    let format = OutputFormat::from_json_flag(sub.get_flag("json"));

    match name {
        "claim" => {
            let options = ClaimOptions {
                content_id: required(sub, "content_id", CLAIM_USAGE)?,
                action: required(sub, "action", CLAIM_USAGE)?,
                channel: required(sub, "channel", CLAIM_USAGE)?,
                agent,
                format,
            };
            claim::run(&options, &open(sub)?.1)?;
            Ok(0)
        }
        "release" => {
            let options = ReleaseOptions {
                content_id: required(sub, "content_id", RELEASE_USAGE)?,
                agent,
                format,
            };
            release::run(&options, &open(sub)?.1)?;
            Ok(0)
        }
        "publish" => {
            let options = PublishOptions {
                content_id: required(sub, "content_id", PUBLISH_USAGE)?,
                channel: required(sub, "channel", PUBLISH_USAGE)?,
                url: required(sub, "url", PUBLISH_USAGE)?,
                title: optional(sub, "title"),
                agent,
                format,
            };
            publish::run(&options, &open(sub)?.1)?;
            Ok(0)
        }
        "check" => {
            let options = CheckOptions {
                content_id: required(sub, "content_id", CHECK_USAGE)?,
                channel: required(sub, "channel", CHECK_USAGE)?,
                agent,
                format,
            };
            Ok(check::run(&options, &open(sub)?.1)?)
        }
        "status" => {
            let (config, coordinator) = open(sub)?;
            let options = StatusOptions {
                timeline_path: timeline::timeline_path(&config.editorial_dir),
                format,
            };
            status::run(&options, &coordinator)?;
            Ok(0)
        }
        other => anyhow::bail!("Unknown command '{other}'. Run 'editorial --help' for usage."),
    }
}

/// Loads configuration, applies `--dir`, and opens the coordinator on it
fn open(matches: &ArgMatches) -> Result<(Config, ClaimCoordinator)> {
    let mut config = load_config()?;
    if let Some(dir) = matches.get_one::<String>("dir") {
        config.editorial_dir = PathBuf::from(dir);
    }
    tracing::debug!(dir = %config.editorial_dir.display(), "Opening editorial directory");
    let coordinator = ClaimCoordinator::open(&config)?;
    Ok((config, coordinator))
}

/// Agent identity: `--agent`, then `OPENCLAW_AGENT`, then `USER`, then
/// [`UNKNOWN_AGENT`]. Blank values are skipped.
pub fn resolve_agent(flag: Option<&str>, env: impl Fn(&str) -> Option<String>) -> String {
    flag.map(str::to_string)
        .into_iter()
        .chain(["OPENCLAW_AGENT", "USER"].into_iter().filter_map(env))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_AGENT.to_string())
}

fn required(
    matches: &ArgMatches,
    name: &'static str,
    usage: &'static str,
) -> std::result::Result<String, Error> {
    optional(matches, name).ok_or(Error::Usage {
        usage,
        source: editorial_core::Error::MissingArgument(name),
    })
}

fn optional(matches: &ArgMatches, name: &str) -> Option<String> {
    matches
        .get_one::<String>(name)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}
