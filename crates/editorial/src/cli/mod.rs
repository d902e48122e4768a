//! Command-line definition
//!
//! Positional arguments are optional at the parser level so a missing one
//! is reported with the command's usage line and exit code 1.

pub mod handlers;

use clap::{Arg, ArgAction, Command};

pub const CLAIM_USAGE: &str = "editorial claim <content-id> <action> <channel>";
pub const RELEASE_USAGE: &str = "editorial release <content-id>";
pub const PUBLISH_USAGE: &str = "editorial publish <content-id> <channel> <url> [title]";
pub const CHECK_USAGE: &str = "editorial check <content-id> <channel>";

pub fn build_cli() -> Command {
    Command::new("editorial")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Claim, release, check and publish content across channels")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("dir")
                .long("dir")
                .global(true)
                .value_name("PATH")
                .help("Editorial directory (default: ./editorial)"),
        )
        .arg(
            Arg::new("agent")
                .long("agent")
                .global(true)
                .value_name("NAME")
                .help("Agent identity (default: $OPENCLAW_AGENT, then $USER)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .subcommand(cmd_claim())
        .subcommand(cmd_release())
        .subcommand(cmd_publish())
        .subcommand(cmd_check())
        .subcommand(cmd_status())
}

fn positional(id: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(id).value_name(value_name).help(help)
}

fn cmd_claim() -> Command {
    Command::new("claim")
        .about("Claim content for an action on a channel")
        .override_usage(CLAIM_USAGE)
        .arg(positional("content_id", "CONTENT_ID", "Content to claim"))
        .arg(positional("action", "ACTION", "What you are doing (write, review, ...)"))
        .arg(positional("channel", "CHANNEL", "Target channel"))
}

fn cmd_release() -> Command {
    Command::new("release")
        .about("Release your claim on content")
        .override_usage(RELEASE_USAGE)
        .arg(positional("content_id", "CONTENT_ID", "Content to release"))
}

fn cmd_publish() -> Command {
    Command::new("publish")
        .about("Record a publication and release your claim")
        .override_usage(PUBLISH_USAGE)
        .arg(positional("content_id", "CONTENT_ID", "Published content"))
        .arg(positional("channel", "CHANNEL", "Channel it was published on"))
        .arg(positional("url", "URL", "Where it was published"))
        .arg(positional("title", "TITLE", "Title (defaults to the content id)"))
}

fn cmd_check() -> Command {
    Command::new("check")
        .about("Check whether content is safe to publish on a channel")
        .override_usage(CHECK_USAGE)
        .arg(positional("content_id", "CONTENT_ID", "Content to check"))
        .arg(positional("channel", "CHANNEL", "Target channel"))
}

fn cmd_status() -> Command {
    Command::new("status").about("Show active claims, recent publications and timeline")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from([
                "editorial", "claim", "post-1", "write", "twitter", "--agent", "a", "--json",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "claim");
        assert_eq!(sub.get_one::<String>("agent").map(String::as_str), Some("a"));
        assert!(sub.get_flag("json"));
    }

    #[test]
    fn test_missing_positionals_parse() {
        let matches = build_cli()
            .try_get_matches_from(["editorial", "publish", "post-1"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert!(sub.get_one::<String>("url").is_none());
    }
}
