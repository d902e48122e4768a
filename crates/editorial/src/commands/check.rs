//! Check command implementation

use editorial_core::{CheckOutcome, ClaimCoordinator};

use super::{iso, EXIT_CONFLICT};
use crate::{
    output::{print_json, OutputFormat},
    Result,
};

/// Check command options
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub content_id: String,
    pub channel: String,
    pub agent: String,
    pub format: OutputFormat,
}

/// Run the check command, returning the process exit code.
///
/// "Already published" and "clear" exit 0; a conflicting claim exits with
/// [`EXIT_CONFLICT`].
///
/// # Errors
///
/// Returns an error if an input is blank or the store or ledger cannot be read.
pub fn run(options: &CheckOptions, coordinator: &ClaimCoordinator) -> Result<i32> {
    let outcome = coordinator.check(&options.content_id, &options.channel, &options.agent)?;
    let code = exit_code(&outcome);

    if options.format.is_json() {
        print_json(&outcome)?;
        return Ok(code);
    }

    match &outcome {
        CheckOutcome::AlreadyPublished { entry } => {
            println!(
                "ℹ️  Already published: {} on {}",
                entry.content_id, entry.channel
            );
            println!("   Published at: {}", iso(entry.published_at));
            println!("   URL: {}", entry.url);
        }
        CheckOutcome::Conflict { holder } => {
            println!(
                "❌ CONFLICT: {} already claimed {} on {}",
                holder.agent, holder.content_id, holder.channel
            );
            println!("   Claimed at: {}", iso(holder.claimed_at));
        }
        CheckOutcome::Clear {
            content_id,
            channel,
        } => println!("✓ Safe to publish: {content_id} on {channel}"),
    }

    Ok(code)
}

const fn exit_code(outcome: &CheckOutcome) -> i32 {
    match outcome {
        CheckOutcome::Conflict { .. } => EXIT_CONFLICT,
        CheckOutcome::AlreadyPublished { .. } | CheckOutcome::Clear { .. } => 0,
    }
}
