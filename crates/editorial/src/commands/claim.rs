//! Claim command implementation

use editorial_core::ClaimCoordinator;

use crate::{
    output::{print_json, OutputFormat},
    Result,
};

/// Claim command options
#[derive(Debug, Clone)]
pub struct ClaimOptions {
    pub content_id: String,
    /// What the agent is doing ("write", "review", ...)
    pub action: String,
    pub channel: String,
    pub agent: String,
    pub format: OutputFormat,
}

/// Run the claim command
///
/// # Errors
///
/// Returns an error if:
/// - Any input is blank
/// - Another agent holds an alive claim on the same content and channel
/// - The claim cannot be written
pub fn run(options: &ClaimOptions, coordinator: &ClaimCoordinator) -> Result<()> {
    let claimed = coordinator.acquire(
        &options.content_id,
        &options.action,
        &options.channel,
        &options.agent,
    )?;

    if options.format.is_json() {
        return print_json(&claimed);
    }

    println!(
        "✓ Claimed: {} ({} on {})",
        claimed.lease.content_id, claimed.lease.action, claimed.lease.channel
    );
    Ok(())
}
