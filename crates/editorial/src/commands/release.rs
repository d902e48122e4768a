//! Release command implementation

use editorial_core::ClaimCoordinator;

use crate::{
    output::{print_json, OutputFormat},
    Result,
};

/// Release command options
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    pub content_id: String,
    pub agent: String,
    pub format: OutputFormat,
}

/// Run the release command. Releasing a claim that does not exist succeeds.
///
/// # Errors
///
/// Returns an error if an input is blank or the claim file cannot be moved.
pub fn run(options: &ReleaseOptions, coordinator: &ClaimCoordinator) -> Result<()> {
    let released = coordinator.release(&options.content_id, &options.agent)?;

    if options.format.is_json() {
        return print_json(&released);
    }

    println!("✓ Released: {}", released.content_id);
    Ok(())
}
