//! Publish command implementation
//!
//! Records a publication in the ledger and registry, then releases the
//! publisher's own claim. Other agents' claims never block publishing.

use editorial_core::ClaimCoordinator;

use crate::{
    output::{print_json, OutputFormat},
    Result,
};

/// Publish command options
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub content_id: String,
    pub channel: String,
    pub url: String,
    /// Defaults to the content id
    pub title: Option<String>,
    pub agent: String,
    pub format: OutputFormat,
}

/// Run the publish command
///
/// # Errors
///
/// Returns an error if an input is blank or the ledger, registry or claim
/// store cannot be updated.
pub fn run(options: &PublishOptions, coordinator: &ClaimCoordinator) -> Result<()> {
    let published = coordinator.publish_and_release(
        &options.content_id,
        &options.channel,
        &options.url,
        options.title.as_deref(),
        &options.agent,
    )?;

    if options.format.is_json() {
        return print_json(&published);
    }

    println!(
        "✓ Published: {} on {}",
        published.entry.content_id, published.entry.channel
    );
    println!("  URL: {}", published.entry.url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use editorial_core::Ledger;

    use super::*;
    use crate::commands::test_support;

    #[test]
    fn test_publish_records_title_default() {
        let (dir, coordinator) = test_support::coordinator();
        let options = PublishOptions {
            content_id: "post-1".to_string(),
            channel: "blog".to_string(),
            url: "https://example.com/post-1".to_string(),
            title: None,
            agent: "a".to_string(),
            format: OutputFormat::Human,
        };

        run(&options, &coordinator).unwrap();

        let entries = editorial_core::JsonLedger::in_editorial_dir(dir.path())
            .entries()
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "post-1");
        assert_eq!(entries[0].author, "a");
    }
}
