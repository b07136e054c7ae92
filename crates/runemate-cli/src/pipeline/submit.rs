//! Submit stage: upload the bundled archive for review

use runemate_config::BuildLayout;
use runemate_logger as logger;

use super::SubmissionSettings;
use crate::errors::PublishError;
use crate::submission::SubmissionReceipt;

pub const SUCCESS_MESSAGE: &str =
    "Submission successful - you will receive a forum message when your submission has been reviewed.";

pub fn run(
    layout: &BuildLayout,
    project_name: &str,
    settings: &SubmissionSettings,
) -> Result<SubmissionReceipt, PublishError> {
    logger::warn("Submission is an incubating feature");
    logger::lifecycle(&format!("Submitting project '{}' for review", project_name));

    let Some(credential) = settings.credential.as_deref() else {
        return Err(PublishError::MissingCredential);
    };

    logger::spinner_start(&format!("Uploading to {}", settings.client.url()));
    match settings.client.submit(&layout.archive_path(), credential) {
        Ok(receipt) => {
            logger::spinner_success(SUCCESS_MESSAGE);
            Ok(receipt)
        }
        Err(e) => {
            logger::spinner_error("Submission failed");
            Err(e.into())
        }
    }
}
