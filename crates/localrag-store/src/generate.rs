use std::time::Duration;

use localrag_core::error::{Error, Result};
use localrag_core::traits::Generator;

/// Call `generator`, bounding the wait by `timeout` when given.
///
/// Any failure, including an elapsed timeout, surfaces as
/// `Error::GenerationUnavailable`. No retry is attempted.
pub async fn generate_with_timeout(
    generator: &dyn Generator,
    prompt: &str,
    max_output_length: usize,
    timeout: Option<Duration>,
) -> Result<String> {
    let call = generator.generate(prompt, max_output_length);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| {
                Error::GenerationUnavailable(format!("generation timed out after {limit:?}"))
            })?,
        None => call.await,
    };
    result.map_err(|e| {
        tracing::warn!(error = %e, "generation failed");
        match e {
            Error::GenerationUnavailable(_) => e,
            other => Error::GenerationUnavailable(other.to_string()),
        }
    })
}
