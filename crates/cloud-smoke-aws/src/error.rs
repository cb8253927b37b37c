// crates/cloud-smoke-aws/src/error.rs
// ============================================================================
// Module: SDK Error Mapping
// Description: Converts AWS SDK errors into ApiError records.
// Purpose: Keep service error codes available to tester cleanup logic.
// Dependencies: aws-smithy-types, cloud-smoke-core
// ============================================================================

use std::error::Error as StdError;

use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use cloud_smoke_core::ApiError;

/// Captures an SDK error with its service code and full cause chain.
pub(crate) fn api_error<E>(operation: &'static str, err: E) -> ApiError
where
    E: ProvideErrorMetadata + StdError + 'static,
{
    let code = err.code().map(str::to_string);
    ApiError::new(operation, DisplayErrorContext(&err).to_string()).with_code(code)
}

/// Builds an error for a response missing a field the sequence depends on.
pub(crate) fn missing_field(operation: &'static str, field: &str) -> ApiError {
    ApiError::new(operation, format!("response is missing {field}"))
}
