//! Result type alias for deal-etl

use super::errors::EtlError;

/// Result type alias for deal-etl operations
///
/// # Examples
///
/// ```
/// use deal_etl::domain::result::Result;
/// use deal_etl::domain::errors::EtlError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(EtlError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, EtlError>;
