//! Result type alias for authenticator operations.

use super::idkey_error::IdKeyError;

/// Type alias for Results using IdKeyError.
pub type IdKeyResult<T> = Result<T, IdKeyError>;
