//! Token authentication for the generic webhook family.

mod error;

pub use error::AuthError;

/// Check the `Authorization` header against the configured token.
///
/// `Bearer ` and `Token ` scheme prefixes are stripped before comparison.
/// The comparison is plain string equality: this is an access token, not a
/// cryptographic signature, so constant-time handling is not required.
/// With no token configured, auth is disabled and every request passes.
pub fn verify_token(auth_header: Option<&str>, expected: Option<&str>) -> Result<(), AuthError> {
    let expected = match expected {
        Some(token) if !token.is_empty() => token,
        _ => return Ok(()),
    };

    let header = match auth_header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingToken),
    };

    let provided = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("Token "))
        .unwrap_or(header);

    if provided == expected {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}
