//! Process exit codes.
//! Library errors carry their own code via `FedmetaError::exit_code`; these cover the rest.

use fedmeta_core::FedmetaError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1; // Any error without a more specific code

/// Exit code for an error that reached `main`.
pub fn from_error(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<FedmetaError>()
        .map(FedmetaError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_library_error_keeps_its_code() {
        let err: anyhow::Error = FedmetaError::Verification {
            reason: "no signature entry verified".to_string(),
        }
        .into();
        assert_eq!(from_error(&err), 4);
    }

    #[test]
    fn test_context_does_not_hide_library_code() {
        let result: Result<(), FedmetaError> = Err(FedmetaError::Network {
            url: "https://md.example.org".to_string(),
            message: "timed out".to_string(),
        });
        let err = result.context("fetch failed").unwrap_err();
        assert_eq!(from_error(&err), 5);
    }

    #[test]
    fn test_other_errors_are_generic_failures() {
        assert_eq!(from_error(&anyhow::anyhow!("boom")), EXIT_FAILURE);
    }
}
