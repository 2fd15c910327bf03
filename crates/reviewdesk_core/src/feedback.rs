//! User-facing failure messages.
//!
//! Every failure that reaches a screen is logged in full and shown as a
//! short message. Only form validation and credential errors keep specific
//! wording; everything else collapses to [`GENERIC_FAILURE_MESSAGE`].

use crate::auth::AuthError;
use crate::db::DbError;
use crate::repo::RepoError;
use crate::service::dashboard_service::DashboardError;
use crate::service::location_service::LocationServiceError;
use crate::service::sync_service::SyncError;
use log::error;
use std::fmt::Display;

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";
pub const SESSION_ENDED_MESSAGE: &str = "Your session has ended. Please sign in again.";
pub const ACCESS_DENIED_MESSAGE: &str = "You do not have access to this action.";

/// Maps an error to the text shown to the user.
pub trait UserMessage: Display {
    fn user_message(&self) -> String {
        GENERIC_FAILURE_MESSAGE.to_string()
    }
}

impl UserMessage for DbError {}

impl UserMessage for RepoError {
    fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied { .. } => ACCESS_DENIED_MESSAGE.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl UserMessage for AuthError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail | Self::WeakPassword { .. } | Self::EmailTaken => self.to_string(),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::SessionNotFound | Self::SessionExpired => SESSION_ENDED_MESSAGE.to_string(),
            Self::Db(_) | Self::InvalidData(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl UserMessage for LocationServiceError {
    fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::PlaceIdTaken(_) => self.to_string(),
            Self::LocationNotFound(_) => "Location not found.".to_string(),
            Self::Repo(err) => err.user_message(),
        }
    }
}

impl UserMessage for DashboardError {
    fn user_message(&self) -> String {
        match self {
            Self::LocationNotFound(_) => "Location not found.".to_string(),
            Self::Repo(err) => err.user_message(),
        }
    }
}

impl UserMessage for SyncError {}

/// Logs a failed operation and returns the message to display.
pub fn report_failure<E: UserMessage + ?Sized>(operation: &str, err: &E) -> String {
    error!("event={operation} module=core status=error error={err}");
    err.user_message()
}

#[cfg(test)]
mod tests {
    use super::{UserMessage, ACCESS_DENIED_MESSAGE, GENERIC_FAILURE_MESSAGE};
    use crate::auth::AuthError;
    use crate::model::location::LocationValidationError;
    use crate::repo::RepoError;
    use crate::service::location_service::LocationServiceError;

    #[test]
    fn storage_failures_collapse_to_generic_message() {
        let err = RepoError::InvalidData("bad row".to_string());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn validation_errors_keep_their_wording() {
        let err = LocationServiceError::Validation(LocationValidationError::EmptyName);
        assert_eq!(err.user_message(), "location name must not be empty");
    }

    #[test]
    fn permission_denied_is_explicit() {
        let err = LocationServiceError::Repo(RepoError::PermissionDenied {
            action: "insert",
            table: "locations",
        });
        assert_eq!(err.user_message(), ACCESS_DENIED_MESSAGE);
    }

    #[test]
    fn credential_errors_do_not_reveal_which_part_failed() {
        assert_eq!(
            AuthError::InvalidCredentials.user_message(),
            "Invalid email or password."
        );
    }
}
