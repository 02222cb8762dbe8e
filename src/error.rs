//! Error types for core operations.
//!
//! Every manager reports failures through the same [`Error`] enum so the
//! adapter layer can map error kinds to transport status codes in one
//! place. The core never logs and never retries; transient storage
//! failures surface immediately as [`Error::StorageUnavailable`].

use thiserror::Error;

use crate::store::StoreError;

/// Error type for all core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced family does not exist.
    #[error("Family not found: {0}")]
    InvalidFamily(String),

    /// Referenced member does not belong to the family.
    #[error("Member not found: {0}")]
    InvalidMember(String),

    /// Coordinate outside the valid latitude/longitude range.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Safe radius is not a positive, finite number of meters.
    #[error("Invalid safe radius: {0}")]
    InvalidRadius(f64),

    /// No invite carries the given code.
    #[error("Invite not found: {0}")]
    InviteNotFound(String),

    /// Invite exists but its expiry has passed.
    #[error("Invite expired: {0}")]
    InviteExpired(String),

    /// Invite exists but was already redeemed.
    #[error("Invite already used: {0}")]
    InviteAlreadyUsed(String),

    /// Member already belongs to the family.
    #[error("Member already in family: {0}")]
    DuplicateMember(String),

    /// Referenced alert does not exist.
    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    /// Storage backend failed or returned undecodable data.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_family_display() {
        let err = Error::InvalidFamily("fam123".to_string());
        assert_eq!(err.to_string(), "Family not found: fam123");
    }

    #[test]
    fn invalid_member_display() {
        let err = Error::InvalidMember("uid456".to_string());
        assert_eq!(err.to_string(), "Member not found: uid456");
    }

    #[test]
    fn invalid_coordinate_display() {
        let err = Error::InvalidCoordinate("latitude 91 out of range".to_string());
        assert_eq!(err.to_string(), "Invalid coordinate: latitude 91 out of range");
    }

    #[test]
    fn invalid_radius_display() {
        let err = Error::InvalidRadius(-5.0);
        assert_eq!(err.to_string(), "Invalid safe radius: -5");
    }

    #[test]
    fn invite_errors_display() {
        assert_eq!(
            Error::InviteNotFound("ABCD1234".to_string()).to_string(),
            "Invite not found: ABCD1234"
        );
        assert_eq!(
            Error::InviteExpired("ABCD1234".to_string()).to_string(),
            "Invite expired: ABCD1234"
        );
        assert_eq!(
            Error::InviteAlreadyUsed("ABCD1234".to_string()).to_string(),
            "Invite already used: ABCD1234"
        );
    }

    #[test]
    fn duplicate_member_display() {
        let err = Error::DuplicateMember("uid456".to_string());
        assert_eq!(err.to_string(), "Member already in family: uid456");
    }

    #[test]
    fn alert_not_found_display() {
        let err = Error::AlertNotFound("alert789".to_string());
        assert_eq!(err.to_string(), "Alert not found: alert789");
    }

    #[test]
    fn storage_unavailable_from_store_error() {
        let err = Error::from(StoreError::Unavailable("backend offline".to_string()));
        assert_eq!(
            err.to_string(),
            "Storage unavailable: Storage backend unavailable: backend offline"
        );
    }
}
