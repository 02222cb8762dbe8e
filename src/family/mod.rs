//! Family and membership management.
//!
//! A family groups one tracked person's safe-zone configuration with the
//! members watching over them. Creation always produces the family and an
//! admin owner member as one unit, so the "every family has at least one
//! admin" invariant holds from the first observable moment; further
//! members are admitted through redeemed invites (see [`crate::invite`]).
//!
//! # Types
//!
//! - [`Family`]: safe-zone configuration, root aggregate
//! - [`Member`]: a person with a [`Role`] inside one family
//! - [`FamilyManager`]: creation, admission, lookups

mod manager;
mod types;

pub use manager::FamilyManager;
pub use types::{Family, Member, Role};

pub(crate) use types::FAMILIES_COLLECTION;
