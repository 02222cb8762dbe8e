//! Time-limited join codes.
//!
//! Admins issue invites; a prospective member redeems the code within 24
//! hours to be admitted with the granted role. Redemption is single-use
//! and atomic (see [`InviteManager::redeem_invite`]).

mod manager;
mod types;

pub use manager::InviteManager;
pub use types::{Invite, INVITE_CODE_LENGTH, INVITE_TTL_HOURS};
