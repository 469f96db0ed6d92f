//! User identity predicates
//!
//! Operations are always attributed to a user id. Two classes of ids never
//! talk to the network: local sessions (`local-…`) and guests (`guest-…`).
//! A transaction for either finalizes entirely against the local cache;
//! everything else commits through the delivery queue.

/// Prefix of user ids bound to this device only
pub const LOCAL_USER_PREFIX: &str = "local-";

/// Prefix of anonymous guest user ids
pub const GUEST_USER_PREFIX: &str = "guest-";

/// True if the user id identifies a local (non-networked) session
pub fn is_local_user(user_id: &str) -> bool {
    user_id.starts_with(LOCAL_USER_PREFIX)
}

/// True if the user id identifies an anonymous guest
pub fn is_guest_user(user_id: &str) -> bool {
    user_id.starts_with(GUEST_USER_PREFIX)
}

/// True if commits for this user are delivered to the remote authority
pub fn is_networked_user(user_id: &str) -> bool {
    !is_local_user(user_id) && !is_guest_user(user_id)
}
