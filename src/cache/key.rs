//! Cache Key Module
//!
//! Composite identity of a cached evaluation.

use std::fmt;

use uuid::Uuid;

// == Cache Key ==
/// Identifies one evaluation: a flag and the user it was evaluated for.
///
/// Compared structurally. User ids are taken verbatim, so `"Alice"` and
/// `"alice "` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub flag_id: Uuid,
    pub user_id: String,
}

impl CacheKey {
    pub fn new(flag_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            flag_id,
            user_id: user_id.into(),
        }
    }

    /// Returns true if this key belongs to `flag_id`.
    pub fn is_for_flag(&self, flag_id: &Uuid) -> bool {
        &self.flag_id == flag_id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.flag_id, self.user_id)
    }
}
