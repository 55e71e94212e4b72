//! Per-user XP ledger and hero class selection.

use serde::{Deserialize, Serialize};

use crate::{ClassRoleId, UserId, START_LEVEL};

/// Game state owned one-to-one by a user account.
///
/// `level` is derived from `xp` and only ever moves through
/// `questline_engine::xp::add_xp`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Profile {
    pub user_id: UserId,
    pub xp: u64,
    pub level: u32,
    pub bio: String,
    /// Settable once; immutable after the first non-null assignment.
    pub class_role: Option<ClassRoleId>,
}

impl Profile {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            xp: 0,
            level: START_LEVEL,
            bio: String::new(),
            class_role: None,
        }
    }
}

/// A selectable hero class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ClassRole {
    pub id: ClassRoleId,
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile() {
        let profile = Profile::new(7);
        assert_eq!(profile.user_id, 7);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.level, 1);
        assert!(profile.class_role.is_none());
    }
}
