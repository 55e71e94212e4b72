//! Mission availability.
//!
//! Checks run in a fixed order and stop at the first failure:
//! active flag, level gate, then prerequisites. The listing endpoint and the
//! start/complete actions both go through [`check`], so a mission that lists
//! as unavailable is rejected by the actions for the same reason.

use std::collections::HashSet;

use questline_types::catalog::Mission;
use questline_types::profile::Profile;
use questline_types::MissionId;

use crate::{EngineError, Result};

/// Check whether `profile` may start or complete `mission`.
pub fn check(mission: &Mission, profile: &Profile, completed: &HashSet<MissionId>) -> Result<()> {
    if !mission.is_active {
        return Err(EngineError::MissionInactive {
            mission_id: mission.id,
        });
    }

    if profile.level < mission.min_level {
        return Err(EngineError::LevelTooLow {
            required: mission.min_level,
            current: profile.level,
        });
    }

    let missing: Vec<MissionId> = mission
        .prerequisites
        .iter()
        .copied()
        .filter(|id| !completed.contains(id))
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::PrerequisitesNotCompleted { missing });
    }

    Ok(())
}

/// Boolean form of [`check`] for listings.
pub fn is_available(mission: &Mission, profile: &Profile, completed: &HashSet<MissionId>) -> bool {
    check(mission, profile, completed).is_ok()
}

/// Availability as seen by a caller without an account: only the active
/// flag is known.
pub fn is_available_anonymous(mission: &Mission) -> bool {
    mission.is_active
}
