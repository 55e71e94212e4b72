//! Database query functions organized by domain.

pub mod class_roles;
pub mod leaderboard;
pub mod locations;
pub mod missions;
pub mod profiles;
pub mod progress;
pub mod ranks;
pub mod task_progress;
pub mod tasks;
pub mod tokens;
pub mod tracks;
pub mod users;
