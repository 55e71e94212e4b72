//! HTTP handlers, one module per resource group.

pub mod auth;
pub mod catalog;
pub mod health;
pub mod leaderboard;
pub mod missions;
pub mod profile;
pub mod progress;
pub mod ranks;
pub mod tasks;

use serde::{Deserialize, Deserializer};

use crate::error::{ApiError, ApiResult};

/// Distinguish an explicit `null` from an absent field.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A required, non-blank string field.
pub(crate) fn required(field: &str, value: Option<String>) -> ApiResult<String> {
    match value {
        None => Err(ApiError::field(field, "This field is required.")),
        Some(v) if v.trim().is_empty() => Err(ApiError::field(field, "This field may not be blank.")),
        Some(v) => Ok(v),
    }
}

/// Overwrite `target` when a partial update supplied a value.
pub(crate) fn patch<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
