//! Request DTOs for the flag API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::{Deserialize, Deserializer};

/// Maximum flag name length in characters
pub const MAX_NAME_LENGTH: usize = 255;

/// Default and maximum page sizes for list endpoints
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 200;

fn validate_name(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("Flag name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Some(format!(
            "Flag name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        ));
    }
    None
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request body for POST /flags
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFlagRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_enabled: bool,
}

impl CreateFlagRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_name(&self.name)
    }
}

/// Request body for PATCH /flags/:flag_id
///
/// Only fields present in the body are applied. `description` may be set to
/// `null` explicitly to clear it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFlagRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
}

impl UpdateFlagRequest {
    /// True when the body carried no updatable field at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_enabled.is_none()
    }

    pub fn validate(&self) -> Option<String> {
        self.name.as_deref().and_then(validate_name)
    }
}

/// Request body for PATCH /flags/:flag_id/toggle
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleFlagRequest {
    pub is_enabled: bool,
}

/// Request body for PUT /flags/:flag_id/users/:user_id
#[derive(Debug, Clone, Deserialize)]
pub struct SetOverrideRequest {
    pub is_enabled: bool,
}

/// Query string for GET /flags/evaluate
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateQuery {
    pub flag_name: String,
    pub user_id: String,
}

/// Pagination shared by the list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageQuery {
    pub fn validate(&self) -> Option<String> {
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Some(format!("limit must be between 1 and {}", MAX_PAGE_LIMIT));
        }
        None
    }
}

/// Query string for GET /flags
#[derive(Debug, Clone, Deserialize)]
pub struct ListFlagsQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub enabled_only: bool,
}

impl ListFlagsQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            skip: self.skip,
            limit: self.limit,
        }
    }
}
