//! Domain models for flags, overrides and evaluations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named boolean switch with a default state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A per-user exception to a flag's default state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserOverride {
    pub id: Uuid,
    pub flag_id: Uuid,
    pub user_id: String,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where an evaluation's answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    Override,
    Default,
}

impl fmt::Display for EvaluationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationSource::Override => write!(f, "override"),
            EvaluationSource::Default => write!(f, "default"),
        }
    }
}

/// The effective state of a flag for one user.
///
/// This is the value held by the evaluation cache and returned verbatim by
/// the evaluate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub enabled: bool,
    pub flag_id: Uuid,
    pub flag_name: String,
    pub user_id: String,
    pub source: EvaluationSource,
}

impl Evaluation {
    /// Resolves `flag` for `user_id`: the override if there is one, else the
    /// flag default.
    pub fn resolve(flag: &Flag, user_id: &str, user_override: Option<&UserOverride>) -> Self {
        let (enabled, source) = match user_override {
            Some(o) => (o.is_enabled, EvaluationSource::Override),
            None => (flag.is_enabled, EvaluationSource::Default),
        };

        Self {
            enabled,
            flag_id: flag.id,
            flag_name: flag.name.clone(),
            user_id: user_id.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_flag(enabled: bool) -> Flag {
        let now = Utc::now();
        Flag {
            id: Uuid::new_v4(),
            name: "dark_mode".to_string(),
            description: None,
            is_enabled: enabled,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_resolve_default() {
        let flag = sample_flag(true);
        let eval = Evaluation::resolve(&flag, "user_1", None);

        assert!(eval.enabled);
        assert_eq!(eval.source, EvaluationSource::Default);
        assert_eq!(eval.flag_id, flag.id);
        assert_eq!(eval.flag_name, "dark_mode");
        assert_eq!(eval.user_id, "user_1");
    }

    #[test]
    fn test_resolve_override_wins() {
        let flag = sample_flag(true);
        let now = Utc::now();
        let user_override = UserOverride {
            id: Uuid::new_v4(),
            flag_id: flag.id,
            user_id: "user_2".to_string(),
            is_enabled: false,
            created_at: now,
            updated_at: now,
        };

        let eval = Evaluation::resolve(&flag, "user_2", Some(&user_override));
        assert!(!eval.enabled);
        assert_eq!(eval.source, EvaluationSource::Override);
    }

    #[test]
    fn test_evaluation_serialize() {
        let eval = Evaluation::resolve(&sample_flag(false), "u", None);
        let json = serde_json::to_value(&eval).unwrap();

        assert_eq!(json["enabled"], false);
        assert_eq!(json["source"], "default");
        assert_eq!(json["user_id"], "u");
        assert_eq!(json["flag_name"], "dark_mode");
    }
}
