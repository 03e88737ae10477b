//! Domain models and request/response DTOs for the flag API
//!
//! `flag` holds the persisted and evaluated types; `requests` and `responses`
//! hold the HTTP body and query shapes.

pub mod flag;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use flag::{Evaluation, EvaluationSource, Flag, UserOverride};
pub use requests::{
    CreateFlagRequest, EvaluateQuery, ListFlagsQuery, PageQuery, SetOverrideRequest,
    ToggleFlagRequest, UpdateFlagRequest,
};
pub use responses::{
    ErrorResponse, FlagListResponse, HealthResponse, ListResponse, MessageResponse,
    OverrideListResponse, StatsResponse,
};
