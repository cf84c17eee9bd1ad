//! TARA Core: travel-guidance resolution pipeline
//!
//! Answers "does a traveler from country A need a visa for country B, and what
//! else do they need?" by combining a visa rule table with an advisory service,
//! while keeping a per-user profile so citizenship is asked once.
//!
//! # Pipeline Flow
//!
//! ```text
//! TravelRequest → Identity → Citizenship ──(missing)──→ INCOMPLETE
//!                               ↓
//!                          Destination → Merge → RuleStore ┐
//!                                              → Advisory  ┴→ Status → ResolvedRequest
//!                                                                        ↓
//!                                                                 Interaction log
//! ```
//!
//! The collaborators live behind the traits in [`ports`]; concrete stores and
//! the advisory client are provided by `tara-store` and `tara-advisory`.

pub mod context;
pub mod data_model;
pub mod error;
pub mod guidance;
pub mod merge;
pub mod ports;
pub mod resolver;
pub mod response;

pub use context::RequestContext;
pub use data_model::{
    country_code, AdvisoryResult, Citizenship, IncompleteReason, InteractionRecord, Nationality,
    NewInteraction, Profile, ProfileUpdate, ResolutionStatus, ResolvedRequest, SuppliedProfile,
    TravelRequest,
};
pub use error::TaraError;
pub use guidance::{ProceduralStep, TravelPurpose, VisaRequirement};
pub use merge::{merge_profile_layers, ProfileAttributes};
pub use ports::{AdvisoryService, ProfileStore, RuleStore};
pub use resolver::RequestResolver;
pub use response::GuidanceResponse;

/// Resolver engine version
pub const TARA_VERSION: &str = "2.0.0";
