//! Document Stages
//!
//! Classification → Standards → Conflict detection → Conflict resolution.
//! Classification and resolution always call the model; standards calls it
//! only in AI mode; conflict detection is a pure function.

pub mod classification;
pub mod conflict;
pub mod dates;
pub mod helpers;
pub mod prompts;
pub mod resolution;
pub mod schemas;
pub mod standards;

pub use classification::ClassificationAgent;
pub use conflict::{detect_conflicts, has_date_conflict};
pub use dates::{DateSelection, DateSource, ParsedDate, parse_date, select_date};
pub use helpers::{AgentConfig, parse_json_response, run_agent};
pub use resolution::{Placement, Resolution, ResolutionAgent, ResolutionAnswer, ResolutionRequest};
pub use schemas::AgentSchemas;
pub use standards::{Standardized, StandardsAgent, StandardsProposal, StandardsRules};
