// Core algorithm exports
pub mod errors;
pub mod grouping;
pub mod mismatch;
pub mod preferences;
pub mod routing;

pub use errors::{RejectionReason, RouteAssignmentError, ValidationError};
pub use grouping::GroupFormer;
pub use mismatch::report_mismatches;
pub use preferences::{build_preference_graph, NameResolver};
pub use routing::{MeetingMatrix, RouteAssigner};
