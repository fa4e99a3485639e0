//! Dinner Algo - group formation and route assignment for progressive dinner events
//!
//! This library provides the combinatorial core behind "running dinner"
//! events: it partitions registered participants into fixed-size cooking
//! groups that respect partner preferences, then assigns every group a
//! three-course route so that each group hosts one course, visits two
//! others, and no two groups share a table more often than necessary.
//!
//! Both engines are pure, synchronous computations over in-memory input;
//! persistence and notification of the results are the caller's concern.

pub mod config;
pub mod core;
pub mod models;

// Re-export commonly used types
pub use self::core::{
    build_preference_graph, report_mismatches, GroupFormer, RouteAssigner, RouteAssignmentError,
    ValidationError,
};
pub use models::{
    EventConfig, FormationResult, Group, MealType, Participant, PreferenceGraph,
    RegistrationStatus, Route, RoutingResult,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let graph = build_preference_graph(&[]);
        assert!(graph.is_empty());
    }
}
