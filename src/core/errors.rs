use std::fmt;

use thiserror::Error;

/// Precondition violations detected before any computation starts.
///
/// Never retried internally; always surfaced straight to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("not enough active participants: {active} active, at least {required} needed for one group per course")]
    TooFewParticipants { active: usize, required: usize },

    #[error("unequal group counts per course: {starter} starter, {main_course} main course, {dessert} dessert")]
    UnbalancedMeals {
        starter: usize,
        main_course: usize,
        dessert: usize,
    },

    #[error("at least 3 groups are required for a rotation, found {found}")]
    TooFewGroups { found: usize },
}

/// Why a candidate host table was rejected during the seating search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// The host's table already seats 3 groups
    HostFull,
    /// The two groups already met as often as the ceiling allows
    PairLimitReached,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RejectionReason::HostFull => "host table full",
            RejectionReason::PairLimitReached => "pair already met too often",
        };
        f.write_str(label)
    }
}

/// Route assignment failure, carrying the search diagnostics the caller
/// needs to decide whether to rerun with different groups.
#[derive(Debug, Clone, Error)]
pub enum RouteAssignmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(
        "seating search exhausted: {attempts} combinations over {retries} shuffled attempts, \
         best run seated {seated} of {total} groups; top rejections: {summary}",
        summary = format_rejections(.rejections)
    )]
    Exhausted {
        /// Total backtracking combinations tried across all retries
        attempts: u64,
        /// Outer reshuffle attempts consumed
        retries: u32,
        /// Most groups any single attempt managed to seat
        seated: usize,
        total: usize,
        /// Rejection reasons ranked by frequency, most common first
        rejections: Vec<(RejectionReason, u64)>,
    },
}

fn format_rejections(rejections: &[(RejectionReason, u64)]) -> String {
    if rejections.is_empty() {
        return "none recorded".to_string();
    }
    rejections
        .iter()
        .map(|(reason, count)| format!("{reason} ({count}x)"))
        .collect::<Vec<_>>()
        .join(", ")
}
