use serde::{Deserialize, Serialize};

use crate::models::domain::{Group, Route};

/// Result of group formation, consumed by the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationResult {
    pub groups: Vec<Group>,
    /// Human-readable soft issues (imperfect preference satisfaction,
    /// uneven buckets, incomplete trailing group)
    pub warnings: Vec<String>,
    #[serde(rename = "waitlistedIds")]
    pub waitlisted_ids: Vec<u64>,
}

/// Result of route assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    pub routes: Vec<Route>,
    pub warnings: Vec<String>,
}
