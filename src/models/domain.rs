use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One of the three courses of a progressive dinner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MealType {
    Starter,
    MainCourse,
    Dessert,
}

impl MealType {
    /// All meal types in course order
    pub const ALL: [MealType; 3] = [MealType::Starter, MealType::MainCourse, MealType::Dessert];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            MealType::Starter => 0,
            MealType::MainCourse => 1,
            MealType::Dessert => 2,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealType::Starter => "starter",
            MealType::MainCourse => "main course",
            MealType::Dessert => "dessert",
        };
        f.write_str(label)
    }
}

/// Registration status of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Active,
    Confirmed,
    Pending,
    Waitlisted,
    Cancelled,
}

impl RegistrationStatus {
    /// Whether the participant counts toward the working roster
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RegistrationStatus::Active | RegistrationStatus::Confirmed | RegistrationStatus::Pending
        )
    }
}

/// Event participant, supplied by the registration system and read-only here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub status: RegistrationStatus,
    #[serde(rename = "registeredAt")]
    pub registered_at: DateTime<Utc>,
    #[serde(rename = "mealPreference", default)]
    pub meal_preference: Option<MealType>,
    /// Free-text partner wishes: comma-separated emails or "First Last" names
    #[serde(rename = "partnerPreference", default)]
    pub partner_preference: Option<String>,
}

impl Participant {
    /// Helper mirroring the status check used throughout the engines
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Start and end of one course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
}

/// Time windows for all three courses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSchedule {
    pub starter: TimeWindow,
    #[serde(rename = "mainCourse")]
    pub main_course: TimeWindow,
    pub dessert: TimeWindow,
}

impl MealSchedule {
    #[inline]
    pub fn window_for(&self, meal: MealType) -> TimeWindow {
        match meal {
            MealType::Starter => self.starter,
            MealType::MainCourse => self.main_course,
            MealType::Dessert => self.dessert,
        }
    }
}

/// Optional after-party metadata; passed through to consumers untouched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfterParty {
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Per-event configuration supplied by the organizer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventConfig {
    #[validate(range(min = 1))]
    #[serde(rename = "preferredGroupSize")]
    pub preferred_group_size: usize,
    #[serde(rename = "mealTimes")]
    pub meal_times: MealSchedule,
    #[serde(rename = "afterParty", default)]
    pub after_party: Option<AfterParty>,
}

/// Directed partner-preference relation over participant ids
///
/// `mutual` is kept symmetric: if A appears under B then B appears under A.
/// An edge never lives in both maps for the same ordered pair; recording a
/// mutual edge evicts any one-sided edge between the two ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceGraph {
    mutual: HashMap<u64, BTreeSet<u64>>,
    one_sided: HashMap<u64, BTreeSet<u64>>,
}

impl PreferenceGraph {
    pub fn add_mutual(&mut self, a: u64, b: u64) {
        if a == b {
            return;
        }
        self.mutual.entry(a).or_default().insert(b);
        self.mutual.entry(b).or_default().insert(a);
        if let Some(set) = self.one_sided.get_mut(&a) {
            set.remove(&b);
        }
        if let Some(set) = self.one_sided.get_mut(&b) {
            set.remove(&a);
        }
    }

    pub fn add_one_sided(&mut self, from: u64, to: u64) {
        if from == to || self.is_mutual(from, to) {
            return;
        }
        self.one_sided.entry(from).or_default().insert(to);
    }

    #[inline]
    pub fn is_mutual(&self, a: u64, b: u64) -> bool {
        self.mutual.get(&a).is_some_and(|set| set.contains(&b))
    }

    pub fn mutual_partners(&self, id: u64) -> impl Iterator<Item = u64> + '_ {
        self.mutual.get(&id).into_iter().flatten().copied()
    }

    pub fn one_sided_partners(&self, id: u64) -> impl Iterator<Item = u64> + '_ {
        self.one_sided.get(&id).into_iter().flatten().copied()
    }

    /// Ids that named `id` one-sidedly (reverse-edge scan)
    pub fn incoming_one_sided(&self, id: u64) -> impl Iterator<Item = u64> + '_ {
        self.one_sided
            .iter()
            .filter(move |(_, targets)| targets.contains(&id))
            .map(|(&from, _)| from)
    }

    /// Whether any edge, in either direction, touches `id`
    pub fn involves(&self, id: u64) -> bool {
        self.mutual.get(&id).is_some_and(|set| !set.is_empty())
            || self.one_sided.get(&id).is_some_and(|set| !set.is_empty())
            || self.one_sided.values().any(|targets| targets.contains(&id))
    }

    /// Connected component of `id`, treating one-sided edges as undirected
    pub fn cluster_of(&self, id: u64) -> BTreeSet<u64> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            for next in self
                .mutual_partners(current)
                .chain(self.one_sided_partners(current))
                .chain(self.incoming_one_sided(current))
            {
                if !seen.contains(&next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Subgraph containing only edges whose endpoints both survive in `ids`
    pub fn restricted_to(&self, ids: &HashSet<u64>) -> PreferenceGraph {
        let filter = |map: &HashMap<u64, BTreeSet<u64>>| {
            map.iter()
                .filter(|(from, _)| ids.contains(from))
                .map(|(&from, targets)| {
                    let kept: BTreeSet<u64> =
                        targets.iter().copied().filter(|to| ids.contains(to)).collect();
                    (from, kept)
                })
                .filter(|(_, kept)| !kept.is_empty())
                .collect()
        };
        PreferenceGraph {
            mutual: filter(&self.mutual),
            one_sided: filter(&self.one_sided),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mutual.values().all(BTreeSet::is_empty)
            && self.one_sided.values().all(BTreeSet::is_empty)
    }
}

/// Cooking group produced by group formation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "groupNumber")]
    pub number: u32,
    #[serde(rename = "memberIds")]
    pub member_ids: Vec<u64>,
    #[serde(rename = "assignedMeal")]
    pub assigned_meal: MealType,
    #[serde(rename = "hostId")]
    pub host_id: u64,
}

/// One visited location on a group's evening route
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteStop {
    pub meal: MealType,
    #[serde(rename = "hostGroupId")]
    pub host_group: u32,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
}

/// Full evening route for one group: starter, main course, dessert in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "groupId")]
    pub group_number: u32,
    pub stops: Vec<RouteStop>,
}
