use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::config::FormationSettings;
use crate::core::errors::ValidationError;
use crate::core::mismatch::report_mismatches;
use crate::core::preferences::build_preference_graph;
use crate::models::{
    EventConfig, FormationResult, Group, MealType, Participant, PreferenceGraph,
};

/// Relative worth of keeping a participant off the waitlist, per edge kind
const MUTUAL_KEEP_WEIGHT: f64 = 4.0;
const INCOMING_KEEP_WEIGHT: f64 = 2.0;
const OUTGOING_KEEP_WEIGHT: f64 = 1.0;

/// Group formation engine
///
/// # Pipeline stages
/// 1. Active-roster filter and size validation
/// 2. Waitlist trim down to a participant count divisible by 3 x group size
/// 3. Course bucketing, preference clusters first
/// 4. Bucket rebalancing under partner constraints
/// 5. Fixed-size group emission with host selection
#[derive(Debug, Clone)]
pub struct GroupFormer {
    settings: FormationSettings,
}

impl GroupFormer {
    pub fn new(settings: FormationSettings) -> Self {
        Self { settings }
    }

    pub fn with_default_settings() -> Self {
        Self {
            settings: FormationSettings::default(),
        }
    }

    /// Partition the active roster into cooking groups of exactly
    /// `preferred_group_size`, one third of them per course.
    ///
    /// Fails with [`ValidationError::TooFewParticipants`] when fewer than
    /// `3 * preferred_group_size` participants are active. Everything else
    /// that goes imperfectly (separated partners, uneven buckets, an
    /// incomplete trailing group) is reported as a warning on the result.
    pub fn form_groups<R: Rng>(
        &self,
        config: &EventConfig,
        roster: &[Participant],
        rng: &mut R,
    ) -> Result<FormationResult, ValidationError> {
        // a zero group size cannot seat anyone; EventConfig validation
        // rejects it upstream, but guard the arithmetic here too
        let size = config.preferred_group_size.max(1);
        let mut working: Vec<Participant> =
            roster.iter().filter(|p| p.is_active()).cloned().collect();
        let required = 3 * size;
        if working.len() < required {
            return Err(ValidationError::TooFewParticipants {
                active: working.len(),
                required,
            });
        }

        let mut warnings = Vec::new();
        let graph = build_preference_graph(&working);

        // Stage 2: trim to the largest usable multiple of 3 groups
        let usable_group_count = (working.len() / size / 3) * 3;
        let groups_per_meal = usable_group_count / 3;
        let ideal_participant_count = usable_group_count * size;

        let mut waitlisted_ids = Vec::new();
        if working.len() > ideal_participant_count {
            let excess = working.len() - ideal_participant_count;
            waitlisted_ids = self.select_waitlist(&working, &graph, excess, rng);
            let waitlisted: HashSet<u64> = waitlisted_ids.iter().copied().collect();
            for participant in working.iter().filter(|p| waitlisted.contains(&p.id)) {
                if graph.mutual_partners(participant.id).next().is_some() {
                    warnings.push(format!(
                        "{} was moved to the waitlist despite a mutual partner preference",
                        participant.name
                    ));
                }
            }
            tracing::debug!(
                excess,
                active = working.len(),
                "trimming roster to {} participants",
                ideal_participant_count
            );
            working.retain(|p| !waitlisted.contains(&p.id));
        }

        // Stage 3: rebuild the graph over survivors, then bucket by course
        let surviving: HashSet<u64> = working.iter().map(|p| p.id).collect();
        let graph = graph.restricted_to(&surviving);

        working.shuffle(rng);
        let mut buckets = fill_buckets(&working, &graph);

        // Stage 4
        let target_bucket_size = groups_per_meal * size;
        self.rebalance(&mut buckets, &graph, &working, target_bucket_size, &mut warnings);

        // Stage 5
        let mut groups = Vec::with_capacity(usable_group_count);
        let mut next_number = 1u32;
        for meal in MealType::ALL {
            let bucket = std::mem::take(&mut buckets[meal.index()]);
            form_bucket_groups(
                bucket,
                meal,
                &graph,
                size,
                &mut groups,
                &mut next_number,
                &mut warnings,
                rng,
            );
        }

        warnings.extend(report_mismatches(&groups, &graph, &working));

        Ok(FormationResult {
            groups,
            warnings,
            waitlisted_ids,
        })
    }

    /// Pick `excess` participants to waitlist.
    ///
    /// Participants carrying preference edges are kept preferentially
    /// (mutual edges outweigh one-sided ones, and being named by someone
    /// else counts too); among equals the most recent signup goes first,
    /// with a small random jitter breaking exact ties.
    fn select_waitlist<R: Rng>(
        &self,
        working: &[Participant],
        graph: &PreferenceGraph,
        excess: usize,
        rng: &mut R,
    ) -> Vec<u64> {
        let mut candidates: Vec<(f64, DateTime<Utc>, f64, u64)> = working
            .iter()
            .map(|p| {
                let keep = graph.mutual_partners(p.id).count() as f64 * MUTUAL_KEEP_WEIGHT
                    + graph.incoming_one_sided(p.id).count() as f64 * INCOMING_KEEP_WEIGHT
                    + graph.one_sided_partners(p.id).count() as f64 * OUTGOING_KEEP_WEIGHT;
                let jitter = rng.random_range(0.0..1.0) * self.settings.waitlist_jitter;
                (keep, p.registered_at, jitter, p.id)
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
        });
        candidates.into_iter().take(excess).map(|(_, _, _, id)| id).collect()
    }

    /// Move participants from over-full to under-full course buckets until
    /// every bucket holds `target` participants or no legal move remains.
    ///
    /// A participant may move only if the move separates them from no
    /// partner left in the source bucket and nobody in that bucket named
    /// them. Iterations are capped so adversarial inputs terminate.
    fn rebalance(
        &self,
        buckets: &mut [Vec<u64>; 3],
        graph: &PreferenceGraph,
        working: &[Participant],
        target: usize,
        warnings: &mut Vec<String>,
    ) {
        let by_id: HashMap<u64, &Participant> = working.iter().map(|p| (p.id, p)).collect();
        for _ in 0..self.settings.max_rebalance_iterations {
            let over = (0..3).find(|&i| buckets[i].len() > target);
            let under = (0..3).find(|&i| buckets[i].len() < target);
            let (Some(over), Some(under)) = (over, under) else {
                break;
            };
            let Some(pos) = buckets[over]
                .iter()
                .position(|&id| is_movable(id, &buckets[over], graph))
            else {
                break;
            };
            let id = buckets[over].remove(pos);
            let destination = MealType::ALL[under];
            if let Some(p) = by_id.get(&id) {
                if p.meal_preference.is_some_and(|m| m != destination) {
                    warnings.push(format!(
                        "{} was reassigned to {} to balance group counts",
                        p.name, destination
                    ));
                }
            }
            buckets[under].push(id);
        }
        if (0..3).any(|i| buckets[i].len() != target) {
            tracing::warn!(target, "course buckets could not be fully balanced");
            warnings.push(
                "could not perfectly balance participants across courses; some groups may be incomplete"
                    .to_string(),
            );
        }
    }
}

impl Default for GroupFormer {
    fn default() -> Self {
        Self::with_default_settings()
    }
}

/// Distribute the shuffled working list into the three course buckets.
///
/// Preference clusters are placed first and always travel as a unit; the
/// bucket is chosen by priority: a mutual partner's stated course, the
/// participant's own, any one-sided partner's, else the smallest bucket.
/// Remaining participants with a stated course go there; the rest pad the
/// smallest bucket one at a time.
fn fill_buckets(working: &[Participant], graph: &PreferenceGraph) -> [Vec<u64>; 3] {
    let by_id: HashMap<u64, &Participant> = working.iter().map(|p| (p.id, p)).collect();
    let mut buckets: [Vec<u64>; 3] = Default::default();
    let mut placed: HashSet<u64> = HashSet::new();

    for participant in working {
        if placed.contains(&participant.id) || !graph.involves(participant.id) {
            continue;
        }
        let cluster: Vec<u64> = graph
            .cluster_of(participant.id)
            .into_iter()
            .filter(|id| !placed.contains(id))
            .collect();
        let meal =
            cluster_meal(participant, graph, &by_id).unwrap_or_else(|| smallest_bucket(&buckets));
        for id in cluster {
            placed.insert(id);
            buckets[meal.index()].push(id);
        }
    }

    for participant in working {
        if placed.contains(&participant.id) {
            continue;
        }
        if let Some(meal) = participant.meal_preference {
            placed.insert(participant.id);
            buckets[meal.index()].push(participant.id);
        }
    }

    for participant in working {
        if !placed.insert(participant.id) {
            continue;
        }
        let meal = smallest_bucket(&buckets);
        buckets[meal.index()].push(participant.id);
    }

    buckets
}

/// Course for a preference cluster, in falling priority
fn cluster_meal(
    participant: &Participant,
    graph: &PreferenceGraph,
    by_id: &HashMap<u64, &Participant>,
) -> Option<MealType> {
    graph
        .mutual_partners(participant.id)
        .find_map(|partner| by_id.get(&partner).and_then(|p| p.meal_preference))
        .or(participant.meal_preference)
        .or_else(|| {
            graph
                .one_sided_partners(participant.id)
                .find_map(|partner| by_id.get(&partner).and_then(|p| p.meal_preference))
        })
}

fn smallest_bucket(buckets: &[Vec<u64>; 3]) -> MealType {
    MealType::ALL
        .into_iter()
        .min_by_key(|meal| buckets[meal.index()].len())
        .unwrap_or(MealType::Starter)
}

/// Whether moving `id` out of `bucket` breaks no preference constraint
fn is_movable(id: u64, bucket: &[u64], graph: &PreferenceGraph) -> bool {
    let stays = |other: u64| other != id && bucket.contains(&other);
    if graph.mutual_partners(id).any(&stays) || graph.one_sided_partners(id).any(&stays) {
        return false;
    }
    !graph.incoming_one_sided(id).any(&stays)
}

/// Cut one course bucket into groups of exactly `size` members.
///
/// Mutual clusters claim their groups first (padded with their one-sided
/// partners, then filler), then one-sided seeds, then sequential chunks of
/// whatever is left. A trailing group short of `size` is still emitted,
/// flagged with a warning.
fn form_bucket_groups<R: Rng>(
    mut remaining: Vec<u64>,
    meal: MealType,
    graph: &PreferenceGraph,
    size: usize,
    groups: &mut Vec<Group>,
    next_number: &mut u32,
    warnings: &mut Vec<String>,
    rng: &mut R,
) {
    while let Some(seed) = remaining
        .iter()
        .copied()
        .find(|&id| graph.mutual_partners(id).any(|p| remaining.contains(&p)))
    {
        let mut members = mutual_component(seed, &remaining, graph, size);
        extend_with_one_sided(&mut members, &remaining, graph, size);
        fill_to_size(&mut members, &remaining, size);
        remaining.retain(|id| !members.contains(id));
        push_group(groups, members, meal, size, next_number, warnings, rng);
    }

    while let Some(seed) = remaining
        .iter()
        .copied()
        .find(|&id| graph.one_sided_partners(id).any(|p| remaining.contains(&p)))
    {
        let mut members = vec![seed];
        extend_with_one_sided(&mut members, &remaining, graph, size);
        fill_to_size(&mut members, &remaining, size);
        remaining.retain(|id| !members.contains(id));
        push_group(groups, members, meal, size, next_number, warnings, rng);
    }

    while !remaining.is_empty() {
        let take = size.min(remaining.len());
        let members: Vec<u64> = remaining.drain(..take).collect();
        push_group(groups, members, meal, size, next_number, warnings, rng);
    }
}

/// Mutual-edge connected component of `seed` within `pool`, capped at `cap`
fn mutual_component(seed: u64, pool: &[u64], graph: &PreferenceGraph, cap: usize) -> Vec<u64> {
    let mut members = vec![seed];
    let mut cursor = 0;
    while cursor < members.len() && members.len() < cap {
        let current = members[cursor];
        for partner in graph.mutual_partners(current) {
            if members.len() >= cap {
                break;
            }
            if pool.contains(&partner) && !members.contains(&partner) {
                members.push(partner);
            }
        }
        cursor += 1;
    }
    members
}

fn extend_with_one_sided(
    members: &mut Vec<u64>,
    pool: &[u64],
    graph: &PreferenceGraph,
    cap: usize,
) {
    let mut cursor = 0;
    while cursor < members.len() && members.len() < cap {
        let current = members[cursor];
        for partner in graph.one_sided_partners(current) {
            if members.len() >= cap {
                break;
            }
            if pool.contains(&partner) && !members.contains(&partner) {
                members.push(partner);
            }
        }
        cursor += 1;
    }
}

fn fill_to_size(members: &mut Vec<u64>, pool: &[u64], cap: usize) {
    for &id in pool {
        if members.len() >= cap {
            break;
        }
        if !members.contains(&id) {
            members.push(id);
        }
    }
}

fn push_group<R: Rng>(
    groups: &mut Vec<Group>,
    members: Vec<u64>,
    meal: MealType,
    size: usize,
    next_number: &mut u32,
    warnings: &mut Vec<String>,
    rng: &mut R,
) {
    // never fabricate an empty group
    let Some(&host_id) = members.choose(rng) else {
        return;
    };
    if members.len() < size {
        warnings.push(format!(
            "group {} ({}) is incomplete: {} of {} members",
            *next_number,
            meal,
            members.len(),
            size
        ));
    }
    groups.push(Group {
        number: *next_number,
        member_ids: members,
        assigned_meal: meal,
        host_id,
    });
    *next_number += 1;
}
