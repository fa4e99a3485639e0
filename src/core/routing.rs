use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::RoutingSettings;
use crate::core::errors::{RejectionReason, RouteAssignmentError, ValidationError};
use crate::models::{EventConfig, Group, MealType, Route, RouteStop, RoutingResult};

/// Groups seated at one table, host included
const TABLE_SEATS: usize = 3;

/// Below this many groups a zero-repeat seating cannot be guaranteed and
/// the pair-meeting ceiling is relaxed from 1 to 2
const MIN_GROUPS_FOR_UNIQUE_TABLES: usize = 9;

/// Pairwise meeting counts between groups, keyed by unordered pair
#[derive(Debug, Clone, Default)]
pub struct MeetingMatrix {
    counts: HashMap<(usize, usize), u32>,
}

impl MeetingMatrix {
    #[inline]
    fn key(a: usize, b: usize) -> (usize, usize) {
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn count(&self, a: usize, b: usize) -> u32 {
        self.counts.get(&Self::key(a, b)).copied().unwrap_or(0)
    }

    pub fn record(&mut self, a: usize, b: usize) {
        *self.counts.entry(Self::key(a, b)).or_insert(0) += 1;
    }

    /// Undo one recorded meeting
    pub fn erase(&mut self, a: usize, b: usize) {
        let key = Self::key(a, b);
        if let Some(count) = self.counts.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&key);
            }
        }
    }

    /// Unordered pairs that met more than once
    pub fn repeat_pairs(&self) -> Vec<((usize, usize), u32)> {
        let mut pairs: Vec<_> = self
            .counts
            .iter()
            .filter(|(_, &count)| count > 1)
            .map(|(&pair, &count)| (pair, count))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Route assignment engine
///
/// Solves the tripartite table assignment: every group visits one table per
/// course, hosts its own course at its own table, each table seats exactly
/// three groups, and no pair of groups shares a table more often than the
/// ceiling allows. The search is randomized backtracking with a bounded
/// attempt budget, wrapped in an outer retry loop that reshuffles the
/// group order, since ordering materially affects solvability.
#[derive(Debug, Clone)]
pub struct RouteAssigner {
    settings: RoutingSettings,
}

impl RouteAssigner {
    pub fn new(settings: RoutingSettings) -> Self {
        Self { settings }
    }

    pub fn with_default_settings() -> Self {
        Self {
            settings: RoutingSettings::default(),
        }
    }

    /// Compute one route per group.
    ///
    /// Precondition failures (unequal course counts, fewer than 3 groups)
    /// surface as [`RouteAssignmentError::Validation`]. An exhausted search
    /// surfaces as [`RouteAssignmentError::Exhausted`] carrying attempt
    /// counts, the deepest partial seating, and ranked rejection reasons.
    pub fn assign_routes<R: Rng>(
        &self,
        config: &EventConfig,
        groups: &[Group],
        rng: &mut R,
    ) -> Result<RoutingResult, RouteAssignmentError> {
        validate_groups(groups)?;

        let total = groups.len();
        let ceiling = match total {
            n if n >= MIN_GROUPS_FOR_UNIQUE_TABLES => 1,
            n if n > 3 => 2,
            // with one group per course all three groups share every table
            _ => 3,
        };
        let mut warnings = Vec::new();
        if ceiling > 1 {
            tracing::debug!(total, ceiling, "relaxed mode active");
            warnings.push(format!(
                "only {total} groups: pairs of groups may share a table up to {ceiling} times"
            ));
        }

        let mut hosts_by_meal: [Vec<usize>; 3] = Default::default();
        for (index, group) in groups.iter().enumerate() {
            hosts_by_meal[group.assigned_meal.index()].push(index);
        }

        let mut order: Vec<usize> = (0..total).collect();
        let mut total_attempts = 0u64;
        let mut best_seated = 0usize;
        let mut rejections: HashMap<RejectionReason, u64> = HashMap::new();

        for retry in 0..self.settings.max_retries {
            order.shuffle(rng);
            let mut search = SeatingSearch::new(
                groups,
                &hosts_by_meal,
                ceiling,
                self.settings.max_backtrack_attempts,
            );
            let solved = search.run(&order);
            total_attempts += search.attempts;
            best_seated = best_seated.max(search.deepest);
            for (reason, count) in search.rejections {
                *rejections.entry(reason).or_insert(0) += count;
            }

            if let Some(assignment) = solved {
                tracing::debug!(
                    retry,
                    attempts = total_attempts,
                    "seating found after {} shuffled attempt(s)",
                    retry + 1
                );
                let routes = build_routes(config, groups, &assignment);
                warnings.extend(repeat_meeting_warnings(groups, &assignment));
                return Ok(RoutingResult { routes, warnings });
            }
        }

        let mut ranked: Vec<(RejectionReason, u64)> = rejections.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        Err(RouteAssignmentError::Exhausted {
            attempts: total_attempts,
            retries: self.settings.max_retries,
            seated: best_seated,
            total,
            rejections: ranked,
        })
    }
}

impl Default for RouteAssigner {
    fn default() -> Self {
        Self::with_default_settings()
    }
}

fn validate_groups(groups: &[Group]) -> Result<(), ValidationError> {
    if groups.len() < 3 {
        return Err(ValidationError::TooFewGroups { found: groups.len() });
    }
    let count = |meal: MealType| groups.iter().filter(|g| g.assigned_meal == meal).count();
    let (starter, main_course, dessert) = (
        count(MealType::Starter),
        count(MealType::MainCourse),
        count(MealType::Dessert),
    );
    if starter != main_course || main_course != dessert {
        return Err(ValidationError::UnbalancedMeals {
            starter,
            main_course,
            dessert,
        });
    }
    Ok(())
}

/// One backtracking run over a fixed group order
struct SeatingSearch<'a> {
    groups: &'a [Group],
    hosts_by_meal: &'a [Vec<usize>; 3],
    ceiling: u32,
    budget: u64,
    attempts: u64,
    deepest: usize,
    rejections: HashMap<RejectionReason, u64>,
    /// Per group, the chosen host index per meal; own-meal slots are
    /// preassigned to the group itself
    assignment: Vec<[Option<usize>; 3]>,
    /// Groups currently seated at each host's table, host included
    tables: Vec<Vec<usize>>,
    meetings: MeetingMatrix,
}

impl<'a> SeatingSearch<'a> {
    fn new(
        groups: &'a [Group],
        hosts_by_meal: &'a [Vec<usize>; 3],
        ceiling: u32,
        budget: u64,
    ) -> Self {
        let mut assignment = vec![[None; 3]; groups.len()];
        let mut tables = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            assignment[index][group.assigned_meal.index()] = Some(index);
            tables.push(vec![index]);
        }
        Self {
            groups,
            hosts_by_meal,
            ceiling,
            budget,
            attempts: 0,
            deepest: 0,
            rejections: HashMap::new(),
            assignment,
            tables,
            meetings: MeetingMatrix::default(),
        }
    }

    fn run(&mut self, order: &[usize]) -> Option<Vec<[usize; 3]>> {
        if !self.place(order, 0) {
            return None;
        }
        let finished = self
            .assignment
            .iter()
            .enumerate()
            .map(|(index, slots)| {
                [
                    slots[0].unwrap_or(index),
                    slots[1].unwrap_or(index),
                    slots[2].unwrap_or(index),
                ]
            })
            .collect();
        Some(finished)
    }

    fn place(&mut self, order: &[usize], position: usize) -> bool {
        if position == order.len() {
            return true;
        }
        self.deepest = self.deepest.max(position);
        let group = order[position];
        let own = self.groups[group].assigned_meal;
        let mut foreign = MealType::ALL.iter().copied().filter(|&m| m != own);
        let (Some(first), Some(second)) = (foreign.next(), foreign.next()) else {
            return false;
        };

        for i in 0..self.hosts_by_meal[first.index()].len() {
            if self.attempts >= self.budget {
                return false;
            }
            let host_a = self.hosts_by_meal[first.index()][i];
            if !self.can_join(group, host_a) {
                continue;
            }
            self.seat(group, first, host_a);

            let mut solved = false;
            for j in 0..self.hosts_by_meal[second.index()].len() {
                if self.attempts >= self.budget {
                    break;
                }
                self.attempts += 1;
                let host_b = self.hosts_by_meal[second.index()][j];
                if !self.can_join(group, host_b) {
                    continue;
                }
                self.seat(group, second, host_b);
                if self.place(order, position + 1) {
                    solved = true;
                    break;
                }
                self.unseat(group, second, host_b);
            }
            if solved {
                return true;
            }
            self.unseat(group, first, host_a);
        }
        false
    }

    fn can_join(&mut self, group: usize, host: usize) -> bool {
        if self.tables[host].len() >= TABLE_SEATS {
            *self.rejections.entry(RejectionReason::HostFull).or_insert(0) += 1;
            return false;
        }
        for index in 0..self.tables[host].len() {
            let other = self.tables[host][index];
            if self.meetings.count(group, other) >= self.ceiling {
                *self
                    .rejections
                    .entry(RejectionReason::PairLimitReached)
                    .or_insert(0) += 1;
                return false;
            }
        }
        true
    }

    fn seat(&mut self, group: usize, meal: MealType, host: usize) {
        for index in 0..self.tables[host].len() {
            let other = self.tables[host][index];
            self.meetings.record(group, other);
        }
        self.tables[host].push(group);
        self.assignment[group][meal.index()] = Some(host);
    }

    fn unseat(&mut self, group: usize, meal: MealType, host: usize) {
        self.tables[host].pop();
        for index in 0..self.tables[host].len() {
            let other = self.tables[host][index];
            self.meetings.erase(group, other);
        }
        self.assignment[group][meal.index()] = None;
    }
}

fn build_routes(config: &EventConfig, groups: &[Group], assignment: &[[usize; 3]]) -> Vec<Route> {
    groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let stops = MealType::ALL
                .into_iter()
                .map(|meal| {
                    let host_index = assignment[index][meal.index()];
                    let window = config.meal_times.window_for(meal);
                    RouteStop {
                        meal,
                        host_group: groups[host_index].number,
                        start_time: window.start_time,
                        end_time: window.end_time,
                    }
                })
                .collect();
            Route {
                group_number: group.number,
                stops,
            }
        })
        .collect()
}

/// Recompute meeting counts from the final assignment and flag any pair
/// that shared a table more than once. Expected in relaxed mode; never an
/// engine failure.
fn repeat_meeting_warnings(groups: &[Group], assignment: &[[usize; 3]]) -> Vec<String> {
    let matrix = meeting_matrix(assignment);
    matrix
        .repeat_pairs()
        .into_iter()
        .map(|((a, b), count)| {
            format!(
                "groups {} and {} share a table {} times",
                groups[a].number, groups[b].number, count
            )
        })
        .collect()
}

/// Meeting counts implied by a complete assignment
pub(crate) fn meeting_matrix(assignment: &[[usize; 3]]) -> MeetingMatrix {
    let mut matrix = MeetingMatrix::default();
    for meal_index in 0..3 {
        let mut tables: HashMap<usize, Vec<usize>> = HashMap::new();
        for (group, slots) in assignment.iter().enumerate() {
            tables.entry(slots[meal_index]).or_default().push(group);
        }
        for seated in tables.values() {
            for i in 0..seated.len() {
                for j in (i + 1)..seated.len() {
                    matrix.record(seated[i], seated[j]);
                }
            }
        }
    }
    matrix
}
