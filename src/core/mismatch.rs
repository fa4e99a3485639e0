use std::collections::HashMap;

use crate::models::{Group, Participant, PreferenceGraph};

/// Post-hoc check over the final groups: one warning per member whose
/// mutual partner(s) ended up in a different group. Pure, never fails.
pub fn report_mismatches(
    groups: &[Group],
    graph: &PreferenceGraph,
    roster: &[Participant],
) -> Vec<String> {
    let names: HashMap<u64, &str> = roster.iter().map(|p| (p.id, p.name.as_str())).collect();
    let group_of: HashMap<u64, u32> = groups
        .iter()
        .flat_map(|g| g.member_ids.iter().map(|&id| (id, g.number)))
        .collect();

    let mut warnings = Vec::new();
    for group in groups {
        for &member in &group.member_ids {
            let separated: Vec<&str> = graph
                .mutual_partners(member)
                .filter(|partner| group_of.get(partner) != Some(&group.number))
                .map(|partner| names.get(&partner).copied().unwrap_or("unknown"))
                .collect();
            if !separated.is_empty() {
                warnings.push(format!(
                    "group {}: {} could not be placed with preferred partner(s) {}",
                    group.number,
                    names.get(&member).copied().unwrap_or("unknown"),
                    separated.join(", ")
                ));
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealType, RegistrationStatus};
    use chrono::Utc;

    fn participant(id: u64, name: &str) -> Participant {
        Participant {
            id,
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            name: name.to_string(),
            status: RegistrationStatus::Active,
            registered_at: Utc::now(),
            meal_preference: None,
            partner_preference: None,
        }
    }

    fn group(number: u32, member_ids: Vec<u64>) -> Group {
        Group {
            number,
            host_id: member_ids[0],
            member_ids,
            assigned_meal: MealType::Starter,
        }
    }

    #[test]
    fn test_no_warning_when_partners_together() {
        let roster = vec![participant(1, "Ada Lovelace"), participant(2, "Grace Hopper")];
        let mut graph = PreferenceGraph::default();
        graph.add_mutual(1, 2);
        let groups = vec![group(1, vec![1, 2])];

        assert!(report_mismatches(&groups, &graph, &roster).is_empty());
    }

    #[test]
    fn test_warning_per_separated_member() {
        let roster = vec![participant(1, "Ada Lovelace"), participant(2, "Grace Hopper")];
        let mut graph = PreferenceGraph::default();
        graph.add_mutual(1, 2);
        let groups = vec![group(1, vec![1]), group(2, vec![2])];

        let warnings = report_mismatches(&groups, &graph, &roster);

        // both sides of the pair are reported, once each
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Ada Lovelace"));
        assert!(warnings[0].contains("Grace Hopper"));
    }

    #[test]
    fn test_one_sided_preferences_not_reported() {
        let roster = vec![participant(1, "Ada Lovelace"), participant(2, "Grace Hopper")];
        let mut graph = PreferenceGraph::default();
        graph.add_one_sided(1, 2);
        let groups = vec![group(1, vec![1]), group(2, vec![2])];

        assert!(report_mismatches(&groups, &graph, &roster).is_empty());
    }
}
