use std::collections::HashMap;

use crate::models::{Participant, PreferenceGraph};

/// Resolves a free-text preference entry to a participant id.
///
/// Lookup order: email (anything containing `@`), then normalized
/// "first last" name, then the same tokens in reversed order to handle
/// "Lastname Firstname" input. Unresolvable entries yield `None`.
///
/// Two participants with the same normalized name collide in the index;
/// the one inserted last wins. The registration system does not
/// disambiguate duplicate names either, so this is accepted behavior.
pub struct NameResolver {
    by_email: HashMap<String, u64>,
    by_name: HashMap<String, u64>,
}

impl NameResolver {
    pub fn new(participants: &[Participant]) -> Self {
        let mut by_email = HashMap::with_capacity(participants.len());
        let mut by_name = HashMap::with_capacity(participants.len());
        for participant in participants {
            by_email.insert(participant.email.to_lowercase(), participant.id);
            by_name.insert(normalize_name(&participant.name), participant.id);
        }
        Self { by_email, by_name }
    }

    pub fn resolve(&self, entry: &str) -> Option<u64> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        if entry.contains('@') {
            return self.by_email.get(&entry.to_lowercase()).copied();
        }
        // Normalization collapses fuzzy whitespace, so this covers both the
        // exact match and the re-joined-tokens fallback.
        let normalized = normalize_name(entry);
        if let Some(&id) = self.by_name.get(&normalized) {
            return Some(id);
        }
        self.by_name.get(&reverse_tokens(&normalized)).copied()
    }
}

/// Lowercase and collapse runs of whitespace to single spaces
fn normalize_name(raw: &str) -> String {
    raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn reverse_tokens(normalized: &str) -> String {
    normalized.split(' ').rev().collect::<Vec<_>>().join(" ")
}

/// Build the mutual/one-sided preference graph from the free-text partner
/// fields of the working participant list.
///
/// An edge becomes mutual when the named target's own preference field
/// contains the source's full name or email (case-insensitive substring);
/// otherwise it stays one-sided. Entries that resolve to nobody are
/// dropped without error.
pub fn build_preference_graph(participants: &[Participant]) -> PreferenceGraph {
    let resolver = NameResolver::new(participants);
    let by_id: HashMap<u64, &Participant> =
        participants.iter().map(|p| (p.id, p)).collect();

    let mut graph = PreferenceGraph::default();
    for source in participants {
        let Some(field) = source.partner_preference.as_deref() else {
            continue;
        };
        for entry in field.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some(target_id) = resolver.resolve(entry) else {
                tracing::trace!(entry, participant = source.id, "dropping unresolvable preference entry");
                continue;
            };
            if target_id == source.id {
                continue;
            }
            let Some(target) = by_id.get(&target_id) else {
                continue;
            };
            if names_back(target, source) {
                graph.add_mutual(source.id, target_id);
            } else {
                graph.add_one_sided(source.id, target_id);
            }
        }
    }
    graph
}

/// Whether `target`'s own preference field mentions `source` by full name
/// or email
fn names_back(target: &Participant, source: &Participant) -> bool {
    let Some(field) = target.partner_preference.as_deref() else {
        return false;
    };
    let field = field.to_lowercase();
    field.contains(&source.name.to_lowercase()) || field.contains(&source.email.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistrationStatus;
    use chrono::Utc;

    fn participant(id: u64, name: &str, email: &str, wishes: Option<&str>) -> Participant {
        Participant {
            id,
            email: email.to_string(),
            name: name.to_string(),
            status: RegistrationStatus::Active,
            registered_at: Utc::now(),
            meal_preference: None,
            partner_preference: wishes.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_by_email_case_insensitive() {
        let roster = vec![participant(1, "Ada Lovelace", "ada@example.com", None)];
        let resolver = NameResolver::new(&roster);

        assert_eq!(resolver.resolve("Ada@Example.COM"), Some(1));
    }

    #[test]
    fn test_resolve_by_name_fuzzy_whitespace() {
        let roster = vec![participant(1, "Ada Lovelace", "ada@example.com", None)];
        let resolver = NameResolver::new(&roster);

        assert_eq!(resolver.resolve("  ada   lovelace "), Some(1));
    }

    #[test]
    fn test_resolve_reversed_name_order() {
        let roster = vec![participant(1, "Ada Lovelace", "ada@example.com", None)];
        let resolver = NameResolver::new(&roster);

        assert_eq!(resolver.resolve("Lovelace Ada"), Some(1));
    }

    #[test]
    fn test_unresolvable_entry_dropped() {
        let roster = vec![participant(1, "Ada Lovelace", "ada@example.com", None)];
        let resolver = NameResolver::new(&roster);

        assert_eq!(resolver.resolve("nobody@example.com"), None);
        assert_eq!(resolver.resolve("Grace Hopper"), None);
    }

    #[test]
    fn test_duplicate_name_last_insert_wins() {
        let roster = vec![
            participant(1, "Kim Lee", "kim1@example.com", None),
            participant(2, "Kim Lee", "kim2@example.com", None),
        ];
        let resolver = NameResolver::new(&roster);

        assert_eq!(resolver.resolve("Kim Lee"), Some(2));
    }

    #[test]
    fn test_mutual_edge_via_email_and_name() {
        let roster = vec![
            participant(1, "Ada Lovelace", "ada@example.com", Some("grace@example.com")),
            participant(2, "Grace Hopper", "grace@example.com", Some("Ada Lovelace")),
        ];
        let graph = build_preference_graph(&roster);

        assert!(graph.is_mutual(1, 2));
        assert!(graph.is_mutual(2, 1));
        assert_eq!(graph.one_sided_partners(1).count(), 0);
    }

    #[test]
    fn test_one_sided_when_not_named_back() {
        let roster = vec![
            participant(1, "Ada Lovelace", "ada@example.com", Some("Grace Hopper")),
            participant(2, "Grace Hopper", "grace@example.com", None),
        ];
        let graph = build_preference_graph(&roster);

        assert!(!graph.is_mutual(1, 2));
        assert_eq!(graph.one_sided_partners(1).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_comma_separated_entries() {
        let roster = vec![
            participant(1, "Ada Lovelace", "ada@example.com", Some("Grace Hopper, edsger@example.com")),
            participant(2, "Grace Hopper", "grace@example.com", None),
            participant(3, "Edsger Dijkstra", "edsger@example.com", None),
        ];
        let graph = build_preference_graph(&roster);

        let targets: Vec<u64> = graph.one_sided_partners(1).collect();
        assert_eq!(targets, vec![2, 3]);
    }

    #[test]
    fn test_self_reference_ignored() {
        let roster = vec![participant(1, "Ada Lovelace", "ada@example.com", Some("ada@example.com"))];
        let graph = build_preference_graph(&roster);

        assert!(graph.is_empty());
    }

    #[test]
    fn test_building_twice_is_idempotent() {
        let roster = vec![
            participant(1, "Ada Lovelace", "ada@example.com", Some("grace@example.com")),
            participant(2, "Grace Hopper", "grace@example.com", Some("Ada Lovelace")),
            participant(3, "Edsger Dijkstra", "edsger@example.com", Some("Ada Lovelace")),
        ];

        assert_eq!(build_preference_graph(&roster), build_preference_graph(&roster));
    }
}
