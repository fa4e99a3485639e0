// Criterion benchmarks for Dinner Algo

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dinner_algo::core::{GroupFormer, RouteAssigner};
use dinner_algo::models::{
    EventConfig, MealSchedule, MealType, Participant, RegistrationStatus, TimeWindow,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn create_event_config() -> EventConfig {
    let window = |hour| TimeWindow {
        start_time: Utc.with_ymd_and_hms(2026, 9, 12, hour, 0, 0).unwrap(),
        end_time: Utc.with_ymd_and_hms(2026, 9, 12, hour + 1, 30, 0).unwrap(),
    };
    EventConfig {
        preferred_group_size: 3,
        meal_times: MealSchedule {
            starter: window(18),
            main_course: window(20),
            dessert: window(22),
        },
        after_party: None,
    }
}

fn create_roster(count: u64) -> Vec<Participant> {
    (1..=count)
        .map(|id| Participant {
            id,
            email: format!("p{id}@example.com"),
            name: format!("Person {id}"),
            status: RegistrationStatus::Active,
            registered_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
                + Duration::minutes(id as i64),
            meal_preference: match id % 4 {
                0 => Some(MealType::Starter),
                1 => Some(MealType::MainCourse),
                _ => None,
            },
            partner_preference: if id % 6 == 0 {
                Some(format!("p{}@example.com", id - 1))
            } else {
                None
            },
        })
        .collect()
}

fn bench_form_groups(c: &mut Criterion) {
    let config = create_event_config();
    let former = GroupFormer::with_default_settings();

    let mut group = c.benchmark_group("form_groups");
    for &count in &[36u64, 90] {
        let roster = create_roster(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &roster, |b, roster| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(42);
                former.form_groups(black_box(&config), black_box(roster), &mut rng)
            });
        });
    }
    group.finish();
}

fn bench_assign_routes(c: &mut Criterion) {
    let config = create_event_config();
    let former = GroupFormer::with_default_settings();
    let assigner = RouteAssigner::with_default_settings();

    let mut group = c.benchmark_group("assign_routes");
    for &count in &[27u64, 54] {
        let mut rng = StdRng::seed_from_u64(42);
        let formation = former
            .form_groups(&config, &create_roster(count), &mut rng)
            .expect("roster forms groups");
        group.bench_with_input(
            BenchmarkId::from_parameter(formation.groups.len()),
            &formation.groups,
            |b, groups| {
                b.iter(|| {
                    let mut rng = StdRng::seed_from_u64(7);
                    assigner.assign_routes(black_box(&config), black_box(groups), &mut rng)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_form_groups, bench_assign_routes);
criterion_main!(benches);
