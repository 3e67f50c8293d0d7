// Criterion benchmarks for the Synaps matching engine

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use synaps_match::core::{daily_jitter, filter_by_topic, Matcher};
use synaps_match::models::{MatchRequest, Profile, ScoringPolicy, ScoringRules};

const INTERESTS: &[&str] = &[
    "Philosophy", "Music", "Cooking", "Chess", "Poetry", "Startups", "Meditation", "Hiking",
    "Psychology", "Asian Literature", "Design", "Jazz",
];
const MOODS: &[&str] = &["Calm", "Energetic", "Creative", "Focused", "Reflective", ""];

fn create_candidate(id: usize) -> Profile {
    Profile {
        id: format!("user-{}", id),
        display_name: format!("User {}", id),
        interests: (0..(id % 5))
            .map(|k| INTERESTS[(id + k * 3) % INTERESTS.len()].to_string())
            .collect(),
        mood: MOODS[id % MOODS.len()].to_string(),
        current_intentions: if id % 4 == 0 { "talk about music".to_string() } else { String::new() },
        updated_at: Some(Utc::now() - Duration::minutes((id * 37) as i64)),
        ..Default::default()
    }
}

fn create_requester() -> Profile {
    Profile {
        id: "current_user".to_string(),
        display_name: "Me".to_string(),
        interests: vec!["Jazz".to_string(), "Design".to_string()],
        last_conversation_topics: vec!["philosophy".to_string(), "music".to_string()],
        connection_goals: "creative support".to_string(),
        current_intentions: "music".to_string(),
        ..Default::default()
    }
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let requester = create_requester();

    for size in [10usize, 100, 1000] {
        let candidates: Vec<Profile> = (0..size).map(create_candidate).collect();

        for policy in [ScoringPolicy::Baseline, ScoringPolicy::Promotional] {
            let matcher = Matcher::new(ScoringRules {
                policy,
                ..Default::default()
            });

            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", policy), size),
                &candidates,
                |b, candidates| {
                    b.iter(|| {
                        let ranked = matcher.rank(&requester, candidates.clone(), Utc::now());
                        black_box(ranked)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_find_matches_with_topic(c: &mut Criterion) {
    let matcher = Matcher::with_default_rules();
    let candidates: Vec<Profile> = (0..500).map(create_candidate).collect();
    let request = MatchRequest::new(create_requester(), candidates)
        .with_topic("music")
        .with_limit(5);

    c.bench_function("find_matches_500_candidates_topic", |b| {
        b.iter(|| black_box(matcher.find_matches(black_box(&request), Utc::now())));
    });
}

fn bench_topic_filter(c: &mut Criterion) {
    let matcher = Matcher::with_default_rules();
    let ranked = matcher.rank(
        &create_requester(),
        (0..500).map(create_candidate).collect(),
        Utc::now(),
    );

    c.bench_function("filter_by_topic_500", |b| {
        b.iter(|| black_box(filter_by_topic(ranked.clone(), black_box("jazz"))));
    });
}

fn bench_daily_jitter(c: &mut Criterion) {
    let day = Utc::now().date_naive();

    c.bench_function("daily_jitter", |b| {
        b.iter(|| daily_jitter(black_box("user-12345"), black_box(day), black_box(10)));
    });
}

criterion_group!(
    benches,
    bench_rank,
    bench_find_matches_with_topic,
    bench_topic_filter,
    bench_daily_jitter
);

criterion_main!(benches);
