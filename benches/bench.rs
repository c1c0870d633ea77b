// Criterion benchmarks for the matchmaking core

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matchmaking_core::core::{calculate_completion, CompatibilityScorer, Matcher};
use matchmaking_core::models::{AccountStatus, Candidate, Profile, ProfileDetails, Visibility};

const RELIGIONS: [&str; 4] = ["Hindu", "Muslim", "Christian", "Sikh"];
const DIETS: [&str; 3] = ["Vegetarian", "Non-vegetarian", "Vegan"];

fn create_details(id: usize) -> ProfileDetails {
    ProfileDetails {
        gender: Some(if id % 2 == 0 { "female" } else { "male" }.to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(1985 + (id % 15) as i32, 1 + (id % 12) as u32, 1)
            .unwrap(),
        bio: format!("Profile {} enjoys travel, food and family time", id),
        location: "Mumbai".to_string(),
        photo_url: (id % 3 != 0).then(|| format!("https://cdn.example.com/{}.jpg", id)),
        religion: Some(RELIGIONS[id % RELIGIONS.len()].to_string()),
        mother_tongue: Some("Hindi".to_string()),
        height_cm: Some(150 + (id % 40) as u16),
        diet: Some(DIETS[id % DIETS.len()].to_string()),
        smoking: Some("No".to_string()),
        drinking: (id % 2 == 0).then(|| "Occasionally".to_string()),
        education: (id % 4 == 0).then(|| "MBA".to_string()),
        job_category: Some("IT".to_string()),
        ..Default::default()
    }
}

fn create_candidate(id: usize) -> Candidate {
    Candidate {
        profile: Profile::new(id.to_string(), create_details(id), Visibility::Public, Utc::now())
            .unwrap(),
        account_status: AccountStatus::Active,
    }
}

fn create_requester() -> Profile {
    Profile::new("requester", create_details(4), Visibility::Public, Utc::now()).unwrap()
}

fn bench_completion(c: &mut Criterion) {
    let details = create_details(7);

    c.bench_function("calculate_completion", |b| {
        b.iter(|| calculate_completion(black_box(&details)));
    });
}

fn bench_scoring(c: &mut Criterion) {
    let scorer = CompatibilityScorer::today();
    let requester = create_requester();
    let candidate = create_candidate(8);

    c.bench_function("compatibility_score", |b| {
        b.iter(|| scorer.score(black_box(&requester), black_box(&candidate.profile)));
    });
}

fn bench_matching(c: &mut Criterion) {
    let matcher = Matcher::with_default_threshold();
    let requester = create_requester();
    let blocked: HashSet<String> = (0..10).map(|i| (i * 7).to_string()).collect();

    let mut group = c.benchmark_group("matching");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<Candidate> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("find_matches", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    matcher.find_matches(
                        black_box(&requester),
                        black_box(candidates.clone()),
                        black_box(&blocked),
                        black_box(20),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_completion, bench_scoring, bench_matching);

criterion_main!(benches);
