use chrono::{Duration, NaiveDate, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use utogsykle::models::{Activity, DateWindow, LeaderboardMember, Streak};
use utogsykle::services::leaderboard::{build_leaderboard, build_streak_leaderboard};
use utogsykle::services::LeaderboardOptions;
use uuid::Uuid;

const MEMBERS: usize = 500;
const DAYS: i64 = 90;

fn benchmark_leaderboards(c: &mut Criterion) {
    let company_id = Uuid::new_v4();
    let types = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let end = NaiveDate::from_ymd_opt(2024, 3, 31).expect("valid date");

    let members: Vec<LeaderboardMember> = (0..MEMBERS)
        .map(|i| LeaderboardMember {
            user_id: Uuid::new_v4(),
            name: format!("Member {:04}", i),
        })
        .collect();

    // Roughly every other member logs something each day
    let mut activities = Vec::new();
    for (i, member) in members.iter().enumerate() {
        for d in 0..DAYS {
            if (i as i64 + d) % 2 == 0 {
                activities.push(Activity {
                    id: Uuid::new_v4(),
                    user_id: member.user_id,
                    company_id,
                    activity_type_id: types[(i + d as usize) % types.len()],
                    value: 1000.0 + d as f64,
                    points: (1000.0 + d as f64) * 0.1,
                    activity_date: end - Duration::days(d),
                    notes: None,
                    source: "manual".to_string(),
                    created_at: Utc::now(),
                });
            }
        }
    }

    let streaks: Vec<Streak> = members
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let days = (0..(i as i64 % 30)).map(|d| end - Duration::days(d));
            Streak::recompute(m.user_id, company_id, days)
        })
        .collect();

    let month = DateWindow::new(end - Duration::days(30), end).expect("valid window");

    let mut group = c.benchmark_group("leaderboards");

    group.bench_function("company_month_top10", |b| {
        let options = LeaderboardOptions {
            activity_type_id: None,
            include_zero_scorers: false,
            limit: Some(10),
        };
        b.iter(|| build_leaderboard(black_box(&members), black_box(&activities), month, &options))
    });

    group.bench_function("competition_filtered_all", |b| {
        let options = LeaderboardOptions {
            activity_type_id: Some(types[0]),
            include_zero_scorers: true,
            limit: None,
        };
        b.iter(|| build_leaderboard(black_box(&members), black_box(&activities), month, &options))
    });

    group.bench_function("streaks_top10", |b| {
        b.iter(|| build_streak_leaderboard(black_box(&members), black_box(&streaks), Some(10)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_leaderboards);
criterion_main!(benches);
