use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use canteen::{
    meal::{Meal, Review},
    query::{self, RatingIndex},
    types::{MeatCategory, Weekday},
};

const CODES: [char; 6] = ['F', 'N', 'G', 'M', 'E', 'S'];

fn catalog(n: i64) -> Vec<Meal> {
    (1..=n)
        .map(|i| Meal {
            id: i,
            name: format!("meal {}", (i * 7919) % n),
            price_cents: ((i * 37) % 1500) as u64,
            calories: 200 + ((i * 13) % 900) as u32,
            allergens: BTreeSet::from([CODES[(i % 6) as usize], CODES[((i / 6) % 6) as usize]]),
            category: MeatCategory::Meat,
            weekday: Weekday::from_ordinal(i % 7),
        })
        .collect()
}

fn reviews(meals: i64, per_meal: i64) -> Vec<Review> {
    let mut out = Vec::new();
    for meal_id in 1..=meals {
        for k in 0..per_meal {
            let id = meal_id * per_meal + k;
            out.push(Review {
                id,
                meal_id,
                rating: ((meal_id + k) % 6) as u8,
                comment: String::new(),
                author_id: k,
                created_at: Utc.timestamp_millis_opt(id).unwrap(),
            });
        }
    }
    out
}

fn bench_sorts(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_by_price");
    for n in [100i64, 1_000, 10_000] {
        let meals = catalog(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &meals, |b, meals| {
            b.iter(|| query::sort_by_price(meals.clone()));
        });
    }
    group.finish();

    let meals = catalog(5_000);
    c.bench_function("sort_by_name_5k", |b| {
        b.iter(|| query::sort_by_name(meals.clone()));
    });
}

fn bench_rating(c: &mut Criterion) {
    let meals = catalog(2_000);
    let all = reviews(2_000, 20);
    c.bench_function("rating_index_40k_reviews", |b| {
        b.iter(|| RatingIndex::from_reviews(&all));
    });
    let ratings = RatingIndex::from_reviews(&all);
    c.bench_function("sort_by_rating_2k", |b| {
        b.iter(|| query::sort_by_rating(meals.clone(), &ratings));
    });
}

fn bench_filters(c: &mut Criterion) {
    let meals = catalog(10_000);
    let avoided = BTreeSet::from(['N', 'G']);
    c.bench_function("exclude_allergens_10k", |b| {
        b.iter(|| query::exclude_allergens(meals.clone(), &avoided));
    });
    c.bench_function("weekly_plan_10k", |b| {
        b.iter(|| query::weekly_plan(meals.clone()));
    });
}

criterion_group!(benches, bench_sorts, bench_rating, bench_filters);
criterion_main!(benches);
