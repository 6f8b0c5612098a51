use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use canteen::{
    allergen::AllergenSet,
    meal::{Meal, Review},
    query::{self, Median, RatingIndex},
    types::{MeatCategory, Weekday},
};

fn meal(id: i64, price_cents: u64) -> Meal {
    Meal {
        id,
        name: format!("meal {id}"),
        price_cents,
        calories: 500,
        allergens: AllergenSet::new(),
        category: MeatCategory::Vegetarian,
        weekday: None,
    }
}

fn review(id: i64, meal_id: i64, rating: u8) -> Review {
    Review {
        id,
        meal_id,
        rating,
        comment: String::new(),
        author_id: 1,
        created_at: Utc.timestamp_millis_opt(id).unwrap(),
    }
}

fn ids(meals: &[Meal]) -> Vec<i64> {
    meals.iter().map(|m| m.id).collect()
}

#[test]
fn price_sort_breaks_ties_by_id() {
    let meals = vec![meal(1, 950), meal(3, 300), meal(2, 300)];
    assert_eq!(ids(&query::sort_by_price(meals)), vec![2, 3, 1]);
}

#[test]
fn name_sort_is_ordinal() {
    let mut a = meal(1, 100);
    a.name = "apple".to_string();
    let mut b = meal(2, 100);
    b.name = "Zucchini".to_string();
    let mut c = meal(3, 100);
    c.name = "Banana".to_string();
    assert_eq!(ids(&query::sort_by_name(vec![a, b, c])), vec![3, 2, 1]);
}

#[test]
fn medians() {
    let reviews = vec![review(1, 7, 3), review(2, 7, 5), review(3, 8, 2), review(4, 8, 4), review(5, 8, 5)];
    assert_eq!(query::median_rating(7, &reviews), Median::Rated(4.0));
    assert_eq!(query::median_rating(8, &reviews), Median::Rated(4.0));
    assert_eq!(query::median_rating(9, &reviews), Median::Unrated);
    assert_eq!(Median::Unrated.label(), "unrated");
    assert_eq!(Median::Rated(4.5).label(), "4.5");
}

#[test]
fn rating_sort_puts_unrated_last() {
    let meals = vec![meal(1, 100), meal(2, 100), meal(3, 100)];
    let ratings = RatingIndex::from_reviews(&[review(1, 2, 1), review(2, 3, 5)]);
    assert_eq!(ids(&query::sort_by_rating(meals, &ratings)), vec![3, 2, 1]);
}

#[test]
fn allergy_filter_drops_meals_with_avoided_codes() {
    let mut nuts = meal(1, 100);
    nuts.allergens = BTreeSet::from(['N']);
    let plain = meal(2, 100);
    let mut fish = meal(3, 100);
    fish.allergens = BTreeSet::from(['F']);

    let avoided = BTreeSet::from(['N', 'G']);
    let kept = query::exclude_by_allergy(vec![nuts, plain, fish], 42, |user_id| {
        assert_eq!(user_id, 42);
        Ok::<_, ()>(avoided.clone())
    })
    .expect("filter");
    assert_eq!(ids(&kept), vec![2, 3]);
}

#[test]
fn allergy_lookup_errors_propagate() {
    let out = query::exclude_by_allergy(vec![meal(1, 100)], 1, |_| Err("gone"));
    assert_eq!(out, Err("gone"));
}

#[test]
fn weekly_plan_orders_monday_to_friday() {
    let mut fri = meal(1, 100);
    fri.weekday = Some(Weekday::Friday);
    let mut mon = meal(2, 100);
    mon.weekday = Some(Weekday::Monday);
    let unplanned = meal(3, 100);
    let mut wed = meal(4, 100);
    wed.weekday = Some(Weekday::Wednesday);

    let plan = query::weekly_plan(vec![fri, mon, unplanned, wed]);
    assert_eq!(ids(&plan), vec![2, 4, 1]);
}

proptest! {
    #[test]
    fn sorts_are_permutations_and_ordered(prices in prop::collection::vec(0u64..2_000, 0..40)) {
        let meals: Vec<Meal> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| meal(i as i64 + 1, *p))
            .collect();
        let sorted = query::sort_by_price(meals.clone());

        let mut before = ids(&meals);
        let mut after = ids(&sorted);
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);

        for pair in sorted.windows(2) {
            prop_assert!(
                (pair[0].price_cents, pair[0].id) < (pair[1].price_cents, pair[1].id)
            );
        }
    }

    #[test]
    fn median_lies_within_rating_range(mut ratings in prop::collection::vec(0u8..=5, 1..30)) {
        let lo = f64::from(*ratings.iter().min().unwrap());
        let hi = f64::from(*ratings.iter().max().unwrap());
        match query::median_of(&mut ratings) {
            Median::Rated(m) => prop_assert!(lo <= m && m <= hi),
            Median::Unrated => prop_assert!(false, "non-empty ratings must be rated"),
        }
    }

    #[test]
    fn allergy_filter_keeps_only_disjoint_meals(
        sets in prop::collection::vec(prop::collection::btree_set(prop::sample::select(vec!['F', 'N', 'G', 'M']), 0..3), 0..20),
        avoided in prop::collection::btree_set(prop::sample::select(vec!['F', 'N', 'G', 'M']), 0..3),
    ) {
        let meals: Vec<Meal> = sets
            .into_iter()
            .enumerate()
            .map(|(i, allergens)| Meal { allergens, ..meal(i as i64 + 1, 100) })
            .collect();
        let expected: Vec<i64> = meals
            .iter()
            .filter(|m| m.allergens.is_disjoint(&avoided))
            .map(|m| m.id)
            .collect();
        prop_assert_eq!(ids(&query::exclude_allergens(meals, &avoided)), expected);
    }
}
