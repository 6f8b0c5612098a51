//! Catalog query engine: pure sorting, filtering and rating aggregation.
//!
//! Every function takes a snapshot and returns a derived view; nothing here
//! touches the repository or the session.

use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::{
    allergen::AllergenSet,
    meal::{Meal, Review},
    types::{MealId, UserId},
};

/// Median rating of a meal, or the explicit unrated bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Median {
    /// Meal has no reviews.
    Unrated,
    /// Median in `0.0..=5.0`.
    Rated(f64),
}

impl Median {
    /// Rated value, if any.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Rated(v) => Some(v),
            Self::Unrated => None,
        }
    }

    /// Table label: `"4.5"` or `"unrated"`.
    pub fn label(self) -> String {
        match self {
            Self::Rated(v) => format!("{v:.1}"),
            Self::Unrated => "unrated".to_string(),
        }
    }

    /// Descending popularity order; unrated sorts after every rated value.
    fn popularity_cmp(self, other: Self) -> Ordering {
        match (self, other) {
            (Self::Rated(a), Self::Rated(b)) => b.total_cmp(&a),
            (Self::Rated(_), Self::Unrated) => Ordering::Less,
            (Self::Unrated, Self::Rated(_)) => Ordering::Greater,
            (Self::Unrated, Self::Unrated) => Ordering::Equal,
        }
    }
}

/// Median of `ratings`; the slice is sorted in place.
pub fn median_of(ratings: &mut [u8]) -> Median {
    if ratings.is_empty() {
        return Median::Unrated;
    }
    ratings.sort_unstable();
    let mid = ratings.len() / 2;
    if ratings.len() % 2 == 1 {
        Median::Rated(f64::from(ratings[mid]))
    } else {
        Median::Rated((f64::from(ratings[mid - 1]) + f64::from(ratings[mid])) / 2.0)
    }
}

/// Median rating of `meal_id` over `reviews`.
pub fn median_rating(meal_id: MealId, reviews: &[Review]) -> Median {
    let mut ratings: Vec<u8> = reviews
        .iter()
        .filter(|r| r.meal_id == meal_id)
        .map(|r| r.rating)
        .collect();
    median_of(&mut ratings)
}

/// Per-meal medians computed once from a review snapshot.
#[derive(Debug, Clone, Default)]
pub struct RatingIndex {
    medians: HashMap<MealId, Median>,
}

impl RatingIndex {
    /// Groups `reviews` by meal and computes each median.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut grouped: HashMap<MealId, Vec<u8>> = HashMap::new();
        for review in reviews {
            grouped.entry(review.meal_id).or_default().push(review.rating);
        }
        let medians = grouped
            .into_iter()
            .map(|(id, mut ratings)| (id, median_of(&mut ratings)))
            .collect();
        Self { medians }
    }

    /// Median for `meal_id`; [`Median::Unrated`] when it has no reviews.
    pub fn median(&self, meal_id: MealId) -> Median {
        self.medians.get(&meal_id).copied().unwrap_or(Median::Unrated)
    }
}

/// Ascending by price, ties by id.
pub fn sort_by_price(mut meals: Vec<Meal>) -> Vec<Meal> {
    meals.sort_by(|a, b| a.price_cents.cmp(&b.price_cents).then(a.id.cmp(&b.id)));
    meals
}

/// Ordinal ascending by name, ties by id.
pub fn sort_by_name(mut meals: Vec<Meal>) -> Vec<Meal> {
    meals.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    meals
}

/// Ascending by calories, ties by id.
pub fn sort_by_calories(mut meals: Vec<Meal>) -> Vec<Meal> {
    meals.sort_by(|a, b| a.calories.cmp(&b.calories).then(a.id.cmp(&b.id)));
    meals
}

/// Descending by median rating, unrated meals last, ties by id.
pub fn sort_by_rating(mut meals: Vec<Meal>, ratings: &RatingIndex) -> Vec<Meal> {
    meals.sort_by(|a, b| {
        ratings
            .median(a.id)
            .popularity_cmp(ratings.median(b.id))
            .then(a.id.cmp(&b.id))
    });
    meals
}

/// Keeps meals sharing no allergen with `avoided`, in input order.
pub fn exclude_allergens(meals: Vec<Meal>, avoided: &AllergenSet) -> Vec<Meal> {
    if avoided.is_empty() {
        return meals;
    }
    meals
        .into_iter()
        .filter(|meal| meal.allergens.is_disjoint(avoided))
        .collect()
}

/// [`exclude_allergens`] with the avoidance set fetched for `user_id`.
pub fn exclude_by_allergy<E>(
    meals: Vec<Meal>,
    user_id: UserId,
    allergies: impl FnOnce(UserId) -> Result<AllergenSet, E>,
) -> Result<Vec<Meal>, E> {
    let avoided = allergies(user_id)?;
    Ok(exclude_allergens(meals, &avoided))
}

/// Planned meals ordered Monday to Friday; equal weekdays keep input order.
pub fn weekly_plan(meals: Vec<Meal>) -> Vec<Meal> {
    let mut planned: Vec<Meal> = meals.into_iter().filter(|m| m.weekday.is_some()).collect();
    planned.sort_by_key(|m| m.weekday.map(|d| d.sort_order()));
    planned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_even_and_empty() {
        assert_eq!(median_of(&mut [3, 5]), Median::Rated(4.0));
        assert_eq!(median_of(&mut [5, 2, 4]), Median::Rated(4.0));
        assert_eq!(median_of(&mut []), Median::Unrated);
    }

    #[test]
    fn unrated_sorts_after_rated() {
        assert_eq!(Median::Rated(0.0).popularity_cmp(Median::Unrated), Ordering::Less);
        assert_eq!(Median::Rated(5.0).popularity_cmp(Median::Rated(1.0)), Ordering::Less);
    }
}
