//! Catalog records, drafts and patches for meals, reviews and users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    allergen::{self, AllergenSet},
    error::{CanteenError, CanteenResult},
    types::{MealId, MeatCategory, ReviewId, Role, UserId, Weekday},
};

/// Price in cents.
pub type Cents = u64;

/// Largest price a repository can store.
pub const MAX_PRICE_CENTS: Cents = i64::MAX.unsigned_abs();

/// Authoritative meal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    /// Stable meal identifier.
    pub id: MealId,
    /// Unique, non-empty display name.
    pub name: String,
    /// Price in cents.
    pub price_cents: Cents,
    /// Energy per portion, always positive.
    pub calories: u32,
    /// Contained allergen codes.
    pub allergens: AllergenSet,
    /// Meat content bucket.
    pub category: MeatCategory,
    /// Weekly plan slot, if planned.
    pub weekday: Option<Weekday>,
}

/// Insert payload used to create a new [`Meal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealDraft {
    /// Display name.
    pub name: String,
    /// Price in cents.
    pub price_cents: Cents,
    /// Energy per portion.
    pub calories: u32,
    /// Contained allergen codes.
    pub allergens: AllergenSet,
    /// Meat content bucket.
    pub category: MeatCategory,
}

impl MealDraft {
    /// Parses `[name, price, calories, allergens, category]` form input.
    pub fn parse(fields: &[String]) -> CanteenResult<Self> {
        let [name, price, calories, allergens, category] = fields else {
            return Err(CanteenError::validation(format!(
                "expected 5 meal fields, got {}",
                fields.len()
            )));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(CanteenError::validation("meal name is required"));
        }

        Ok(Self {
            name: name.to_string(),
            price_cents: parse_price(price)?,
            calories: parse_calories(calories)?,
            allergens: allergen::parse_allergens(allergens)?,
            category: parse_category(category)?,
        })
    }

    /// Materializes the record under `id`.
    pub fn into_meal(self, id: MealId) -> Meal {
        Meal {
            id,
            name: self.name,
            price_cents: self.price_cents,
            calories: self.calories,
            allergens: self.allergens,
            category: self.category,
            weekday: None,
        }
    }
}

/// Sparse patch where each `Some` field overwrites the record value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MealPatch {
    /// Optional replacement name.
    pub name: Option<String>,
    /// Optional replacement price.
    pub price_cents: Option<Cents>,
    /// Optional replacement calories.
    pub calories: Option<u32>,
    /// Optional replacement allergen set.
    pub allergens: Option<AllergenSet>,
    /// Optional replacement category.
    pub category: Option<MeatCategory>,
    /// `Some(None)` clears the plan slot.
    pub weekday: Option<Option<Weekday>>,
}

impl MealPatch {
    /// Full replacement of the editable fields from a draft.
    pub fn from_draft(draft: MealDraft) -> Self {
        Self {
            name: Some(draft.name),
            price_cents: Some(draft.price_cents),
            calories: Some(draft.calories),
            allergens: Some(draft.allergens),
            category: Some(draft.category),
            weekday: None,
        }
    }

    /// Patch touching only the plan slot.
    pub fn weekday(weekday: Option<Weekday>) -> Self {
        Self {
            weekday: Some(weekday),
            ..Self::default()
        }
    }

    /// Applies this patch in place to `meal`.
    pub fn apply_to(&self, meal: &mut Meal) {
        if let Some(v) = &self.name {
            meal.name = v.clone();
        }
        if let Some(v) = self.price_cents {
            meal.price_cents = v;
        }
        if let Some(v) = self.calories {
            meal.calories = v;
        }
        if let Some(v) = &self.allergens {
            meal.allergens = v.clone();
        }
        if let Some(v) = self.category {
            meal.category = v;
        }
        if let Some(v) = self.weekday {
            meal.weekday = v;
        }
    }
}

/// Rating left by a user on a meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Stable review identifier.
    pub id: ReviewId,
    /// Reviewed meal.
    pub meal_id: MealId,
    /// Rating in `0..=5`.
    pub rating: u8,
    /// Free text.
    pub comment: String,
    /// Owner of the review.
    pub author_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Insert payload used to create a new [`Review`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    /// Reviewed meal.
    pub meal_id: MealId,
    /// Rating in `0..=5`.
    pub rating: u8,
    /// Free text.
    pub comment: String,
    /// Owner of the review.
    pub author_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl ReviewDraft {
    /// Parses `[meal id, rating, comment]` form input for `author_id`.
    pub fn parse(fields: &[String], author_id: UserId, created_at: DateTime<Utc>) -> CanteenResult<Self> {
        let [meal_id, rating, comment] = fields else {
            return Err(CanteenError::validation(format!(
                "expected 3 review fields, got {}",
                fields.len()
            )));
        };

        let meal_id = parse_id(meal_id, "meal id")?;
        let rating: u8 = rating
            .trim()
            .parse()
            .map_err(|_| CanteenError::validation("rating must be a whole number"))?;
        if rating > 5 {
            return Err(CanteenError::validation("rating must be between 0 and 5"));
        }

        Ok(Self {
            meal_id,
            rating,
            comment: comment.trim().to_string(),
            author_id,
            created_at,
        })
    }

    /// Materializes the record under `id`.
    pub fn into_review(self, id: ReviewId) -> Review {
        Review {
            id,
            meal_id: self.meal_id,
            rating: self.rating,
            comment: self.comment,
            author_id: self.author_id,
            created_at: self.created_at,
        }
    }
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,
    /// Unique login name.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Opaque hash produced by the credential collaborator.
    pub password_hash: String,
    /// Authorization role.
    pub role: Role,
    /// Allergen codes this user avoids.
    pub allergies: AllergenSet,
}

/// Insert payload used to create a new [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    /// Unique login name.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Opaque password hash.
    pub password_hash: String,
    /// Authorization role.
    pub role: Role,
}

impl UserDraft {
    /// Materializes the record under `id` with no allergies.
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            allergies: AllergenSet::new(),
        }
    }
}

/// Sparse user patch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    /// Optional replacement name.
    pub name: Option<String>,
    /// Optional replacement email.
    pub email: Option<String>,
    /// Optional replacement password hash.
    pub password_hash: Option<String>,
    /// Optional replacement role.
    pub role: Option<Role>,
    /// Optional replacement avoidance set.
    pub allergies: Option<AllergenSet>,
}

impl UserPatch {
    /// Applies this patch in place to `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.name {
            user.name = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        if let Some(v) = &self.password_hash {
            user.password_hash = v.clone();
        }
        if let Some(v) = self.role {
            user.role = v;
        }
        if let Some(v) = &self.allergies {
            user.allergies = v.clone();
        }
    }
}

/// Validated `[name, password, email]` account form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountForm {
    /// Login name.
    pub name: String,
    /// Clear-text password, hashed before storage.
    pub password: String,
    /// Contact address.
    pub email: String,
}

impl AccountForm {
    /// Parses and validates the three account fields.
    pub fn parse(fields: &[String]) -> CanteenResult<Self> {
        let [name, password, email] = fields else {
            return Err(CanteenError::validation(format!(
                "expected 3 account fields, got {}",
                fields.len()
            )));
        };
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(CanteenError::validation("username is required"));
        }
        if password.is_empty() {
            return Err(CanteenError::validation("password is required"));
        }
        if !email.contains('@') {
            return Err(CanteenError::validation("email address is invalid"));
        }
        Ok(Self {
            name: name.to_string(),
            password: password.clone(),
            email: email.to_string(),
        })
    }
}

/// Parses `"3"`, `"3.5"`, `"3.50"` or `"3,50"` into cents.
pub fn parse_price(raw: &str) -> CanteenResult<Cents> {
    let raw = raw.trim().replace(',', ".");
    let invalid = || CanteenError::validation(format!("'{raw}' is not a valid price"));

    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw.as_str(), ""),
    };
    if whole.is_empty() || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: u64 = whole.parse().map_err(|_| invalid())?;
    let frac: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };
    whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(frac))
        .filter(|c| *c <= MAX_PRICE_CENTS)
        .ok_or_else(invalid)
}

/// Renders cents as `"3.50"`.
pub fn format_price(cents: Cents) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn parse_calories(raw: &str) -> CanteenResult<u32> {
    let calories: u32 = raw
        .trim()
        .parse()
        .map_err(|_| CanteenError::validation(format!("'{}' is not a valid calorie count", raw.trim())))?;
    if calories == 0 {
        return Err(CanteenError::validation("calories must be greater than zero"));
    }
    Ok(calories)
}

fn parse_category(raw: &str) -> CanteenResult<MeatCategory> {
    if raw.trim().is_empty() {
        return Err(CanteenError::validation("meat category is required"));
    }
    MeatCategory::parse(raw).ok_or_else(|| {
        CanteenError::validation(format!(
            "'{}' is not one of meat, vegetarian, vegan",
            raw.trim()
        ))
    })
}

/// Parses a numeric record id from form input.
pub fn parse_id(raw: &str, what: &str) -> CanteenResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| CanteenError::validation(format!("{what} must be a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn price_parsing() {
        assert_eq!(parse_price("3").unwrap(), 300);
        assert_eq!(parse_price("9.5").unwrap(), 950);
        assert_eq!(parse_price("3,05").unwrap(), 305);
        assert!(parse_price("-1").is_err());
        assert!(parse_price("1.234").is_err());
        assert!(parse_price("abc").is_err());
        assert!(parse_price("").is_err());
        assert_eq!(format_price(305), "3.05");
    }

    #[test]
    fn price_fits_signed_storage() {
        assert_eq!(parse_price("92233720368547758.07").unwrap(), MAX_PRICE_CENTS);
        assert!(matches!(
            parse_price("92233720368547758.08"),
            Err(CanteenError::Validation(_))
        ));
        assert!(matches!(
            MealDraft::parse(&fields(&["Gold", "100000000000000000", "1", "", "vegan"])),
            Err(CanteenError::Validation(_))
        ));
    }

    #[test]
    fn meal_draft_requires_every_field() {
        let draft = MealDraft::parse(&fields(&["Soup", "2.40", "320", "C,M", "Vegetarian"])).unwrap();
        assert_eq!(draft.price_cents, 240);
        assert_eq!(draft.category, MeatCategory::Vegetarian);
        assert!(draft.allergens.contains(&'C'));

        for bad in [
            fields(&["", "2", "1", "", "vegan"]),
            fields(&["Soup", "x", "1", "", "vegan"]),
            fields(&["Soup", "2", "0", "", "vegan"]),
            fields(&["Soup", "2", "1", "", ""]),
            fields(&["Soup", "2", "1", ""]),
        ] {
            assert!(matches!(MealDraft::parse(&bad), Err(CanteenError::Validation(_))));
        }
    }

    #[test]
    fn review_rating_range() {
        let now = Utc::now();
        assert!(ReviewDraft::parse(&fields(&["1", "5", "great"]), 1, now).is_ok());
        assert!(ReviewDraft::parse(&fields(&["1", "6", "too great"]), 1, now).is_err());
        assert!(ReviewDraft::parse(&fields(&["x", "3", ""]), 1, now).is_err());
    }
}
