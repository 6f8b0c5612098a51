//! Repository collaborator trait with in-memory and SQLite implementations.

pub mod sqlite;

use std::sync::Mutex;

use crate::{
    allergen::AllergenSet,
    core::{lock, store::CatalogStore},
    error::RepoResult,
    meal::{Meal, MealDraft, MealPatch, Review, ReviewDraft, User, UserDraft, UserPatch},
    types::{MealId, ReviewId, UserId},
};

/// Data source/sink for meals, reviews, users and the weekly plan.
///
/// Lookups by id fail with [`crate::error::RepoError::NotFound`]; inserts and renames that
/// collide on a unique name fail with [`crate::error::RepoError::AlreadyExists`].
pub trait Repository: Send + Sync {
    /// All meals ordered by id.
    fn list_meals(&self) -> RepoResult<Vec<Meal>>;
    /// Meal by id.
    fn get_meal(&self, id: MealId) -> RepoResult<Meal>;
    /// Meal by exact name.
    fn find_meal_by_name(&self, name: &str) -> RepoResult<Option<Meal>>;
    /// Stores a new meal.
    fn insert_meal(&self, draft: MealDraft) -> RepoResult<Meal>;
    /// Applies `patch` to an existing meal.
    fn update_meal(&self, id: MealId, patch: &MealPatch) -> RepoResult<Meal>;
    /// Deletes a meal and its reviews.
    fn delete_meal(&self, id: MealId) -> RepoResult<()>;
    /// Clears every weekly plan slot, returning the number of meals changed.
    fn clear_weekdays(&self) -> RepoResult<usize>;

    /// All reviews ordered by id.
    fn list_reviews(&self) -> RepoResult<Vec<Review>>;
    /// Reviews of one meal ordered by id.
    fn reviews_for_meal(&self, meal_id: MealId) -> RepoResult<Vec<Review>>;
    /// Review by id.
    fn get_review(&self, id: ReviewId) -> RepoResult<Review>;
    /// Stores a review; the meal must exist.
    fn insert_review(&self, draft: ReviewDraft) -> RepoResult<Review>;
    /// Deletes a review.
    fn delete_review(&self, id: ReviewId) -> RepoResult<()>;

    /// All users ordered by id.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// User by id.
    fn get_user(&self, id: UserId) -> RepoResult<User>;
    /// User by exact name.
    fn find_user_by_name(&self, name: &str) -> RepoResult<Option<User>>;
    /// Stores a new user.
    fn insert_user(&self, draft: UserDraft) -> RepoResult<User>;
    /// Applies `patch` to an existing user.
    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<User>;
    /// Deletes a user.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;

    /// Allergen codes the user avoids.
    fn user_allergies(&self, id: UserId) -> RepoResult<AllergenSet> {
        self.get_user(id).map(|u| u.allergies)
    }
}

/// [`Repository`] backed by a [`CatalogStore`] behind a mutex.
#[derive(Debug)]
pub struct MemoryRepository {
    store: Mutex<CatalogStore>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self {
            store: Mutex::new(CatalogStore::new()),
        }
    }
}

impl Repository for MemoryRepository {
    fn list_meals(&self) -> RepoResult<Vec<Meal>> {
        Ok(lock(&self.store).meals())
    }

    fn get_meal(&self, id: MealId) -> RepoResult<Meal> {
        lock(&self.store).meal(id).cloned()
    }

    fn find_meal_by_name(&self, name: &str) -> RepoResult<Option<Meal>> {
        Ok(lock(&self.store).meal_by_name(name).cloned())
    }

    fn insert_meal(&self, draft: MealDraft) -> RepoResult<Meal> {
        lock(&self.store).insert_meal(draft)
    }

    fn update_meal(&self, id: MealId, patch: &MealPatch) -> RepoResult<Meal> {
        lock(&self.store).patch_meal(id, patch)
    }

    fn delete_meal(&self, id: MealId) -> RepoResult<()> {
        lock(&self.store).remove_meal(id)
    }

    fn clear_weekdays(&self) -> RepoResult<usize> {
        Ok(lock(&self.store).clear_weekdays())
    }

    fn list_reviews(&self) -> RepoResult<Vec<Review>> {
        Ok(lock(&self.store).reviews())
    }

    fn reviews_for_meal(&self, meal_id: MealId) -> RepoResult<Vec<Review>> {
        Ok(lock(&self.store).reviews_for_meal(meal_id))
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Review> {
        lock(&self.store).review(id).cloned()
    }

    fn insert_review(&self, draft: ReviewDraft) -> RepoResult<Review> {
        lock(&self.store).insert_review(draft)
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        lock(&self.store).remove_review(id)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(lock(&self.store).users())
    }

    fn get_user(&self, id: UserId) -> RepoResult<User> {
        lock(&self.store).user(id).cloned()
    }

    fn find_user_by_name(&self, name: &str) -> RepoResult<Option<User>> {
        Ok(lock(&self.store).user_by_name(name).cloned())
    }

    fn insert_user(&self, draft: UserDraft) -> RepoResult<User> {
        lock(&self.store).insert_user(draft)
    }

    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<User> {
        lock(&self.store).patch_user(id, patch)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        lock(&self.store).remove_user(id)
    }

    fn user_allergies(&self, id: UserId) -> RepoResult<AllergenSet> {
        lock(&self.store).allergies(id)
    }
}

