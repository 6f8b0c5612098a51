use hashbrown::HashMap;

use crate::{
    allergen::AllergenSet,
    error::{RepoError, RepoResult},
    meal::{Meal, MealDraft, MealPatch, Review, ReviewDraft, User, UserDraft, UserPatch},
    types::{MealId, ReviewId, UserId},
};

use super::indices::{remove_from_vec_index, UniqueIndex, VecIndex};

/// Authoritative in-memory tables with name and review indices.
///
/// Ids are monotonic, so the order vectors are also ascending by id.
#[derive(Debug, Default)]
pub struct CatalogStore {
    meals: HashMap<MealId, Meal>,
    meal_order: Vec<MealId>,
    meal_by_name: UniqueIndex,
    reviews: HashMap<ReviewId, Review>,
    review_order: Vec<ReviewId>,
    reviews_by_meal: VecIndex<MealId>,
    users: HashMap<UserId, User>,
    user_order: Vec<UserId>,
    user_by_name: UniqueIndex,
    next_meal_id: MealId,
    next_review_id: ReviewId,
    next_user_id: UserId,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            next_meal_id: 1,
            next_review_id: 1,
            next_user_id: 1,
            ..Self::default()
        }
    }

    pub fn meals(&self) -> Vec<Meal> {
        self.meal_order
            .iter()
            .filter_map(|id| self.meals.get(id).cloned())
            .collect()
    }

    pub fn meal(&self, id: MealId) -> RepoResult<&Meal> {
        self.meals.get(&id).ok_or(RepoError::NotFound { entity: "meal", id })
    }

    pub fn meal_by_name(&self, name: &str) -> Option<&Meal> {
        self.meal_by_name.get(name).and_then(|id| self.meals.get(id))
    }

    pub fn insert_meal(&mut self, draft: MealDraft) -> RepoResult<Meal> {
        if self.meal_by_name.contains_key(&draft.name) {
            return Err(RepoError::AlreadyExists {
                entity: "meal",
                key: draft.name,
            });
        }

        let id = self.next_meal_id;
        self.next_meal_id += 1;
        let meal = draft.into_meal(id);
        self.meal_by_name.insert(meal.name.clone(), id);
        self.meal_order.push(id);
        self.meals.insert(id, meal.clone());
        Ok(meal)
    }

    pub fn patch_meal(&mut self, id: MealId, patch: &MealPatch) -> RepoResult<Meal> {
        if let Some(name) = &patch.name {
            if self.meal_by_name.get(name).is_some_and(|owner| *owner != id) {
                return Err(RepoError::AlreadyExists {
                    entity: "meal",
                    key: name.clone(),
                });
            }
        }

        let meal = self
            .meals
            .get_mut(&id)
            .ok_or(RepoError::NotFound { entity: "meal", id })?;
        let old_name = meal.name.clone();
        patch.apply_to(meal);

        if meal.name != old_name {
            self.meal_by_name.remove(&old_name);
            self.meal_by_name.insert(meal.name.clone(), id);
        }
        Ok(meal.clone())
    }

    /// Removes the meal together with its reviews.
    pub fn remove_meal(&mut self, id: MealId) -> RepoResult<()> {
        let meal = self
            .meals
            .remove(&id)
            .ok_or(RepoError::NotFound { entity: "meal", id })?;
        self.meal_by_name.remove(&meal.name);
        remove_from_vec_index(&mut self.meal_order, id);

        for review_id in self.reviews_by_meal.remove(&id).unwrap_or_default() {
            self.reviews.remove(&review_id);
            remove_from_vec_index(&mut self.review_order, review_id);
        }
        Ok(())
    }

    /// Clears every plan slot, returning how many meals changed.
    pub fn clear_weekdays(&mut self) -> usize {
        let mut cleared = 0;
        for meal in self.meals.values_mut() {
            if meal.weekday.take().is_some() {
                cleared += 1;
            }
        }
        cleared
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.review_order
            .iter()
            .filter_map(|id| self.reviews.get(id).cloned())
            .collect()
    }

    pub fn reviews_for_meal(&self, meal_id: MealId) -> Vec<Review> {
        self.reviews_by_meal
            .get(&meal_id)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.reviews.get(id).cloned())
            .collect()
    }

    pub fn review(&self, id: ReviewId) -> RepoResult<&Review> {
        self.reviews
            .get(&id)
            .ok_or(RepoError::NotFound { entity: "review", id })
    }

    pub fn insert_review(&mut self, draft: ReviewDraft) -> RepoResult<Review> {
        self.meal(draft.meal_id)?;

        let id = self.next_review_id;
        self.next_review_id += 1;
        let review = draft.into_review(id);
        self.reviews_by_meal
            .entry(review.meal_id)
            .or_default()
            .push(id);
        self.review_order.push(id);
        self.reviews.insert(id, review.clone());
        Ok(review)
    }

    pub fn remove_review(&mut self, id: ReviewId) -> RepoResult<()> {
        let review = self
            .reviews
            .remove(&id)
            .ok_or(RepoError::NotFound { entity: "review", id })?;
        if let Some(ids) = self.reviews_by_meal.get_mut(&review.meal_id) {
            remove_from_vec_index(ids, id);
        }
        remove_from_vec_index(&mut self.review_order, id);
        Ok(())
    }

    pub fn users(&self) -> Vec<User> {
        self.user_order
            .iter()
            .filter_map(|id| self.users.get(id).cloned())
            .collect()
    }

    pub fn user(&self, id: UserId) -> RepoResult<&User> {
        self.users.get(&id).ok_or(RepoError::NotFound { entity: "user", id })
    }

    pub fn user_by_name(&self, name: &str) -> Option<&User> {
        self.user_by_name.get(name).and_then(|id| self.users.get(id))
    }

    pub fn insert_user(&mut self, draft: UserDraft) -> RepoResult<User> {
        if self.user_by_name.contains_key(&draft.name) {
            return Err(RepoError::AlreadyExists {
                entity: "user",
                key: draft.name,
            });
        }

        let id = self.next_user_id;
        self.next_user_id += 1;
        let user = draft.into_user(id);
        self.user_by_name.insert(user.name.clone(), id);
        self.user_order.push(id);
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn patch_user(&mut self, id: UserId, patch: &UserPatch) -> RepoResult<User> {
        if let Some(name) = &patch.name {
            if self.user_by_name.get(name).is_some_and(|owner| *owner != id) {
                return Err(RepoError::AlreadyExists {
                    entity: "user",
                    key: name.clone(),
                });
            }
        }

        let user = self
            .users
            .get_mut(&id)
            .ok_or(RepoError::NotFound { entity: "user", id })?;
        let old_name = user.name.clone();
        patch.apply_to(user);

        if user.name != old_name {
            self.user_by_name.remove(&old_name);
            self.user_by_name.insert(user.name.clone(), id);
        }
        Ok(user.clone())
    }

    pub fn allergies(&self, id: UserId) -> RepoResult<AllergenSet> {
        self.user(id).map(|u| u.allergies.clone())
    }

    /// Removes the user; their reviews stay attributed to the old id.
    pub fn remove_user(&mut self, id: UserId) -> RepoResult<()> {
        let user = self
            .users
            .remove(&id)
            .ok_or(RepoError::NotFound { entity: "user", id })?;
        self.user_by_name.remove(&user.name);
        remove_from_vec_index(&mut self.user_order, id);
        Ok(())
    }
}
