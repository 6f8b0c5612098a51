//! Review listing, creation and deletion.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::{
    error::{BusError, CanteenError, CanteenResult},
    meal::{Review, ReviewDraft},
    present::Screen,
    runtime::{
        bus::EventBus,
        events::{EventName, Payload},
    },
    types::{MealId, MenuState, ReviewId},
};

use super::{Action, Deps, attach_routes, report};

/// Handlers of the review menu.
pub struct ReviewController {
    deps: Deps,
}

impl ReviewController {
    const ROUTES: &'static [(EventName, Action<Self>)] = &[
        (EventName::ShowReviews, Self::on_show_reviews),
        (EventName::AddReview, Self::on_add_review),
        (EventName::DeleteReview, Self::on_delete_review),
    ];

    /// Controller over `deps`.
    pub fn new(deps: Deps) -> Self {
        Self { deps }
    }

    /// Binds the route table.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        attach_routes(self, bus, Self::ROUTES);
    }

    /// Reviews of an existing meal, oldest first.
    pub fn reviews(&self, meal_id: MealId) -> CanteenResult<Vec<Review>> {
        self.deps.repo.get_meal(meal_id)?;
        let mut reviews = self.deps.repo.reviews_for_meal(meal_id)?;
        reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(reviews)
    }

    /// Stores `[meal id, rating, comment]` as the current user's review.
    pub fn add_review(&self, fields: &[String]) -> CanteenResult<Review> {
        let author_id = self.deps.session.current_user_id()?;
        let draft = ReviewDraft::parse(fields, author_id, Utc::now())?;
        let review = self.deps.repo.insert_review(draft)?;
        info!(review_id = review.id, meal_id = review.meal_id, "review added");
        Ok(review)
    }

    /// Deletes a review owned by the current user, or any review as admin.
    pub fn delete_review(&self, id: ReviewId) -> CanteenResult<()> {
        let session = self.deps.session.snapshot();
        let user_id = session.current_user_id()?;
        let review = self.deps.repo.get_review(id)?;
        if review.author_id != user_id && !session.is_admin() {
            return Err(CanteenError::unauthorized("delete other users' reviews"));
        }
        self.deps.repo.delete_review(id)?;
        info!(review_id = id, by = user_id, "review deleted");
        Ok(())
    }

    fn on_show_reviews(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let meal_id = payload.expect_int(EventName::ShowReviews)?;
        let outcome = self.reviews(meal_id).map(|reviews| {
            self.deps
                .presenter
                .render_screen(MenuState::ReviewMenu, Screen::Reviews { meal_id, reviews });
            None
        });
        report(bus, EventName::ShowReviews, outcome)
    }

    fn on_add_review(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let fields = payload.expect_strings(EventName::AddReview)?;
        let outcome = self
            .add_review(fields)
            .map(|_| Some("Thanks for your review.".to_string()));
        report(bus, EventName::AddReview, outcome)
    }

    fn on_delete_review(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let id = payload.expect_int(EventName::DeleteReview)?;
        let outcome = self
            .delete_review(id)
            .map(|()| Some("Review deleted.".to_string()));
        report(bus, EventName::DeleteReview, outcome)
    }
}
