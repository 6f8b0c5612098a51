//! Meal catalog browsing, sorting and curation.

use std::sync::Arc;

use tracing::info;

use crate::{
    error::{BusError, CanteenError, CanteenResult},
    meal::{Meal, MealDraft, MealPatch, parse_id},
    present::Screen,
    query::{self, RatingIndex},
    runtime::{
        bus::EventBus,
        events::{EventName, Payload},
    },
    types::{MealId, MenuState},
};

use super::{Action, Deps, attach_routes, report};

/// Orderings offered by the meal menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealSort {
    /// Ascending price.
    Price,
    /// Ordinal name order.
    Name,
    /// Ascending calories.
    Calories,
    /// Descending median rating.
    Rating,
    /// Catalog without the current user's avoided allergens.
    Allergy,
}

impl MealSort {
    fn title(self) -> &'static str {
        match self {
            Self::Price => "Meals by price",
            Self::Name => "Meals by name",
            Self::Calories => "Meals by calories",
            Self::Rating => "Meals by rating",
            Self::Allergy => "Meals without your allergens",
        }
    }
}

/// Handlers of the meal menu.
pub struct MealController {
    deps: Deps,
}

impl MealController {
    const ROUTES: &'static [(EventName, Action<Self>)] = &[
        (EventName::ShowMeals, Self::on_show_meals),
        (EventName::ShowMealDetails, Self::on_show_details),
        (EventName::AddMeal, Self::on_add_meal),
        (EventName::EditMeal, Self::on_edit_meal),
        (EventName::DeleteMeal, Self::on_delete_meal),
        (EventName::SortMealsByPrice, Self::on_sort_by_price),
        (EventName::SortMealsByName, Self::on_sort_by_name),
        (EventName::SortMealsByCalories, Self::on_sort_by_calories),
        (EventName::SortMealsByRating, Self::on_sort_by_rating),
        (EventName::SortMealsByAllergy, Self::on_sort_by_allergy),
    ];

    /// Controller over `deps`.
    pub fn new(deps: Deps) -> Self {
        Self { deps }
    }

    /// Binds the route table.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        attach_routes(self, bus, Self::ROUTES);
    }

    /// Catalog in the requested order.
    pub fn sorted_meals(&self, sort: MealSort) -> CanteenResult<Vec<Meal>> {
        let meals = self.deps.repo.list_meals()?;
        Ok(match sort {
            MealSort::Price => query::sort_by_price(meals),
            MealSort::Name => query::sort_by_name(meals),
            MealSort::Calories => query::sort_by_calories(meals),
            MealSort::Rating => {
                let ratings = RatingIndex::from_reviews(&self.deps.repo.list_reviews()?);
                query::sort_by_rating(meals, &ratings)
            }
            MealSort::Allergy => {
                let user_id = self.deps.session.current_user_id()?;
                query::exclude_by_allergy(meals, user_id, |id| self.deps.repo.user_allergies(id))?
            }
        })
    }

    /// Validates and stores a new meal; admin only.
    pub fn add_meal(&self, fields: &[String]) -> CanteenResult<Meal> {
        self.deps.session.require_admin("add meals")?;
        let draft = MealDraft::parse(fields)?;
        if self.deps.repo.find_meal_by_name(&draft.name)?.is_some() {
            return Err(CanteenError::AlreadyExists {
                entity: "meal",
                key: draft.name,
            });
        }
        let meal = self.deps.repo.insert_meal(draft)?;
        info!(meal_id = meal.id, name = %meal.name, "meal added");
        Ok(meal)
    }

    /// Replaces the editable fields from `[id, name, price, calories, allergens, category]`; admin only.
    pub fn edit_meal(&self, fields: &[String]) -> CanteenResult<Meal> {
        self.deps.session.require_admin("edit meals")?;
        let Some((id, rest)) = fields.split_first() else {
            return Err(CanteenError::validation("meal id is required"));
        };
        let id = parse_id(id, "meal id")?;
        let draft = MealDraft::parse(rest)?;
        let meal = self.deps.repo.update_meal(id, &MealPatch::from_draft(draft))?;
        info!(meal_id = meal.id, "meal edited");
        Ok(meal)
    }

    /// Deletes a meal and its reviews; admin only.
    pub fn delete_meal(&self, id: MealId) -> CanteenResult<Meal> {
        self.deps.session.require_admin("delete meals")?;
        let meal = self.deps.repo.get_meal(id)?;
        self.deps.repo.delete_meal(id)?;
        info!(meal_id = id, "meal deleted");
        Ok(meal)
    }

    /// Detail screen for one meal.
    pub fn meal_details(&self, id: MealId) -> CanteenResult<Screen> {
        let meal = self.deps.repo.get_meal(id)?;
        let reviews = self.deps.repo.reviews_for_meal(id)?;
        let median = query::median_rating(id, &reviews);
        Ok(Screen::meal_details(&meal, median, reviews))
    }

    fn render_table(&self, title: &str, meals: &[Meal]) -> CanteenResult<()> {
        let ratings = RatingIndex::from_reviews(&self.deps.repo.list_reviews()?);
        self.deps
            .presenter
            .render_screen(MenuState::MealMenu, Screen::meal_table(title, meals, &ratings));
        Ok(())
    }

    fn show_sorted(&self, bus: &EventBus, event: EventName, payload: &Payload, sort: MealSort) -> Result<(), BusError> {
        payload.expect_none(event)?;
        let outcome = self
            .sorted_meals(sort)
            .and_then(|meals| self.render_table(sort.title(), &meals))
            .map(|()| None);
        report(bus, event, outcome)
    }

    fn on_show_meals(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        payload.expect_none(EventName::ShowMeals)?;
        let outcome = self
            .deps
            .repo
            .list_meals()
            .map_err(CanteenError::from)
            .and_then(|meals| self.render_table("All meals", &meals))
            .map(|()| None);
        report(bus, EventName::ShowMeals, outcome)
    }

    fn on_show_details(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let id = payload.expect_int(EventName::ShowMealDetails)?;
        let outcome = self.meal_details(id).map(|screen| {
            self.deps.presenter.render_screen(MenuState::MealMenu, screen);
            None
        });
        report(bus, EventName::ShowMealDetails, outcome)
    }

    fn on_add_meal(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let fields = payload.expect_strings(EventName::AddMeal)?;
        let outcome = self
            .add_meal(fields)
            .map(|meal| Some(format!("Meal '{}' added.", meal.name)));
        report(bus, EventName::AddMeal, outcome)
    }

    fn on_edit_meal(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let fields = payload.expect_strings(EventName::EditMeal)?;
        let outcome = self
            .edit_meal(fields)
            .map(|meal| Some(format!("Meal '{}' updated.", meal.name)));
        report(bus, EventName::EditMeal, outcome)
    }

    fn on_delete_meal(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let id = payload.expect_int(EventName::DeleteMeal)?;
        let outcome = self
            .delete_meal(id)
            .map(|meal| Some(format!("Meal '{}' deleted.", meal.name)));
        report(bus, EventName::DeleteMeal, outcome)
    }

    fn on_sort_by_price(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        self.show_sorted(bus, EventName::SortMealsByPrice, payload, MealSort::Price)
    }

    fn on_sort_by_name(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        self.show_sorted(bus, EventName::SortMealsByName, payload, MealSort::Name)
    }

    fn on_sort_by_calories(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        self.show_sorted(bus, EventName::SortMealsByCalories, payload, MealSort::Calories)
    }

    fn on_sort_by_rating(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        self.show_sorted(bus, EventName::SortMealsByRating, payload, MealSort::Rating)
    }

    fn on_sort_by_allergy(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        self.show_sorted(bus, EventName::SortMealsByAllergy, payload, MealSort::Allergy)
    }
}
