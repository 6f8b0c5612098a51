//! Weekly plan display and curation.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::{
    core::lock,
    error::{BusError, CanteenError, CanteenResult},
    meal::{Meal, MealPatch},
    present::{MealRow, Screen},
    query::{self, RatingIndex},
    runtime::{
        bus::EventBus,
        events::{EventName, Payload},
    },
    types::{MealId, MenuState, Weekday},
};

use super::{Action, Deps, attach_routes, report};

/// Handlers of the weekly menu.
///
/// Remembers which weekday is being edited so a later submit knows where
/// the chosen meal goes.
pub struct WeeklyController {
    deps: Deps,
    editing: Mutex<Option<Weekday>>,
}

impl WeeklyController {
    const ROUTES: &'static [(EventName, Action<Self>)] = &[
        (EventName::ShowWeeklyPlan, Self::on_show_plan),
        (EventName::EditWeeklyPlanWeekday, Self::on_edit_weekday),
        (EventName::SubmitWeeklyPlanMeal, Self::on_submit_meal),
        (EventName::ResetWeeklyPlan, Self::on_reset_plan),
    ];

    /// Controller over `deps` with no weekday selected.
    pub fn new(deps: Deps) -> Self {
        Self {
            deps,
            editing: Mutex::new(None),
        }
    }

    /// Binds the route table.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        attach_routes(self, bus, Self::ROUTES);
    }

    /// Planned meals Monday to Friday.
    pub fn plan(&self) -> CanteenResult<Vec<Meal>> {
        Ok(query::weekly_plan(self.deps.repo.list_meals()?))
    }

    /// Weekday currently being edited.
    pub fn editing(&self) -> Option<Weekday> {
        *lock(&self.editing)
    }

    /// Selects the weekday for ordinal `1..=5`.
    pub fn select_weekday(&self, ordinal: i64) -> CanteenResult<Weekday> {
        let weekday = Weekday::from_ordinal(ordinal).ok_or_else(|| {
            CanteenError::validation(format!("weekday must be between 1 and 5, got {ordinal}"))
        })?;
        *lock(&self.editing) = Some(weekday);
        Ok(weekday)
    }

    /// Puts `meal_id` on the selected weekday; admin only.
    pub fn submit_meal(&self, meal_id: MealId) -> CanteenResult<Meal> {
        self.deps.session.require_admin("edit the weekly plan")?;
        let weekday = self
            .editing()
            .ok_or_else(|| CanteenError::validation("choose a weekday first"))?;
        let meal = self
            .deps
            .repo
            .update_meal(meal_id, &MealPatch::weekday(Some(weekday)))?;
        info!(meal_id, %weekday, "meal planned");
        Ok(meal)
    }

    /// Clears every plan slot; admin only.
    pub fn reset_plan(&self) -> CanteenResult<usize> {
        self.deps.session.require_admin("reset the weekly plan")?;
        let cleared = self.deps.repo.clear_weekdays()?;
        *lock(&self.editing) = None;
        info!(cleared, "weekly plan reset");
        Ok(cleared)
    }

    fn ratings(&self) -> CanteenResult<RatingIndex> {
        Ok(RatingIndex::from_reviews(&self.deps.repo.list_reviews()?))
    }

    fn on_show_plan(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        payload.expect_none(EventName::ShowWeeklyPlan)?;
        let outcome = self.plan().and_then(|meals| {
            let ratings = self.ratings()?;
            let rows = meals.iter().map(|m| MealRow::new(m, &ratings)).collect();
            self.deps
                .presenter
                .render_screen(MenuState::WeeklyMenu, Screen::WeeklyPlan(rows));
            Ok(None)
        });
        report(bus, EventName::ShowWeeklyPlan, outcome)
    }

    fn on_edit_weekday(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let ordinal = payload.expect_int(EventName::EditWeeklyPlanWeekday)?;
        let outcome = self.select_weekday(ordinal).and_then(|weekday| {
            let meals = query::sort_by_name(self.deps.repo.list_meals()?);
            let ratings = self.ratings()?;
            let rows = meals.iter().map(|m| MealRow::new(m, &ratings)).collect();
            self.deps
                .presenter
                .render_screen(MenuState::WeeklyMenu, Screen::WeekdayEditor { weekday, rows });
            Ok(None)
        });
        report(bus, EventName::EditWeeklyPlanWeekday, outcome)
    }

    fn on_submit_meal(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let meal_id = payload.expect_int(EventName::SubmitWeeklyPlanMeal)?;
        let outcome = self.submit_meal(meal_id).map(|meal| {
            let weekday = meal.weekday.map_or("-", Weekday::name);
            Some(format!("'{}' is planned for {weekday}.", meal.name))
        });
        report(bus, EventName::SubmitWeeklyPlanMeal, outcome)
    }

    fn on_reset_plan(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        payload.expect_none(EventName::ResetWeeklyPlan)?;
        let outcome = self
            .reset_plan()
            .map(|_| Some("The weekly plan was reset.".to_string()));
        report(bus, EventName::ResetWeeklyPlan, outcome)
    }
}
