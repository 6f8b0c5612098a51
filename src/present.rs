//! Presentation collaborator boundary.
//!
//! The core only tells the presenter what to show; it never inspects what
//! the presenter did with it.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::{
    allergen,
    meal::{Meal, Review, User, format_price},
    query::{Median, RatingIndex},
    types::{MenuState, Weekday},
};

/// One row of a meal table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealRow {
    /// Meal id.
    pub id: i64,
    /// Meal name.
    pub name: String,
    /// Formatted price, e.g. `"3.50"`.
    pub price: String,
    /// Calories per portion.
    pub calories: u32,
    /// Comma separated allergen names.
    pub allergens: String,
    /// Meat category label.
    pub category: &'static str,
    /// Median label, e.g. `"4.5"` or `"unrated"`.
    pub rating: String,
    /// Planned weekday, if any.
    pub weekday: Option<Weekday>,
}

impl MealRow {
    /// Row for `meal` using medians from `ratings`.
    pub fn new(meal: &Meal, ratings: &RatingIndex) -> Self {
        Self::with_median(meal, ratings.median(meal.id))
    }

    /// Row for `meal` with an already computed median.
    pub fn with_median(meal: &Meal, median: Median) -> Self {
        Self {
            id: meal.id,
            name: meal.name.clone(),
            price: format_price(meal.price_cents),
            calories: meal.calories,
            allergens: allergen::describe(&meal.allergens),
            category: meal.category.as_str(),
            rating: median.label(),
            weekday: meal.weekday,
        }
    }
}

/// One row of the account table; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    /// User id.
    pub id: i64,
    /// Login name.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Role label.
    pub role: &'static str,
    /// Comma separated avoided allergen names.
    pub allergies: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.as_str(),
            allergies: allergen::describe(&user.allergies),
        }
    }
}

/// Data handed to the presenter alongside the menu state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Screen {
    /// Entry screen of a menu.
    Menu(MenuState),
    /// Titled meal table.
    MealTable {
        /// Table heading.
        title: String,
        /// Rows in display order.
        rows: Vec<MealRow>,
    },
    /// One meal with its reviews.
    MealDetails {
        /// Summary row, including the median label.
        meal: MealRow,
        /// Reviews oldest first.
        reviews: Vec<Review>,
    },
    /// Reviews of one meal.
    Reviews {
        /// Reviewed meal.
        meal_id: i64,
        /// Reviews oldest first.
        reviews: Vec<Review>,
    },
    /// Account table.
    UserTable(Vec<UserRow>),
    /// Planned meals Monday to Friday.
    WeeklyPlan(Vec<MealRow>),
    /// Meal picker for the weekday being edited.
    WeekdayEditor {
        /// Weekday being edited.
        weekday: Weekday,
        /// Candidate meals.
        rows: Vec<MealRow>,
    },
    /// Recoverable failure message.
    Error(String),
    /// Confirmation message.
    Success(String),
}

impl Screen {
    /// Meal table from meals in display order.
    pub fn meal_table(title: impl Into<String>, meals: &[Meal], ratings: &RatingIndex) -> Self {
        Self::MealTable {
            title: title.into(),
            rows: meals.iter().map(|m| MealRow::new(m, ratings)).collect(),
        }
    }

    /// Detail view of `meal`.
    pub fn meal_details(meal: &Meal, median: Median, reviews: Vec<Review>) -> Self {
        Self::MealDetails {
            meal: MealRow::with_median(meal, median),
            reviews,
        }
    }
}

/// Renders screens; implemented outside the core.
pub trait Presenter: Send + Sync {
    /// Shows `screen` for `state`.
    fn render_screen(&self, state: MenuState, screen: Screen);
    /// Dismisses whatever is currently displayed.
    fn close_active_screen(&self);
}

/// Presenter output forwarded to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScreenEvent {
    /// A screen was rendered.
    Rendered {
        /// Menu state the screen belongs to.
        state: MenuState,
        /// Screen data.
        screen: Screen,
    },
    /// The active screen was closed.
    Closed,
}

/// [`Presenter`] that publishes every call on a broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: broadcast::Sender<ScreenEvent>,
}

impl ChannelPresenter {
    /// Presenter buffering up to `capacity` unseen events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sender side, shared with the runtime handle.
    pub fn sender(&self) -> broadcast::Sender<ScreenEvent> {
        self.tx.clone()
    }

    /// New receiver of presenter output.
    pub fn subscribe(&self) -> broadcast::Receiver<ScreenEvent> {
        self.tx.subscribe()
    }
}

impl Presenter for ChannelPresenter {
    fn render_screen(&self, state: MenuState, screen: Screen) {
        let _ = self.tx.send(ScreenEvent::Rendered { state, screen });
    }

    fn close_active_screen(&self) {
        let _ = self.tx.send(ScreenEvent::Closed);
    }
}
