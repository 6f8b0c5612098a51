//! Shared primitive IDs and catalog-related enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Meal identifier assigned by the repository.
pub type MealId = i64;
/// Review identifier assigned by the repository.
pub type ReviewId = i64;
/// User identifier assigned by the repository.
pub type UserId = i64;

/// Authorization role carried by an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Regular canteen guest.
    User,
    /// Catalog curator with access to privileged actions.
    Admin,
}

impl Role {
    /// Stable lowercase label used in storage and tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parses the label produced by [`Role::as_str`].
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Working day of the weekly plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    /// Sort key 1.
    Monday,
    /// Sort key 2.
    Tuesday,
    /// Sort key 3.
    Wednesday,
    /// Sort key 4.
    Thursday,
    /// Sort key 5.
    Friday,
}

impl Weekday {
    /// All weekdays in canonical order.
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    /// Canonical sort order, Monday = 1 through Friday = 5.
    pub fn sort_order(self) -> u8 {
        match self {
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
        }
    }

    /// Resolves an ordinal in `1..=5`.
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|day| i64::from(day.sort_order()) == ordinal)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Meat content bucket of a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeatCategory {
    /// Contains meat or fish.
    Meat,
    /// No meat, may contain animal products.
    Vegetarian,
    /// No animal products.
    Vegan,
}

impl MeatCategory {
    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meat => "meat",
            Self::Vegetarian => "vegetarian",
            Self::Vegan => "vegan",
        }
    }

    /// Case-insensitive parse of [`MeatCategory::as_str`] labels.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "meat" => Some(Self::Meat),
            "vegetarian" => Some(Self::Vegetarian),
            "vegan" => Some(Self::Vegan),
            _ => None,
        }
    }
}

/// Named screens of the menu state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuState {
    /// Login/register screen; the initial state.
    LoggedOut,
    /// Main menu after login.
    Main,
    /// Meal catalog actions.
    MealMenu,
    /// Review actions.
    ReviewMenu,
    /// Account and user administration.
    UserMenu,
    /// Weekly plan curation.
    WeeklyMenu,
}

impl MenuState {
    /// All states in ordinal order.
    pub const ALL: [MenuState; 6] = [
        MenuState::LoggedOut,
        MenuState::Main,
        MenuState::MealMenu,
        MenuState::ReviewMenu,
        MenuState::UserMenu,
        MenuState::WeeklyMenu,
    ];

    /// Ordinal carried in a `SWITCH_MENU` payload.
    pub fn ordinal(self) -> i64 {
        match self {
            Self::LoggedOut => 0,
            Self::Main => 1,
            Self::MealMenu => 2,
            Self::ReviewMenu => 3,
            Self::UserMenu => 4,
            Self::WeeklyMenu => 5,
        }
    }

    /// Inverse of [`MenuState::ordinal`].
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.ordinal() == ordinal)
    }
}
