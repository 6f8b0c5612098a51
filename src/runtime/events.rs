//! Event names, payload contracts and the event wire shape.

use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// Payload variant an event declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    /// No payload.
    None,
    /// Single integer.
    Int,
    /// Ordered list of strings.
    StringList,
}

/// Data carried by an event.
///
/// Serializes as `null`, a number or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// No payload.
    None,
    /// Single integer.
    Int(i64),
    /// Ordered list of strings.
    StringList(Vec<String>),
}

impl Payload {
    /// Variant of this payload.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::None => PayloadKind::None,
            Self::Int(_) => PayloadKind::Int,
            Self::StringList(_) => PayloadKind::StringList,
        }
    }

    /// Builds a string list payload.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StringList(items.into_iter().map(Into::into).collect())
    }

    /// Integer value, or a contract violation attributed to `event`.
    pub fn expect_int(&self, event: EventName) -> Result<i64, BusError> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(violation(event, PayloadKind::Int, other.kind())),
        }
    }

    /// String list, or a contract violation attributed to `event`.
    pub fn expect_strings(&self, event: EventName) -> Result<&[String], BusError> {
        match self {
            Self::StringList(v) => Ok(v),
            other => Err(violation(event, PayloadKind::StringList, other.kind())),
        }
    }

    /// Succeeds only for [`Payload::None`].
    pub fn expect_none(&self, event: EventName) -> Result<(), BusError> {
        match self {
            Self::None => Ok(()),
            other => Err(violation(event, PayloadKind::None, other.kind())),
        }
    }
}

fn violation(event: EventName, expected: PayloadKind, actual: PayloadKind) -> BusError {
    BusError::PayloadContractViolation {
        event,
        expected,
        actual,
    }
}

macro_rules! event_names {
    ($($(#[$doc:meta])* $name:ident => $kind:ident,)+) => {
        /// Closed set of events understood by the bus.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum EventName {
            $($(#[$doc])* $name,)+
        }

        impl EventName {
            /// Every event name.
            pub const ALL: &'static [EventName] = &[$(EventName::$name,)+];

            /// Payload variant this event requires.
            pub fn payload_kind(self) -> PayloadKind {
                match self {
                    $(Self::$name => PayloadKind::$kind,)+
                }
            }
        }
    };
}

event_names! {
    /// `[username, password]`.
    Login => StringList,
    /// Ends the session.
    Logout => None,
    /// `[username, password, email]`.
    Register => StringList,
    /// Target [`crate::types::MenuState`] ordinal.
    SwitchMenu => Int,
    /// Process exit request.
    Exit => None,
    /// `[message]`.
    ShowErrorScreen => StringList,
    /// `[message]`.
    ShowSuccessScreen => StringList,
    /// Full meal table.
    ShowMeals => None,
    /// Meal id.
    ShowMealDetails => Int,
    /// `[name, price, calories, allergens, category]`.
    AddMeal => StringList,
    /// `[id, name, price, calories, allergens, category]`.
    EditMeal => StringList,
    /// Meal id.
    DeleteMeal => Int,
    /// Meal table by ascending price.
    SortMealsByPrice => None,
    /// Meal table by name.
    SortMealsByName => None,
    /// Meal table by ascending calories.
    SortMealsByCalories => None,
    /// Meal table by descending median rating.
    SortMealsByRating => None,
    /// Meal table without the user's avoided allergens.
    SortMealsByAllergy => None,
    /// Meal id.
    ShowReviews => Int,
    /// `[meal id, rating, comment]`.
    AddReview => StringList,
    /// Review id.
    DeleteReview => Int,
    /// Account table.
    ShowUsers => None,
    /// `[username, password, email]` for the current user.
    EditUserData => StringList,
    /// Allergen codes or names the current user avoids.
    EditUserAllergies => StringList,
    /// User id.
    DeleteUser => Int,
    /// User id.
    ToggleAdmin => Int,
    /// Planned meals by weekday.
    ShowWeeklyPlan => None,
    /// Weekday ordinal `1..=5`.
    EditWeeklyPlanWeekday => Int,
    /// Meal id for the weekday being edited.
    SubmitWeeklyPlanMeal => Int,
    /// Clears every plan slot.
    ResetWeeklyPlan => None,
}

/// Immutable published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event name.
    #[serde(rename = "eventName")]
    pub name: EventName,
    /// Payload matching `name`'s contract.
    pub payload: Payload,
}

impl Event {
    /// Builds an event after checking the payload contract.
    pub fn new(name: EventName, payload: Payload) -> Result<Self, BusError> {
        check_contract(name, &payload)?;
        Ok(Self { name, payload })
    }
}

/// Verifies `payload` against the static contract of `name`.
pub fn check_contract(name: EventName, payload: &Payload) -> Result<(), BusError> {
    let expected = name.payload_kind();
    let actual = payload.kind();
    if expected == actual {
        Ok(())
    } else {
        Err(violation(name, expected, actual))
    }
}
