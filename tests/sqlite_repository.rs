mod common;

use std::{collections::BTreeSet, sync::Arc};

use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use canteen::{
    error::RepoError,
    meal::{MAX_PRICE_CENTS, MealDraft, MealPatch, ReviewDraft, UserDraft, UserPatch},
    persist::{Repository, sqlite::SqliteRepository},
    runtime::events::{EventName, Payload},
    types::{MeatCategory, Role, Weekday},
};

use common::test_app_with;

fn soup() -> MealDraft {
    MealDraft {
        name: "Soup".to_string(),
        price_cents: 350,
        calories: 300,
        allergens: BTreeSet::from(['G', 'M']),
        category: MeatCategory::Vegan,
    }
}

fn alice() -> UserDraft {
    UserDraft {
        name: "alice".to_string(),
        email: "a@x.com".to_string(),
        password_hash: "hash".to_string(),
        role: Role::User,
    }
}

#[test]
fn catalog_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("canteen.db");

    let (meal_id, user_id) = {
        let repo = SqliteRepository::open(&path).expect("open");
        let meal = repo.insert_meal(soup()).expect("meal");
        repo.update_meal(meal.id, &MealPatch::weekday(Some(Weekday::Wednesday)))
            .expect("plan");
        let user = repo.insert_user(alice()).expect("user");
        repo.update_user(
            user.id,
            &UserPatch {
                allergies: Some(BTreeSet::from(['N'])),
                ..UserPatch::default()
            },
        )
        .expect("allergies");
        repo.insert_review(ReviewDraft {
            meal_id: meal.id,
            rating: 4,
            comment: "good".to_string(),
            author_id: user.id,
            created_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        })
        .expect("review");
        (meal.id, user.id)
    };

    let repo = SqliteRepository::open(&path).expect("reopen");
    let meal = repo.get_meal(meal_id).expect("meal");
    assert_eq!(meal.name, "Soup");
    assert_eq!(meal.price_cents, 350);
    assert_eq!(meal.allergens, BTreeSet::from(['G', 'M']));
    assert_eq!(meal.category, MeatCategory::Vegan);
    assert_eq!(meal.weekday, Some(Weekday::Wednesday));

    assert_eq!(repo.user_allergies(user_id).expect("allergies"), BTreeSet::from(['N']));
    let reviews = repo.reviews_for_meal(meal_id).expect("reviews");
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].created_at.timestamp_millis(), 1_700_000_000_123);
}

#[test]
fn names_are_unique() {
    let repo = SqliteRepository::open_in_memory().expect("open");
    repo.insert_meal(soup()).expect("meal");
    assert!(matches!(
        repo.insert_meal(soup()),
        Err(RepoError::AlreadyExists { entity: "meal", .. })
    ));
    repo.insert_user(alice()).expect("user");
    assert!(matches!(
        repo.insert_user(alice()),
        Err(RepoError::AlreadyExists { entity: "user", .. })
    ));
}

#[test]
fn deleting_a_meal_cascades_and_missing_ids_are_not_found() {
    let repo = SqliteRepository::open_in_memory().expect("open");
    let meal = repo.insert_meal(soup()).expect("meal");
    repo.insert_review(ReviewDraft {
        meal_id: meal.id,
        rating: 5,
        comment: String::new(),
        author_id: 1,
        created_at: Utc::now(),
    })
    .expect("review");

    repo.delete_meal(meal.id).expect("delete");
    assert!(repo.list_reviews().expect("reviews").is_empty());
    assert!(matches!(
        repo.delete_meal(meal.id),
        Err(RepoError::NotFound { entity: "meal", .. })
    ));
    assert!(matches!(
        repo.insert_review(ReviewDraft {
            meal_id: meal.id,
            rating: 1,
            comment: String::new(),
            author_id: 1,
            created_at: Utc::now(),
        }),
        Err(RepoError::NotFound { entity: "meal", .. })
    ));
    assert!(matches!(
        repo.get_user(99),
        Err(RepoError::NotFound { entity: "user", id: 99 })
    ));
}

#[test]
fn clear_weekdays_counts_planned_meals() {
    let repo = SqliteRepository::open_in_memory().expect("open");
    let a = repo.insert_meal(soup()).expect("meal");
    let b = repo
        .insert_meal(MealDraft {
            name: "Curry".to_string(),
            ..soup()
        })
        .expect("meal");
    repo.insert_meal(MealDraft {
        name: "Salad".to_string(),
        ..soup()
    })
    .expect("meal");
    repo.update_meal(a.id, &MealPatch::weekday(Some(Weekday::Monday)))
        .expect("plan");
    repo.update_meal(b.id, &MealPatch::weekday(Some(Weekday::Tuesday)))
        .expect("plan");

    assert_eq!(repo.clear_weekdays().expect("clear"), 2);
    assert!(repo.list_meals().expect("list").iter().all(|m| m.weekday.is_none()));
}

#[test]
fn app_over_sqlite_bootstraps_admin_once() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("canteen.db");

    {
        let repo = Arc::new(SqliteRepository::open(&path).expect("open"));
        let (app, _) = test_app_with(repo);
        app.publish(EventName::Login, Payload::strings(["root", "secret"]))
            .expect("login");
        app.publish(
            EventName::AddMeal,
            Payload::strings(["Soup", "3.50", "300", "G", "vegan"]),
        )
        .expect("add");
    }

    let repo = Arc::new(SqliteRepository::open(&path).expect("reopen"));
    let (app, _) = test_app_with(repo);
    let users = app.repository().list_users().expect("users");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role, Role::Admin);
    assert_eq!(app.repository().list_meals().expect("meals").len(), 1);
}

#[test]
fn prices_are_bounded_by_the_signed_column() {
    let dir = tempdir().expect("tempdir");
    let repo = SqliteRepository::open(dir.path().join("canteen.db")).expect("open");

    let priciest = repo
        .insert_meal(MealDraft {
            price_cents: MAX_PRICE_CENTS,
            ..soup()
        })
        .expect("max price");
    assert_eq!(
        repo.get_meal(priciest.id).expect("get").price_cents,
        MAX_PRICE_CENTS
    );

    let err = repo
        .update_meal(
            priciest.id,
            &MealPatch {
                price_cents: Some(MAX_PRICE_CENTS + 1),
                ..MealPatch::default()
            },
        )
        .expect_err("out of range");
    assert!(matches!(err, RepoError::Storage(_)));
    assert_eq!(
        repo.get_meal(priciest.id).expect("get").price_cents,
        MAX_PRICE_CENTS
    );
}

#[test]
fn oversized_price_is_a_form_error() {
    let dir = tempdir().expect("tempdir");
    let repo = Arc::new(SqliteRepository::open(dir.path().join("canteen.db")).expect("open"));
    let (app, presenter) = test_app_with(repo);
    app.publish(EventName::Login, Payload::strings(["root", "secret"]))
        .expect("login");
    app.publish(
        EventName::AddMeal,
        Payload::strings(["Gold", "100000000000000000", "1", "", "vegan"]),
    )
    .expect("add");

    assert_eq!(
        presenter.last_error().as_deref(),
        Some("'100000000000000000' is not a valid price")
    );
    assert!(app.repository().list_meals().expect("meals").is_empty());
}
