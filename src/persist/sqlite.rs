//! SQLite-backed repository.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{
    allergen::{self, AllergenSet},
    core::lock,
    error::{RepoError, RepoResult},
    meal::{Cents, Meal, MealDraft, MealPatch, Review, ReviewDraft, User, UserDraft, UserPatch},
    types::{MealId, MeatCategory, ReviewId, Role, UserId, Weekday},
};

use super::Repository;

const MEAL_COLUMNS: &str = "id, name, price_cents, calories, allergens, category, weekday";
const REVIEW_COLUMNS: &str = "id, meal_id, rating, comment, author_id, created_at_ms";
const USER_COLUMNS: &str = "id, name, email, password_hash, role, allergies";

/// SQLite implementation of [`crate::persist::Repository`].
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Opens or creates a database at `path`.
    ///
    /// Enables WAL mode and foreign keys.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> RepoResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn meal_where(conn: &Connection, clause: &str, arg: &dyn rusqlite::ToSql) -> RepoResult<Option<Meal>> {
        let sql = format!("SELECT {MEAL_COLUMNS} FROM meals WHERE {clause}");
        Ok(conn.query_row(&sql, [arg], meal_from_row).optional()?)
    }

    fn user_where(conn: &Connection, clause: &str, arg: &dyn rusqlite::ToSql) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        Ok(conn.query_row(&sql, [arg], user_from_row).optional()?)
    }

    fn ensure_meal_name_free(conn: &Connection, name: &str, owner: Option<MealId>) -> RepoResult<()> {
        match Self::meal_where(conn, "name = ?1", &name)? {
            Some(existing) if Some(existing.id) != owner => Err(RepoError::AlreadyExists {
                entity: "meal",
                key: name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn ensure_user_name_free(conn: &Connection, name: &str, owner: Option<UserId>) -> RepoResult<()> {
        match Self::user_where(conn, "name = ?1", &name)? {
            Some(existing) if Some(existing.id) != owner => Err(RepoError::AlreadyExists {
                entity: "user",
                key: name.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl Repository for SqliteRepository {
    fn list_meals(&self) -> RepoResult<Vec<Meal>> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(&format!("SELECT {MEAL_COLUMNS} FROM meals ORDER BY id ASC"))?;
        let rows = stmt.query_map([], meal_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn get_meal(&self, id: MealId) -> RepoResult<Meal> {
        let conn = lock(&self.conn);
        Self::meal_where(&conn, "id = ?1", &id)?.ok_or(RepoError::NotFound { entity: "meal", id })
    }

    fn find_meal_by_name(&self, name: &str) -> RepoResult<Option<Meal>> {
        let conn = lock(&self.conn);
        Self::meal_where(&conn, "name = ?1", &name)
    }

    fn insert_meal(&self, draft: MealDraft) -> RepoResult<Meal> {
        let conn = lock(&self.conn);
        Self::ensure_meal_name_free(&conn, &draft.name, None)?;
        let price_cents = price_column(draft.price_cents)?;
        conn.execute(
            "INSERT INTO meals(name, price_cents, calories, allergens, category, weekday) VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
            params![
                draft.name,
                price_cents,
                draft.calories,
                allergen::encode(&draft.allergens),
                draft.category.as_str(),
            ],
        )?;
        Ok(draft.into_meal(conn.last_insert_rowid()))
    }

    fn update_meal(&self, id: MealId, patch: &MealPatch) -> RepoResult<Meal> {
        let conn = lock(&self.conn);
        let mut meal =
            Self::meal_where(&conn, "id = ?1", &id)?.ok_or(RepoError::NotFound { entity: "meal", id })?;
        if let Some(name) = &patch.name {
            Self::ensure_meal_name_free(&conn, name, Some(id))?;
        }
        patch.apply_to(&mut meal);
        let price_cents = price_column(meal.price_cents)?;
        conn.execute(
            "UPDATE meals SET name = ?1, price_cents = ?2, calories = ?3, allergens = ?4, category = ?5, weekday = ?6 WHERE id = ?7",
            params![
                meal.name,
                price_cents,
                meal.calories,
                allergen::encode(&meal.allergens),
                meal.category.as_str(),
                meal.weekday.map(Weekday::sort_order),
                id,
            ],
        )?;
        Ok(meal)
    }

    fn delete_meal(&self, id: MealId) -> RepoResult<()> {
        let mut conn = lock(&self.conn);
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM reviews WHERE meal_id = ?1", params![id])?;
        let count = tx.execute("DELETE FROM meals WHERE id = ?1", params![id])?;
        if count == 0 {
            return Err(RepoError::NotFound { entity: "meal", id });
        }
        tx.commit()?;
        Ok(())
    }

    fn clear_weekdays(&self) -> RepoResult<usize> {
        let conn = lock(&self.conn);
        Ok(conn.execute("UPDATE meals SET weekday = NULL WHERE weekday IS NOT NULL", [])?)
    }

    fn list_reviews(&self) -> RepoResult<Vec<Review>> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(&format!("SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY id ASC"))?;
        let rows = stmt.query_map([], review_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn reviews_for_meal(&self, meal_id: MealId) -> RepoResult<Vec<Review>> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE meal_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![meal_id], review_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Review> {
        let conn = lock(&self.conn);
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1");
        conn.query_row(&sql, params![id], review_from_row)
            .optional()?
            .ok_or(RepoError::NotFound { entity: "review", id })
    }

    fn insert_review(&self, draft: ReviewDraft) -> RepoResult<Review> {
        let conn = lock(&self.conn);
        if Self::meal_where(&conn, "id = ?1", &draft.meal_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: "meal",
                id: draft.meal_id,
            });
        }
        conn.execute(
            "INSERT INTO reviews(meal_id, rating, comment, author_id, created_at_ms) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.meal_id,
                draft.rating,
                draft.comment,
                draft.author_id,
                draft.created_at.timestamp_millis(),
            ],
        )?;
        Ok(draft.into_review(conn.last_insert_rowid()))
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        let conn = lock(&self.conn);
        match conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])? {
            0 => Err(RepoError::NotFound { entity: "review", id }),
            _ => Ok(()),
        }
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))?;
        let rows = stmt.query_map([], user_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn get_user(&self, id: UserId) -> RepoResult<User> {
        let conn = lock(&self.conn);
        Self::user_where(&conn, "id = ?1", &id)?.ok_or(RepoError::NotFound { entity: "user", id })
    }

    fn find_user_by_name(&self, name: &str) -> RepoResult<Option<User>> {
        let conn = lock(&self.conn);
        Self::user_where(&conn, "name = ?1", &name)
    }

    fn insert_user(&self, draft: UserDraft) -> RepoResult<User> {
        let conn = lock(&self.conn);
        Self::ensure_user_name_free(&conn, &draft.name, None)?;
        conn.execute(
            "INSERT INTO users(name, email, password_hash, role, allergies) VALUES (?1, ?2, ?3, ?4, '')",
            params![draft.name, draft.email, draft.password_hash, draft.role.as_str()],
        )?;
        Ok(draft.into_user(conn.last_insert_rowid()))
    }

    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<User> {
        let conn = lock(&self.conn);
        let mut user =
            Self::user_where(&conn, "id = ?1", &id)?.ok_or(RepoError::NotFound { entity: "user", id })?;
        if let Some(name) = &patch.name {
            Self::ensure_user_name_free(&conn, name, Some(id))?;
        }
        patch.apply_to(&mut user);
        conn.execute(
            "UPDATE users SET name = ?1, email = ?2, password_hash = ?3, role = ?4, allergies = ?5 WHERE id = ?6",
            params![
                user.name,
                user.email,
                user.password_hash,
                user.role.as_str(),
                allergen::encode(&user.allergies),
                id,
            ],
        )?;
        Ok(user)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let conn = lock(&self.conn);
        match conn.execute("DELETE FROM users WHERE id = ?1", params![id])? {
            0 => Err(RepoError::NotFound { entity: "user", id }),
            _ => Ok(()),
        }
    }

    fn user_allergies(&self, id: UserId) -> RepoResult<AllergenSet> {
        let conn = lock(&self.conn);
        let raw: Option<String> = conn
            .query_row("SELECT allergies FROM users WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        raw.map(|r| allergen::decode(&r))
            .ok_or(RepoError::NotFound { entity: "user", id })
    }
}

fn price_column(cents: Cents) -> RepoResult<i64> {
    i64::try_from(cents).map_err(|_| RepoError::Storage(format!("price {cents} out of range")))
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::other(msg)),
    )
}

fn meal_from_row(row: &Row<'_>) -> rusqlite::Result<Meal> {
    let category: String = row.get(5)?;
    let weekday: Option<i64> = row.get(6)?;
    let price_cents: i64 = row.get(2)?;
    Ok(Meal {
        id: row.get(0)?,
        name: row.get(1)?,
        price_cents: u64::try_from(price_cents)
            .map_err(|_| conversion_error(2, format!("negative price {price_cents}")))?,
        calories: row.get(3)?,
        allergens: allergen::decode(&row.get::<_, String>(4)?),
        category: MeatCategory::parse(&category)
            .ok_or_else(|| conversion_error(5, format!("unknown category {category}")))?,
        weekday: weekday
            .map(|v| Weekday::from_ordinal(v).ok_or_else(|| conversion_error(6, format!("bad weekday {v}"))))
            .transpose()?,
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    let created_at_ms: i64 = row.get(5)?;
    let created_at: DateTime<Utc> = DateTime::from_timestamp_millis(created_at_ms)
        .ok_or_else(|| conversion_error(5, format!("bad timestamp {created_at_ms}")))?;
    Ok(Review {
        id: row.get(0)?,
        meal_id: row.get(1)?,
        rating: row.get(2)?,
        comment: row.get(3)?,
        author_id: row.get(4)?,
        created_at,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role).ok_or_else(|| conversion_error(4, format!("unknown role {role}")))?,
        allergies: allergen::decode(&row.get::<_, String>(5)?),
    })
}
