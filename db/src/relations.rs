//! User-owned join entities: the shopping cart, favorites and subscriptions.
//!
//! All three are a unique `(subject, object)` pair with the same add/remove
//! semantics, so they share one implementation parametrised by [`Relation`].
//! Uniqueness lives in the table's primary key; a duplicate insert is a no-op
//! at the database level and is reported as [`StoreError::AlreadyExists`].

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::StoreError;

pub trait Relation {
    const TABLE: &'static str;
    const SUBJECT_COLUMN: &'static str;
    const OBJECT_COLUMN: &'static str;

    /// Table and key column the object must exist in.
    const OBJECT_TABLE: &'static str;
    const OBJECT_KEY: &'static str;

    const OBJECT_MISSING: &'static str;
    const ALREADY_PRESENT: &'static str;
    const NOT_PRESENT: &'static str;

    fn check(_subject: Uuid, _object: Uuid) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Recipes a user intends to shop for.
pub struct ShoppingCart;

impl Relation for ShoppingCart {
    const TABLE: &'static str = "shopping_cart_entries";
    const SUBJECT_COLUMN: &'static str = "user_id";
    const OBJECT_COLUMN: &'static str = "recipe_id";
    const OBJECT_TABLE: &'static str = "recipes";
    const OBJECT_KEY: &'static str = "recipe_id";
    const OBJECT_MISSING: &'static str = "Recipe not found";
    const ALREADY_PRESENT: &'static str = "Recipe is already in the shopping cart";
    const NOT_PRESENT: &'static str = "Recipe is not in the shopping cart";
}

pub struct Favorites;

impl Relation for Favorites {
    const TABLE: &'static str = "favorites";
    const SUBJECT_COLUMN: &'static str = "user_id";
    const OBJECT_COLUMN: &'static str = "recipe_id";
    const OBJECT_TABLE: &'static str = "recipes";
    const OBJECT_KEY: &'static str = "recipe_id";
    const OBJECT_MISSING: &'static str = "Recipe not found";
    const ALREADY_PRESENT: &'static str = "Recipe is already in favorites";
    const NOT_PRESENT: &'static str = "Recipe is not in favorites";
}

/// A user following an author.
pub struct Subscriptions;

impl Relation for Subscriptions {
    const TABLE: &'static str = "subscriptions";
    const SUBJECT_COLUMN: &'static str = "user_id";
    const OBJECT_COLUMN: &'static str = "author_user_id";
    const OBJECT_TABLE: &'static str = "users";
    const OBJECT_KEY: &'static str = "user_id";
    const OBJECT_MISSING: &'static str = "User not found";
    const ALREADY_PRESENT: &'static str = "You are already subscribed to this user";
    const NOT_PRESENT: &'static str = "You are not subscribed to this user";

    fn check(subject: Uuid, object: Uuid) -> Result<(), StoreError> {
        if subject == object {
            return Err(StoreError::SelfReference(
                "You cannot subscribe to yourself".to_string(),
            ));
        }

        Ok(())
    }
}

async fn object_exists<R: Relation>(pool: &PgPool, object: Uuid) -> Result<bool, StoreError> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
        R::OBJECT_TABLE,
        R::OBJECT_KEY
    );

    let exists = sqlx::query_scalar::<_, bool>(&sql)
        .bind(object)
        .fetch_one(pool)
        .await
        .map_err(StoreError::Database)?;

    Ok(exists)
}

fn map_write_error<R: Relation>(err: sqlx::Error) -> StoreError {
    match StoreError::from(err) {
        StoreError::TargetNotFound(_) => StoreError::TargetNotFound(R::OBJECT_MISSING.to_string()),
        StoreError::AlreadyExists(_) => StoreError::AlreadyExists(R::ALREADY_PRESENT.to_string()),
        other => other,
    }
}

#[tracing::instrument(skip(pool), fields(relation = R::TABLE), err)]
pub async fn add<R: Relation>(
    pool: &PgPool,
    subject: Uuid,
    object: Uuid,
) -> Result<(), StoreError> {
    R::check(subject, object)?;

    if !object_exists::<R>(pool, object).await? {
        return Err(StoreError::TargetNotFound(R::OBJECT_MISSING.to_string()));
    }

    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        R::TABLE,
        R::SUBJECT_COLUMN,
        R::OBJECT_COLUMN
    );

    let inserted = sqlx::query(&sql)
        .bind(subject)
        .bind(object)
        .execute(pool)
        .await
        .map_err(map_write_error::<R>)?
        .rows_affected();

    if inserted == 0 {
        return Err(StoreError::AlreadyExists(R::ALREADY_PRESENT.to_string()));
    }

    Ok(())
}

#[tracing::instrument(skip(pool), fields(relation = R::TABLE), err)]
pub async fn remove<R: Relation>(
    pool: &PgPool,
    subject: Uuid,
    object: Uuid,
) -> Result<(), StoreError> {
    if !object_exists::<R>(pool, object).await? {
        return Err(StoreError::TargetNotFound(R::OBJECT_MISSING.to_string()));
    }

    let sql = format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
        R::TABLE,
        R::SUBJECT_COLUMN,
        R::OBJECT_COLUMN
    );

    let deleted = sqlx::query(&sql)
        .bind(subject)
        .bind(object)
        .execute(pool)
        .await
        .map_err(StoreError::Database)?
        .rows_affected();

    if deleted == 0 {
        return Err(StoreError::NotFound(R::NOT_PRESENT.to_string()));
    }

    Ok(())
}

/// Which of `objects` are related to `subject`.
pub async fn contained_in<R: Relation>(
    pool: &PgPool,
    subject: Uuid,
    objects: &[Uuid],
) -> color_eyre::Result<Vec<Uuid>> {
    let sql = format!(
        "SELECT {obj} FROM {table} WHERE {subj} = $1 AND {obj} = ANY($2)",
        obj = R::OBJECT_COLUMN,
        table = R::TABLE,
        subj = R::SUBJECT_COLUMN,
    );

    let found = sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(subject)
        .bind(objects)
        .fetch_all(pool)
        .await?;

    Ok(found)
}
