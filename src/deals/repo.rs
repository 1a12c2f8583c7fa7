use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// A time-bounded discount listing owned by one user. `id`, `owner_id` and
/// `created_at` are immutable after creation.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Deal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub discount: f64,
    pub location: String,
    pub start_date: Date,
    pub end_date: Date,
    pub image: String,
    pub owner_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Fields persisted on create; id and created_at are server-assigned.
#[derive(Debug, Clone)]
pub struct NewDeal {
    pub title: String,
    pub description: String,
    pub discount: f64,
    pub location: String,
    pub start_date: Date,
    pub end_date: Date,
    pub image: String,
    pub owner_id: Uuid,
}

impl Deal {
    pub async fn insert(db: &PgPool, new: &NewDeal) -> anyhow::Result<Deal> {
        let deal = sqlx::query_as::<_, Deal>(
            r#"
            INSERT INTO deals (title, description, discount, location, start_date, end_date, image, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, discount, location, start_date, end_date, image, owner_id, created_at
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.discount)
        .bind(&new.location)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.image)
        .bind(new.owner_id)
        .fetch_one(db)
        .await?;
        Ok(deal)
    }

    /// Every deal, newest first. No pagination: callers receive the full set.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Deal>> {
        let rows = sqlx::query_as::<_, Deal>(
            r#"
            SELECT id, title, description, discount, location, start_date, end_date, image, owner_id, created_at
            FROM deals
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<Deal>> {
        let rows = sqlx::query_as::<_, Deal>(
            r#"
            SELECT id, title, description, discount, location, start_date, end_date, image, owner_id, created_at
            FROM deals
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Deal>> {
        let deal = sqlx::query_as::<_, Deal>(
            r#"
            SELECT id, title, description, discount, location, start_date, end_date, image, owner_id, created_at
            FROM deals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(deal)
    }

    /// Writes the mutable fields of an already-merged deal back by id.
    pub async fn update(db: &PgPool, deal: &Deal) -> anyhow::Result<Deal> {
        let updated = sqlx::query_as::<_, Deal>(
            r#"
            UPDATE deals
            SET title = $2, description = $3, discount = $4, location = $5,
                start_date = $6, end_date = $7
            WHERE id = $1
            RETURNING id, title, description, discount, location, start_date, end_date, image, owner_id, created_at
            "#,
        )
        .bind(deal.id)
        .bind(&deal.title)
        .bind(&deal.description)
        .bind(deal.discount)
        .bind(&deal.location)
        .bind(deal.start_date)
        .bind(deal.end_date)
        .fetch_one(db)
        .await?;
        Ok(updated)
    }

    /// Permanent removal. No soft delete, no cleanup of the referenced blob.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM deals WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
