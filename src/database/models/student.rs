use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

/// Placeholder stored in `students.class`; the dialogue never asks for a class.
pub const UNKNOWN_CLASS: &str = "Unknown";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub class: String,
}

impl Student {
    pub async fn find_by_name(
        pool: &sqlx::SqlitePool,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            "SELECT id, name, class FROM students WHERE name = ?"
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT id, name, class FROM students ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(pool)
            .await
    }

    /// Returns the id of the student called `name`, inserting the row first
    /// when it does not exist yet. The boolean is `true` for a fresh insert.
    ///
    /// Runs on a caller-provided connection so it can share a transaction
    /// with the mark insert that follows it.
    pub async fn find_or_create(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<(i64, bool), sqlx::Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO students (name, class)
            VALUES (?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(UNKNOWN_CLASS)
        .execute(&mut *conn)
        .await?
        .rows_affected()
            > 0;

        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM students WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

        Ok((id, inserted))
    }
}
