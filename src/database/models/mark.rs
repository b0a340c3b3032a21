use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mark {
    pub id: i64,
    pub student_id: i64,
    pub subject: String,
    pub test_type: String,
    pub practical_marks: i64,
    pub theoretical_marks: i64,
}

/// A mark that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMark {
    pub student_id: i64,
    pub subject: String,
    pub test_type: String,
    pub practical_marks: i64,
    pub theoretical_marks: i64,
}

/// One exported row: a mark joined with its student.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkRecord {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub class: String,
    pub subject: String,
    pub test_type: String,
    pub practical_marks: i64,
    pub theoretical_marks: i64,
}

impl MarkRecord {
    /// Practical plus theoretical. Saturates for rows written outside the
    /// bot, whose scores are not bounded.
    pub fn total(&self) -> i64 {
        self.practical_marks.saturating_add(self.theoretical_marks)
    }
}

impl Mark {
    pub async fn insert(
        conn: &mut SqliteConnection,
        new_mark: NewMark,
    ) -> Result<Self, sqlx::Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO marks (student_id, subject, test_type, practical_marks, theoretical_marks)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_mark.student_id)
        .bind(&new_mark.subject)
        .bind(&new_mark.test_type)
        .bind(new_mark.practical_marks)
        .bind(new_mark.theoretical_marks)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(Mark {
            id,
            student_id: new_mark.student_id,
            subject: new_mark.subject,
            test_type: new_mark.test_type,
            practical_marks: new_mark.practical_marks,
            theoretical_marks: new_mark.theoretical_marks,
        })
    }

    pub async fn find_by_student(
        pool: &sqlx::SqlitePool,
        student_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Mark>(
            "SELECT id, student_id, subject, test_type, practical_marks, theoretical_marks FROM marks WHERE student_id = ? ORDER BY id"
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
    }

    /// Every mark with its student's name and class, oldest first.
    pub async fn find_all_with_students(
        pool: &sqlx::SqlitePool,
    ) -> Result<Vec<MarkRecord>, sqlx::Error> {
        sqlx::query_as::<_, MarkRecord>(
            r#"
            SELECT m.id, m.student_id, s.name AS student_name, s.class,
                   m.subject, m.test_type, m.practical_marks, m.theoretical_marks
            FROM marks m
            JOIN students s ON s.id = m.student_id
            ORDER BY m.id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM marks")
            .fetch_one(pool)
            .await
    }
}
