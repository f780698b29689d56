//! Repository layer for database operations

use super::models::{Label, NewPrediction, Prediction, Role, SystemStats, User};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// True when `e` is a UNIQUE constraint violation.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn user_from_row(r: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: r.try_get("id")?,
        username: r.try_get("username")?,
        password_hash: r.try_get("password_hash")?,
        role: Role::from_db(r.try_get::<&str, _>("role")?),
        created_at: r.try_get("created_at")?,
    })
}

fn prediction_from_row(r: &SqliteRow) -> Result<Prediction, sqlx::Error> {
    let label: Label = r
        .try_get::<&str, _>("label")?
        .parse()
        .map_err(|e: String| sqlx::Error::Decode(e.into()))?;

    Ok(Prediction {
        id: r.try_get("id")?,
        user_id: r.try_get("user_id")?,
        patient_name: r.try_get("patient_name")?,
        patient_age: r.try_get("patient_age")?,
        filename: r.try_get("filename")?,
        label,
        confidence: r.try_get("confidence")?,
        created_at: r.try_get("created_at")?,
    })
}

/// Credential store
pub struct UserRepository;

impl UserRepository {
    /// Get user by username
    pub async fn get_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT id, username, password_hash, role, created_at
               FROM users WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Create a new user. A taken username surfaces as a unique violation.
    pub async fn create(
        pool: &SqlitePool,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<i64, sqlx::Error> {
        let res = sqlx::query(
            r#"INSERT INTO users (username, password_hash, role, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(res.last_insert_rowid())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}

/// Prediction audit log
pub struct PredictionRepository;

impl PredictionRepository {
    /// Insert one record. A single-row INSERT either lands whole or not at all.
    pub async fn insert(
        pool: &SqlitePool,
        new: &NewPrediction<'_>,
    ) -> Result<Prediction, sqlx::Error> {
        let created_at = Utc::now();
        let res = sqlx::query(
            r#"INSERT INTO predictions
                   (user_id, patient_name, patient_age, filename, label, confidence, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new.user_id)
        .bind(new.patient_name)
        .bind(new.patient_age)
        .bind(new.filename)
        .bind(new.label.as_str())
        .bind(new.confidence)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(Prediction {
            id: res.last_insert_rowid(),
            user_id: new.user_id,
            patient_name: new.patient_name.to_string(),
            patient_age: new.patient_age,
            filename: new.filename.to_string(),
            label: new.label,
            confidence: new.confidence,
            created_at,
        })
    }

    /// All predictions owned by `user_id`, newest first.
    pub async fn list_by_user(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<Prediction>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, patient_name, patient_age, filename, label, confidence, created_at
               FROM predictions
               WHERE user_id = ?
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(prediction_from_row).collect()
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM predictions")
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_label(pool: &SqlitePool, label: Label) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM predictions WHERE label = ?")
            .bind(label.as_str())
            .fetch_one(pool)
            .await
    }
}

/// Read-only aggregates over both tables
pub struct StatsRepository;

impl StatsRepository {
    /// Four independent counts. Each is exact when taken; they are not
    /// snapshotted together.
    pub async fn system_stats(pool: &SqlitePool) -> Result<SystemStats, sqlx::Error> {
        Ok(SystemStats {
            total_users: UserRepository::count(pool).await?,
            total_predictions: PredictionRepository::count(pool).await?,
            parkinson_cases: PredictionRepository::count_by_label(pool, Label::Parkinson).await?,
            healthy_cases: PredictionRepository::count_by_label(pool, Label::Healthy).await?,
        })
    }
}
