//! `chord_progressions` table queries

use chrono::{DateTime, Utc};
use eartrain_common::models::{Category, ChordProgression, Difficulty, Mode};
use eartrain_common::{uuid_utils, Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Optional list filters; `None` matches everything
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressionFilter {
    pub difficulty: Option<Difficulty>,
    pub category: Option<Category>,
    pub mode: Option<Mode>,
}

/// Validated fields for a new progression
#[derive(Debug, Clone)]
pub struct NewProgression {
    pub name: String,
    pub degrees: Vec<String>,
    pub difficulty: Difficulty,
    pub category: Category,
    pub mode: Mode,
    pub tempo: i64,
    pub description: String,
}

const COLUMNS: &str =
    "id, name, degrees, difficulty, category, mode, tempo, description, created_at";

pub async fn list(pool: &SqlitePool, filter: ProgressionFilter) -> Result<Vec<ChordProgression>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM chord_progressions WHERE 1 = 1", COLUMNS));

    if let Some(difficulty) = filter.difficulty {
        query.push(" AND difficulty = ").push_bind(difficulty);
    }
    if let Some(category) = filter.category {
        query.push(" AND category = ").push_bind(category);
    }
    if let Some(mode) = filter.mode {
        query.push(" AND mode = ").push_bind(mode);
    }
    query.push(
        " ORDER BY CASE difficulty \
           WHEN 'beginner' THEN 0 WHEN 'intermediate' THEN 1 ELSE 2 END, name",
    );

    let progressions = query
        .build_query_as::<ChordProgression>()
        .fetch_all(pool)
        .await?;
    Ok(progressions)
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<ChordProgression>> {
    let progression = sqlx::query_as::<_, ChordProgression>(&format!(
        "SELECT {} FROM chord_progressions WHERE id = ?",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(progression)
}

/// Insert a progression; a duplicate name yields [`Error::Conflict`]
pub async fn create(
    pool: &SqlitePool,
    new: NewProgression,
    now: DateTime<Utc>,
) -> Result<ChordProgression> {
    let progression = ChordProgression {
        id: uuid_utils::new_id(),
        name: new.name,
        degrees: new.degrees,
        difficulty: new.difficulty,
        category: new.category,
        mode: new.mode,
        tempo: new.tempo,
        description: new.description,
        created_at: now,
    };

    let degrees = serde_json::to_string(&progression.degrees)
        .map_err(|e| Error::Internal(format!("Encode degrees failed: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO chord_progressions
            (id, name, degrees, difficulty, category, mode, tempo, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&progression.id)
    .bind(&progression.name)
    .bind(degrees)
    .bind(progression.difficulty)
    .bind(progression.category)
    .bind(progression.mode)
    .bind(progression.tempo)
    .bind(&progression.description)
    .bind(progression.created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(progression),
        Err(err) => {
            let err = Error::from(err);
            if err.is_unique_violation() {
                Err(Error::Conflict(format!(
                    "A chord progression named '{}' already exists",
                    progression.name
                )))
            } else {
                Err(err)
            }
        }
    }
}
