//! Chord-progression catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use eartrain_common::models::{Category, ChordProgression, Difficulty, Mode};
use eartrain_common::theory::{parse_key, validate_degrees, voice_progression, ChordVoicing};
use eartrain_common::time;
use eartrain_common::validation::{in_range, validate_name, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::{ApiJson, ApiQuery, AuthUser};
use crate::db::chord_progressions::{self, NewProgression, ProgressionFilter};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const DEFAULT_TEMPO: i64 = 100;
pub const MIN_TEMPO: i64 = 40;
pub const MAX_TEMPO: i64 = 240;
pub const MAX_DEGREES: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 1000;
const DEFAULT_KEY: &str = "C";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub difficulty: Option<Difficulty>,
    pub category: Option<Category>,
    pub mode: Option<Mode>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub progressions: Vec<ChordProgression>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateProgressionRequest {
    pub name: String,
    pub degrees: Vec<String>,
    pub difficulty: Difficulty,
    pub category: Category,
    #[serde(default)]
    pub mode: Mode,
    pub tempo: Option<i64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct VoicingQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoicingResponse {
    pub progression_id: String,
    pub name: String,
    pub key: String,
    pub mode: Mode,
    pub tempo: i64,
    pub chords: Vec<ChordVoicing>,
}

impl CreateProgressionRequest {
    fn validate(self) -> Result<NewProgression, ValidationError> {
        let name = validate_name(&self.name)?;

        let degrees: Vec<String> = self.degrees.iter().map(|d| d.trim().to_string()).collect();
        if degrees.len() > MAX_DEGREES {
            return Err(ValidationError::new(
                "degrees",
                format!("At most {} degrees are allowed", MAX_DEGREES),
            ));
        }
        validate_degrees(&degrees)?;

        let tempo = in_range("tempo", self.tempo.unwrap_or(DEFAULT_TEMPO), MIN_TEMPO, MAX_TEMPO)?;

        let description = self.description.trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::new(
                "description",
                format!("Description must be at most {} characters", MAX_DESCRIPTION_LEN),
            ));
        }

        Ok(NewProgression {
            name,
            degrees,
            difficulty: self.difficulty,
            category: self.category,
            mode: self.mode,
            tempo,
            description,
        })
    }
}

async fn find(state: &AppState, id: &str) -> ApiResult<ChordProgression> {
    chord_progressions::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chord progression not found".to_string()))
}

/// GET /api/chord-progressions?difficulty=&category=&mode=
pub async fn list_progressions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let filter = ProgressionFilter {
        difficulty: query.difficulty,
        category: query.category,
        mode: query.mode,
    };
    let progressions = chord_progressions::list(&state.db, filter).await?;

    Ok(Json(ListResponse {
        count: progressions.len(),
        progressions,
    }))
}

/// POST /api/chord-progressions
pub async fn create_progression(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateProgressionRequest>,
) -> ApiResult<(StatusCode, Json<ChordProgression>)> {
    let new = req.validate()?;
    let progression = chord_progressions::create(&state.db, new, time::now()).await?;

    info!(
        "User {} created chord progression '{}'",
        auth.user_id(),
        progression.name
    );
    Ok((StatusCode::CREATED, Json(progression)))
}

/// GET /api/chord-progressions/:id
pub async fn get_progression(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ChordProgression>> {
    Ok(Json(find(&state, &id).await?))
}

/// GET /api/chord-progressions/:id/voicing?key=
pub async fn get_voicing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<VoicingQuery>,
) -> ApiResult<Json<VoicingResponse>> {
    let key = query
        .key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_KEY.to_string());
    parse_key(&key)?;

    let progression = find(&state, &id).await?;
    let chords = voice_progression(&progression.degrees, &key, progression.mode)?;

    Ok(Json(VoicingResponse {
        progression_id: progression.id,
        name: progression.name,
        key,
        mode: progression.mode,
        tempo: progression.tempo,
        chords,
    }))
}

pub fn chord_progression_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/chord-progressions",
            get(list_progressions).post(create_progression),
        )
        .route("/api/chord-progressions/:id", get(get_progression))
        .route("/api/chord-progressions/:id/voicing", get(get_voicing))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(degrees: &[&str], tempo: Option<i64>) -> CreateProgressionRequest {
        CreateProgressionRequest {
            name: "  Test Loop ".to_string(),
            degrees: degrees.iter().map(|d| d.to_string()).collect(),
            difficulty: Difficulty::Beginner,
            category: Category::Pop,
            mode: Mode::Major,
            tempo,
            description: String::new(),
        }
    }

    #[test]
    fn test_validate_trims_and_defaults() {
        let new = request(&[" I ", "IV", "V"], None).validate().unwrap();
        assert_eq!(new.name, "Test Loop");
        assert_eq!(new.degrees, vec!["I", "IV", "V"]);
        assert_eq!(new.tempo, DEFAULT_TEMPO);
    }

    #[test]
    fn test_validate_rejects_bad_degree_and_tempo() {
        assert_eq!(
            request(&["I", "Q"], None).validate().unwrap_err().field,
            "degrees"
        );
        assert_eq!(
            request(&["I"], Some(300)).validate().unwrap_err().field,
            "tempo"
        );
        assert!(request(&[], None).validate().is_err());
    }
}
