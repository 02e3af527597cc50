//! Streak endpoints

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::server::auth::AuthUser;
use crate::server::{AppState, Result, ServerError};
use crate::store::StreakData;
use crate::sync::merge;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_streak))
        .route("/sync", post(sync_streak))
}

#[derive(Serialize)]
struct StreakResponse {
    streak: StreakData,
}

/// Returns stored streak data, or transient defaults when the user has
/// never synced one (defaults are not persisted).
async fn get_streak(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StreakResponse>> {
    let store = state.store.lock().unwrap();
    let streak = store.streak(&user_id)?.unwrap_or(StreakData {
        current_streak: 0,
        best_streak: 0,
        last_study_date: None,
        updated_at: Utc::now().timestamp_millis(),
    });
    Ok(Json(StreakResponse { streak }))
}

#[derive(Deserialize)]
struct SyncStreakBody {
    streak: Option<StreakData>,
}

/// Max-wins merge: counters never regress, the later study date is
/// kept, and the merged record becomes the new canonical value.
async fn sync_streak(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<SyncStreakBody>,
) -> Result<Json<StreakResponse>> {
    let Some(local) = body.streak else {
        return Err(ServerError::BadRequest("Missing streak data".to_string()));
    };

    let now = Utc::now().timestamp_millis();
    let mut store = state.store.lock().unwrap();
    let merged = match store.streak(&user_id)? {
        Some(cloud) => merge::merge_streaks(&local, &cloud, now),
        None => StreakData {
            updated_at: now,
            ..local
        },
    };

    store.set_streak(&user_id, &merged)?;
    Ok(Json(StreakResponse { streak: merged }))
}
