//! User profile lifecycle endpoints

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::server::auth::AuthUser;
use crate::server::{AppState, Result, ServerError};
use crate::store::User;
use crate::sync::client::UserProfile;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync_user))
        .route("/me", get(me).delete(delete_me))
}

#[derive(Serialize)]
struct UserResponse {
    user: User,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncUserBody {
    email: Option<String>,
    name: Option<String>,
    image_url: Option<String>,
}

async fn sync_user(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<SyncUserBody>,
) -> Result<Json<UserResponse>> {
    let Some(email) = body.email else {
        return Err(ServerError::BadRequest("email is required".to_string()));
    };

    let profile = UserProfile {
        email,
        name: body.name,
        image_url: body.image_url,
    };

    let mut store = state.store.lock().unwrap();
    let user = store.upsert_user(&user_id, &profile)?;
    Ok(Json(UserResponse { user }))
}

async fn me(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>> {
    let store = state.store.lock().unwrap();
    let user = store
        .get_user(&user_id)?
        .ok_or(ServerError::NotFound("User"))?;
    Ok(Json(UserResponse { user }))
}

/// Delete the account; every owned deck and the streak go with it.
async fn delete_me(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>> {
    let mut store = state.store.lock().unwrap();
    store.delete_user(&user_id)?;
    log::info!("deleted account {user_id}");
    Ok(Json(SuccessResponse { success: true }))
}
