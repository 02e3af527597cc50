//! Deck and card endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::server::auth::AuthUser;
use crate::server::{AppState, Result, ServerError};
use crate::store::{Card, Deck, Rating};
use crate::sync::merge;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_decks).post(create_deck))
        .route("/sync", post(sync_decks))
        .route(
            "/{id}",
            get(get_deck).put(update_deck).delete(delete_deck),
        )
        .route("/{id}/cards", post(add_card))
        .route(
            "/{deck_id}/cards/{card_id}",
            axum::routing::put(update_card).delete(delete_card),
        )
}

#[derive(Serialize)]
struct DecksResponse {
    decks: Vec<Deck>,
}

#[derive(Serialize)]
struct DeckResponse {
    deck: Deck,
}

#[derive(Serialize)]
struct CardResponse {
    card: Card,
    deck: Deck,
}

#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    deck: Option<Deck>,
}

async fn list_decks(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DecksResponse>> {
    let store = state.store.lock().unwrap();
    Ok(Json(DecksResponse {
        decks: store.list_decks(&user_id)?,
    }))
}

async fn get_deck(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> Result<Json<DeckResponse>> {
    let store = state.store.lock().unwrap();
    let deck = store
        .get_deck(&user_id, &deck_id)?
        .ok_or(ServerError::NotFound("Deck"))?;
    Ok(Json(DeckResponse { deck }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDeckBody {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    cards: Vec<Card>,
    #[serde(default)]
    is_favorite: bool,
}

async fn create_deck(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateDeckBody>,
) -> Result<(StatusCode, Json<DeckResponse>)> {
    let (Some(id), Some(name)) = (body.id, body.name) else {
        return Err(ServerError::BadRequest(
            "id and name are required".to_string(),
        ));
    };

    let now = Utc::now().timestamp_millis();
    let deck = Deck {
        id,
        name,
        cards: body.cards,
        is_favorite: body.is_favorite,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let mut store = state.store.lock().unwrap();
    store.put_deck(&user_id, &deck)?;
    Ok((StatusCode::CREATED, Json(DeckResponse { deck })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDeckBody {
    name: Option<String>,
    cards: Option<Vec<Card>>,
    is_favorite: Option<bool>,
}

async fn update_deck(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Json(body): Json<UpdateDeckBody>,
) -> Result<Json<DeckResponse>> {
    let mut store = state.store.lock().unwrap();
    let mut deck = store
        .get_deck(&user_id, &deck_id)?
        .ok_or(ServerError::NotFound("Deck"))?;

    if let Some(name) = body.name {
        deck.name = name;
    }
    if let Some(cards) = body.cards {
        deck.cards = cards;
    }
    if let Some(is_favorite) = body.is_favorite {
        deck.is_favorite = is_favorite;
    }
    deck.updated_at = Some(Utc::now().timestamp_millis());

    store.put_deck(&user_id, &deck)?;
    Ok(Json(DeckResponse { deck }))
}

async fn delete_deck(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut store = state.store.lock().unwrap();
    store.delete_deck(&user_id, &deck_id)?;
    Ok(Json(DeleteResponse {
        success: true,
        deck: None,
    }))
}

#[derive(Deserialize)]
struct SyncBody {
    decks: Option<Vec<Deck>>,
}

/// Server side of the merge: reconcile the caller's collection against
/// the stored one and commit every staged write in one batch.
async fn sync_decks(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<SyncBody>,
) -> Result<Json<DecksResponse>> {
    let Some(local_decks) = body.decks else {
        return Err(ServerError::BadRequest(
            "decks array is required".to_string(),
        ));
    };

    let mut store = state.store.lock().unwrap();
    let remote_decks = store.list_decks(&user_id)?;
    let outcome = merge::merge_decks(&local_decks, &remote_decks, Utc::now().timestamp_millis());

    store.apply_batch(&user_id, &outcome.to_persist)?;
    log::info!(
        "synced decks for {user_id}: {} merged, {} written",
        outcome.merged.len(),
        outcome.to_persist.len()
    );
    Ok(Json(DecksResponse {
        decks: outcome.merged,
    }))
}

#[derive(Deserialize)]
struct AddCardBody {
    id: Option<String>,
    word: Option<String>,
    translation: Option<String>,
}

async fn add_card(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Json(body): Json<AddCardBody>,
) -> Result<(StatusCode, Json<CardResponse>)> {
    let (Some(id), Some(word), Some(translation)) = (body.id, body.word, body.translation)
    else {
        return Err(ServerError::BadRequest(
            "id, word, and translation are required".to_string(),
        ));
    };

    let mut store = state.store.lock().unwrap();
    let mut deck = store
        .get_deck(&user_id, &deck_id)?
        .ok_or(ServerError::NotFound("Deck"))?;

    let now = Utc::now().timestamp_millis();
    let card = Card {
        id,
        word,
        translation,
        last_rating: None,
        next_review_label: None,
        next_review_date: None,
        updated_at: Some(now),
    };

    deck.cards.insert(0, card.clone());
    deck.updated_at = Some(now);
    store.put_deck(&user_id, &deck)?;

    Ok((StatusCode::CREATED, Json(CardResponse { card, deck })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCardBody {
    word: Option<String>,
    translation: Option<String>,
    last_rating: Option<Rating>,
    next_review_label: Option<String>,
}

async fn update_card(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path((deck_id, card_id)): Path<(String, String)>,
    Json(body): Json<UpdateCardBody>,
) -> Result<Json<CardResponse>> {
    let mut store = state.store.lock().unwrap();
    let mut deck = store
        .get_deck(&user_id, &deck_id)?
        .ok_or(ServerError::NotFound("Deck"))?;

    let now = Utc::now().timestamp_millis();
    let card = {
        let card = deck
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or(ServerError::NotFound("Card"))?;
        if let Some(word) = body.word {
            card.word = word;
        }
        if let Some(translation) = body.translation {
            card.translation = translation;
        }
        if let Some(rating) = body.last_rating {
            card.last_rating = Some(rating);
        }
        if let Some(label) = body.next_review_label {
            card.next_review_label = Some(label);
        }
        card.updated_at = Some(now);
        card.clone()
    };

    deck.updated_at = Some(now);
    store.put_deck(&user_id, &deck)?;
    Ok(Json(CardResponse { card, deck }))
}

async fn delete_card(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path((deck_id, card_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let mut store = state.store.lock().unwrap();
    let mut deck = store
        .get_deck(&user_id, &deck_id)?
        .ok_or(ServerError::NotFound("Deck"))?;

    deck.cards.retain(|c| c.id != card_id);
    deck.updated_at = Some(Utc::now().timestamp_millis());
    store.put_deck(&user_id, &deck)?;

    Ok(Json(DeleteResponse {
        success: true,
        deck: Some(deck),
    }))
}
