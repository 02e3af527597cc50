//! HTTP client for the remote deck/streak/user API

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Result, SyncError};
use crate::store::{Deck, StreakData, User};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Authenticated client for the remote API.
///
/// Every request carries the bearer token and a request timeout, so no
/// sync operation can block indefinitely; a timed-out call surfaces as a
/// retriable [`SyncError::Http`].
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

/// Profile payload pushed on sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
struct DecksEnvelope {
    decks: Vec<Deck>,
}

#[derive(Deserialize)]
struct DeckEnvelope {
    deck: Deck,
}

#[derive(Deserialize)]
struct StreakEnvelope {
    streak: StreakData,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct SyncDecksBody<'a> {
    decks: &'a [Deck],
}

#[derive(Serialize)]
struct SyncStreakBody<'a> {
    streak: &'a StreakData,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = Client::builder()
            .timeout(timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: token.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send()?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Unauthorized);
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("API error: {}", status.as_u16()));
            return Err(SyncError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json()?)
    }

    // ==================== Decks ====================

    pub fn fetch_decks(&self) -> Result<Vec<Deck>> {
        let envelope: DecksEnvelope = self.send(self.request(Method::GET, "/api/decks"))?;
        Ok(envelope.decks)
    }

    /// Push local decks through the server-side merge; returns the
    /// reconciled collection.
    pub fn sync_decks(&self, decks: &[Deck]) -> Result<Vec<Deck>> {
        let envelope: DecksEnvelope = self.send(
            self.request(Method::POST, "/api/decks/sync")
                .json(&SyncDecksBody { decks }),
        )?;
        Ok(envelope.decks)
    }

    pub fn create_deck(&self, deck: &Deck) -> Result<Deck> {
        let envelope: DeckEnvelope =
            self.send(self.request(Method::POST, "/api/decks").json(deck))?;
        Ok(envelope.deck)
    }

    pub fn update_deck(&self, deck: &Deck) -> Result<Deck> {
        let envelope: DeckEnvelope = self.send(
            self.request(Method::PUT, &format!("/api/decks/{}", deck.id))
                .json(deck),
        )?;
        Ok(envelope.deck)
    }

    pub fn delete_deck(&self, deck_id: &str) -> Result<()> {
        let _: serde_json::Value =
            self.send(self.request(Method::DELETE, &format!("/api/decks/{}", deck_id)))?;
        Ok(())
    }

    // ==================== Streak ====================

    pub fn fetch_streak(&self) -> Result<StreakData> {
        let envelope: StreakEnvelope = self.send(self.request(Method::GET, "/api/streak"))?;
        Ok(envelope.streak)
    }

    /// Push the local streak through the server-side max-wins merge.
    pub fn sync_streak(&self, streak: &StreakData) -> Result<StreakData> {
        let envelope: StreakEnvelope = self.send(
            self.request(Method::POST, "/api/streak/sync")
                .json(&SyncStreakBody { streak }),
        )?;
        Ok(envelope.streak)
    }

    // ==================== User ====================

    pub fn sync_user(&self, profile: &UserProfile) -> Result<User> {
        let envelope: UserEnvelope = self.send(
            self.request(Method::POST, "/api/user/sync")
                .json(profile),
        )?;
        Ok(envelope.user)
    }

    pub fn me(&self) -> Result<User> {
        let envelope: UserEnvelope = self.send(self.request(Method::GET, "/api/user/me"))?;
        Ok(envelope.user)
    }

    /// Delete the account and all owned data.
    pub fn delete_account(&self) -> Result<()> {
        let _: serde_json::Value = self.send(self.request(Method::DELETE, "/api/user/me"))?;
        Ok(())
    }
}
