// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Twitch Helix API client and read-through caches.
//!
//! Handles:
//! - App access token via the client-credentials grant (cached, refreshed
//!   5 minutes before upstream expiry)
//! - Viewer sign-in token exchange (authorization-code grant)
//! - Live status, clips, VOD list and schedule reads, each behind a
//!   single time-boxed cache slot

use crate::error::AppError;
use crate::services::cache::TimedSlot;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Freshness window for the live-status slot.
const STATUS_TTL_SECS: i64 = 60;

/// Freshness window for clips, videos and schedule slots.
const MEDIA_TTL_SECS: i64 = 5 * 60;

const CLIPS_PAGE_SIZE: u32 = 12;
const VIDEOS_PAGE_SIZE: u32 = 12;
const SCHEDULE_PAGE_SIZE: u32 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// TwitchClient - low-level Helix/OAuth calls
// ─────────────────────────────────────────────────────────────────────────────

/// Twitch API client.
#[derive(Clone)]
pub struct TwitchClient {
    http: reqwest::Client,
    helix_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl TwitchClient {
    /// Create a new Twitch client with app credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_base_urls(
            client_id,
            client_secret,
            "https://api.twitch.tv/helix".to_string(),
            "https://id.twitch.tv/oauth2".to_string(),
        )
    }

    /// Create a client against custom base URLs (tests point this at a
    /// local mock server).
    pub fn with_base_urls(
        client_id: String,
        client_secret: String,
        helix_url: String,
        oauth_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            helix_url,
            oauth_url,
            client_id,
            client_secret,
        }
    }

    /// Fetch an app access token via the client-credentials grant.
    pub async fn app_token(&self) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| AppError::TwitchApi(format!("Token request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Exchange an authorization code for a viewer token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AppError::TwitchApi(format!("Token exchange failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Profile of the user a viewer token belongs to.
    pub async fn token_user(&self, access_token: &str) -> Result<Option<HelixUser>, AppError> {
        let envelope: HelixEnvelope<HelixUser> = self
            .get_helix(&format!("{}/users", self.helix_url), access_token)
            .await?;
        Ok(envelope.data.into_iter().next())
    }

    /// Look up a user (broadcaster) by login name.
    pub async fn user_by_login(
        &self,
        access_token: &str,
        login: &str,
    ) -> Result<Option<HelixUser>, AppError> {
        let url = format!(
            "{}/users?login={}",
            self.helix_url,
            urlencoding::encode(login)
        );
        let envelope: HelixEnvelope<HelixUser> = self.get_helix(&url, access_token).await?;
        Ok(envelope.data.into_iter().next())
    }

    /// Current live stream for a channel, if any.
    pub async fn stream_by_login(
        &self,
        access_token: &str,
        login: &str,
    ) -> Result<Option<HelixStream>, AppError> {
        let url = format!(
            "{}/streams?user_login={}",
            self.helix_url,
            urlencoding::encode(login)
        );
        let envelope: HelixEnvelope<HelixStream> = self.get_helix(&url, access_token).await?;
        Ok(envelope.data.into_iter().next())
    }

    /// Top clips for a broadcaster.
    pub async fn clips(
        &self,
        access_token: &str,
        broadcaster_id: &str,
    ) -> Result<Vec<HelixClip>, AppError> {
        let url = format!(
            "{}/clips?broadcaster_id={}&first={}",
            self.helix_url, broadcaster_id, CLIPS_PAGE_SIZE
        );
        let envelope: HelixEnvelope<HelixClip> = self.get_helix(&url, access_token).await?;
        Ok(envelope.data)
    }

    /// Videos (highlights, archives or uploads) for a user.
    pub async fn videos(
        &self,
        access_token: &str,
        user_id: &str,
        video_type: &str,
    ) -> Result<Vec<HelixVideo>, AppError> {
        let url = format!(
            "{}/videos?user_id={}&type={}&first={}",
            self.helix_url, user_id, video_type, VIDEOS_PAGE_SIZE
        );
        let envelope: HelixEnvelope<HelixVideo> = self.get_helix(&url, access_token).await?;
        Ok(envelope.data)
    }

    /// Stream schedule for a broadcaster.
    ///
    /// A 404 means the channel never configured a schedule; that maps to
    /// an empty schedule, not an error.
    pub async fn schedule(
        &self,
        access_token: &str,
        broadcaster_id: &str,
    ) -> Result<HelixScheduleData, AppError> {
        let url = format!(
            "{}/schedule?broadcaster_id={}&first={}",
            self.helix_url, broadcaster_id, SCHEDULE_PAGE_SIZE
        );

        let response = self
            .http
            .get(&url)
            .header("Client-ID", &self.client_id)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::TwitchApi(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(HelixScheduleData::default());
        }

        let envelope: HelixScheduleEnvelope = self.check_response_json(response).await?;
        Ok(envelope.data)
    }

    /// Generic authenticated Helix GET with JSON response.
    async fn get_helix<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .header("Client-ID", &self.client_id)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::TwitchApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::TwitchApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TwitchApi(format!("JSON parse error: {}", e)))
    }
}

// ─── Helix wire types ────────────────────────────────────────────────────────

/// Token response from the Twitch OAuth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct HelixEnvelope<T> {
    data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixUser {
    pub id: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixStream {
    pub title: String,
    pub viewer_count: i64,
    pub game_name: String,
    pub started_at: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixClip {
    pub id: String,
    pub title: String,
    pub url: String,
    pub embed_url: String,
    pub thumbnail_url: String,
    pub view_count: i64,
    pub creator_name: String,
    pub game_id: String,
    pub created_at: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixVideo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
    pub view_count: i64,
    pub duration: String,
    pub created_at: String,
    #[serde(rename = "type")]
    pub video_type: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct HelixScheduleEnvelope {
    data: HelixScheduleData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelixScheduleData {
    pub segments: Option<Vec<HelixSegment>>,
    pub vacation: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixSegment {
    pub id: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub is_recurring: bool,
    pub canceled_until: Option<String>,
    pub category: Option<HelixCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixCategory {
    pub name: String,
}

// ─── Normalized API payloads ─────────────────────────────────────────────────

/// Live status payload served to the site and the broadcast overlay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    pub is_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl StreamStatus {
    pub fn offline() -> Self {
        Self {
            is_live: false,
            viewer_count: None,
            title: None,
            game_name: None,
            started_at: None,
            thumbnail_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    pub title: String,
    pub url: String,
    pub embed_url: String,
    pub thumbnail_url: String,
    pub view_count: i64,
    pub creator_name: String,
    pub game_name: String,
    pub created_at: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClipsPayload {
    pub clips: Vec<Clip>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
    pub view_count: i64,
    pub duration: String,
    pub created_at: String,
    #[serde(rename = "type")]
    pub video_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideosPayload {
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSegment {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub is_recurring: bool,
    pub is_canceled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulePayload {
    pub segments: Vec<ScheduleSegment>,
    pub vacation: Option<serde_json::Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// TwitchService - token lifecycle + cached reads
// ─────────────────────────────────────────────────────────────────────────────

/// Cached app access token with expiry information.
#[derive(Clone)]
struct AppToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// High-level Twitch service owning the token slot and the data caches.
///
/// Constructed once per process and shared through `AppState`; there is
/// no ambient module-level cache state.
pub struct TwitchService {
    client: TwitchClient,
    channel_login: String,
    token: RwLock<Option<AppToken>>,
    status_cache: TimedSlot<StreamStatus>,
    clips_cache: TimedSlot<ClipsPayload>,
    // One slot shared across video types, matching the single staleness
    // window per resource.
    videos_cache: TimedSlot<VideosPayload>,
    schedule_cache: TimedSlot<SchedulePayload>,
}

impl TwitchService {
    pub fn new(client: TwitchClient, channel_login: String) -> Self {
        Self {
            client,
            channel_login,
            token: RwLock::new(None),
            status_cache: TimedSlot::new(STATUS_TTL_SECS),
            clips_cache: TimedSlot::new(MEDIA_TTL_SECS),
            videos_cache: TimedSlot::new(MEDIA_TTL_SECS),
            schedule_cache: TimedSlot::new(MEDIA_TTL_SECS),
        }
    }

    pub fn client(&self) -> &TwitchClient {
        &self.client
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid app access token, fetching a fresh one when the cached
    /// token is gone or within the refresh margin.
    async fn app_access_token(&self) -> Result<String, AppError> {
        let now = Utc::now();

        if let Some(cached) = self.token.read().await.as_ref() {
            if now < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let response = self.client.app_token().await?;
        let expires_at =
            now + Duration::seconds(response.expires_in - TOKEN_REFRESH_MARGIN_SECS);

        let mut guard = self.token.write().await;
        *guard = Some(AppToken {
            access_token: response.access_token.clone(),
            expires_at,
        });

        tracing::info!("Twitch app token refreshed");
        Ok(response.access_token)
    }

    /// Resolve the channel's broadcaster id with a fresh read.
    async fn broadcaster_id(&self, token: &str) -> Result<String, AppError> {
        let user = self
            .client
            .user_by_login(token, &self.channel_login)
            .await?
            .ok_or_else(|| {
                AppError::TwitchApi(format!("Channel {} not found", self.channel_login))
            })?;
        Ok(user.id)
    }

    // ─── Cached reads ────────────────────────────────────────────────────────

    /// Live stream status, cached for 60 seconds.
    pub async fn stream_status(&self) -> Result<StreamStatus, AppError> {
        if let Some(cached) = self.status_cache.get().await {
            return Ok(cached);
        }

        let token = self.app_access_token().await?;
        let status = match self
            .client
            .stream_by_login(&token, &self.channel_login)
            .await?
        {
            Some(stream) => StreamStatus {
                is_live: true,
                viewer_count: Some(stream.viewer_count),
                title: Some(stream.title),
                game_name: Some(stream.game_name),
                started_at: Some(stream.started_at),
                thumbnail_url: Some(stream.thumbnail_url),
            },
            None => StreamStatus::offline(),
        };

        self.status_cache.put(status.clone()).await;
        Ok(status)
    }

    /// Top clips, cached for 5 minutes.
    pub async fn clips(&self) -> Result<ClipsPayload, AppError> {
        if let Some(cached) = self.clips_cache.get().await {
            return Ok(cached);
        }

        let token = self.app_access_token().await?;
        let broadcaster_id = self.broadcaster_id(&token).await?;

        let clips = self
            .client
            .clips(&token, &broadcaster_id)
            .await?
            .into_iter()
            .map(|clip| Clip {
                id: clip.id,
                title: clip.title,
                url: clip.url,
                embed_url: clip.embed_url,
                thumbnail_url: clip.thumbnail_url,
                view_count: clip.view_count,
                creator_name: clip.creator_name,
                // The site has always surfaced the raw game id here.
                game_name: clip.game_id,
                created_at: clip.created_at,
                duration: clip.duration,
            })
            .collect();

        let payload = ClipsPayload { clips };
        self.clips_cache.put(payload.clone()).await;
        Ok(payload)
    }

    /// Videos of the given type, cached for 5 minutes.
    pub async fn videos(&self, video_type: &str) -> Result<VideosPayload, AppError> {
        if let Some(cached) = self.videos_cache.get().await {
            return Ok(cached);
        }

        let token = self.app_access_token().await?;
        let broadcaster_id = self.broadcaster_id(&token).await?;

        let videos = self
            .client
            .videos(&token, &broadcaster_id, video_type)
            .await?
            .into_iter()
            .map(|video| Video {
                id: video.id,
                title: video.title,
                url: video.url,
                thumbnail_url: video
                    .thumbnail_url
                    .replace("%{width}", "640")
                    .replace("%{height}", "360"),
                view_count: video.view_count,
                duration: video.duration,
                created_at: video.created_at,
                video_type: video.video_type,
                description: video.description,
            })
            .collect();

        let payload = VideosPayload { videos };
        self.videos_cache.put(payload.clone()).await;
        Ok(payload)
    }

    /// Stream schedule, cached for 5 minutes. A channel with no schedule
    /// yields an empty segment list.
    pub async fn schedule(&self) -> Result<SchedulePayload, AppError> {
        if let Some(cached) = self.schedule_cache.get().await {
            return Ok(cached);
        }

        let token = self.app_access_token().await?;
        let broadcaster_id = self.broadcaster_id(&token).await?;

        let data = self.client.schedule(&token, &broadcaster_id).await?;

        let segments = data
            .segments
            .unwrap_or_default()
            .into_iter()
            .map(|segment| ScheduleSegment {
                id: segment.id,
                title: segment.title,
                category: segment.category.map(|c| c.name),
                start_time: segment.start_time,
                end_time: segment.end_time,
                is_recurring: segment.is_recurring,
                is_canceled: segment.canceled_until.is_some(),
            })
            .collect();

        let payload = SchedulePayload {
            segments,
            vacation: data.vacation,
        };
        self.schedule_cache.put(payload.clone()).await;
        Ok(payload)
    }
}
