use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal identifier for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub Uuid);

impl ProfileId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProfileId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| format!("invalid profile id: {s}"))
    }
}

pub const DEFAULT_DISPLAY_NAME: &str = "Flair User";

/// A user record keyed by the identity provider's opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub external_id: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Free-form UI preferences.
    pub data: serde_json::Value,
    pub is_public: bool,
    pub follower_count: u32,
    pub following_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// A fresh profile with generated defaults for an unseen external id.
    pub fn new(external_id: &str) -> Self {
        Self {
            id: ProfileId::new(),
            external_id: external_id.to_string(),
            username: default_username(external_id),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            bio: None,
            avatar_url: None,
            data: serde_json::Value::Object(serde_json::Map::new()),
            is_public: true,
            follower_count: 0,
            following_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// `user_` followed by the last eight alphanumeric characters of the external id.
pub fn default_username(external_id: &str) -> String {
    let alnum: Vec<char> = external_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let start = alnum.len().saturating_sub(8);
    let suffix: String = alnum[start..].iter().collect();
    if suffix.is_empty() {
        "user".to_string()
    } else {
        format!("user_{suffix}")
    }
}

/// Partial update for a profile. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub data: Option<serde_json::Value>,
    pub is_public: Option<bool>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.display_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.data.is_none()
            && self.is_public.is_none()
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(ref username) = self.username {
            profile.username = username.trim().to_string();
        }
        if let Some(ref display_name) = self.display_name {
            profile.display_name = display_name.trim().to_string();
        }
        if let Some(ref bio) = self.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(ref avatar_url) = self.avatar_url {
            profile.avatar_url = Some(avatar_url.clone());
        }
        if let Some(ref data) = self.data {
            profile.data = data.clone();
        }
        if let Some(is_public) = self.is_public {
            profile.is_public = is_public;
        }
    }
}
