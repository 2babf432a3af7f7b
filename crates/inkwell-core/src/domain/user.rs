use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::image::ImageDescriptor;
use crate::error::DomainError;

/// Avatar used until a user uploads a profile picture.
pub const DEFAULT_PROFILE_PICTURE: &str = "https://images.unsplash.com/photo-1615911907304-d418c903b058?q=80&w=687&auto=format&fit=crop";

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Author,
    #[default]
    Reader,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Author => "author",
            Role::Reader => "reader",
        }
    }

    /// Admins and authors may publish posts.
    pub fn can_publish(self) -> bool {
        matches!(self, Role::Admin | Role::Author)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "author" => Ok(Role::Author),
            "reader" => Ok(Role::Reader),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// Writing tone injected into AI prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Casual,
    #[default]
    Neutral,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "formal" => Ok(Tone::Formal),
            "casual" => Ok(Tone::Casual),
            "neutral" => Ok(Tone::Neutral),
            other => Err(DomainError::UnknownTone(other.to_string())),
        }
    }
}

/// Per-user AI preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub ai_assistant_enabled: bool,
    pub preferred_tone: Tone,
    pub content_suggestions: bool,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            ai_assistant_enabled: true,
            preferred_tone: Tone::Neutral,
            content_suggestions: true,
        }
    }
}

/// Fields supplied at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub role: Role,
}

/// User entity - represents a user in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub password_hash: String,
    pub role: Role,
    pub profile_picture: String,
    pub profile_image: Option<ImageDescriptor>,
    pub ai_settings: AiSettings,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID, timestamps and default settings.
    pub fn new(registration: NewUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            firstname: registration.firstname,
            lastname: registration.lastname,
            username: registration.username,
            email: registration.email,
            date_of_birth: registration.date_of_birth,
            password_hash,
            role: registration.role,
            profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
            profile_image: None,
            ai_settings: AiSettings::default(),
            reset_password_token: None,
            reset_password_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a processed profile image, returning the one it replaces.
    pub fn replace_profile_image(&mut self, image: ImageDescriptor) -> Option<ImageDescriptor> {
        self.profile_picture = image.url.clone();
        self.touch();
        self.profile_image.replace(image)
    }

    pub fn issue_reset_token(&mut self, token: String, ttl: TimeDelta) {
        self.reset_password_token = Some(token);
        self.reset_password_expires = Some(Utc::now() + ttl);
        self.touch();
    }

    /// A reset token is usable once, and only before it expires.
    pub fn reset_token_matches(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_password_token, self.reset_password_expires) {
            (Some(stored), Some(expires)) => stored == token && now < expires,
            _ => false,
        }
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.reset_password_token = None;
        self.reset_password_expires = None;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
