//! # Remote API Rules
//!
//! How responses from the clearance REST API are interpreted, without any
//! HTTP client.
//!
//! - `classify_response` turns a status code and body into `Ok` or one
//!   categorized [`ClearanceError`]. Nothing is retried.
//! - [`Credentials`] live in the same key-value store as the records.
//! - A 401 from any authenticated call clears them and sends the user back
//!   to the login entry point.

use crate::storage::KeyValueStore;
use crate::ClearanceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shown when the response body carries no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Where the user goes after their session ends.
pub const LOGIN_PATH: &str = "/login";

// Storage keys, shared with the browser client.
const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const USER_ID_KEY: &str = "user_id";
const USER_EMAIL_KEY: &str = "user_email";
const USER_ROLE_KEY: &str = "user_role";

const CREDENTIAL_KEYS: [&str; 5] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    USER_ID_KEY,
    USER_EMAIL_KEY,
    USER_ROLE_KEY,
];

// =============================================================================
// RESPONSE CLASSIFICATION
// =============================================================================

/// Map a response onto the error categories.
///
/// Status `0` means the request never reached the server.
pub fn classify_response(status: u16, body: &str) -> Result<(), ClearanceError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let message = error_message(body);
    match status {
        0 => Err(ClearanceError::Connectivity(message)),
        401 => Err(ClearanceError::Unauthorized(message)),
        409 => Err(ClearanceError::Conflict(message)),
        400 if is_uniqueness_failure(body) => Err(ClearanceError::Conflict(message)),
        400 | 422 => Err(ClearanceError::Validation(message)),
        _ => Err(ClearanceError::Remote { status, message }),
    }
}

/// User-facing message extracted from an error body.
///
/// Looks at `detail`, `message` and `error` in that order, then at the
/// first field-error list (`{"email": ["already exists"]}` becomes
/// `email: already exists`).
#[must_use]
pub fn error_message(body: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return GENERIC_ERROR_MESSAGE.to_string();
    };

    for key in ["detail", "message", "error"] {
        if let Some(text) = map.get(key).and_then(first_text) {
            return text.to_string();
        }
    }

    map.iter()
        .find_map(|(field, value)| first_text(value).map(|text| format!("{}: {}", field, text)))
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

fn first_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

fn is_uniqueness_failure(body: &str) -> bool {
    body.to_ascii_lowercase().contains("already exists")
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Account role reported by the authentication endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    DepartmentStaff,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::DepartmentStaff => "department_staff",
            Self::Admin => "admin",
        }
    }

    /// Landing page after login.
    #[must_use]
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Self::Student => "/dashboard",
            Self::DepartmentStaff => "/staff/dashboard",
            Self::Admin => "/admin/dashboard",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ClearanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "department_staff" => Ok(Self::DepartmentStaff),
            "admin" => Ok(Self::Admin),
            other => Err(ClearanceError::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// Bearer tokens and the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub user_email: String,
    pub role: Role,
}

impl Credentials {
    /// Persist every field under its own key.
    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<(), ClearanceError> {
        store.put(ACCESS_TOKEN_KEY, self.access_token.as_bytes())?;
        store.put(REFRESH_TOKEN_KEY, self.refresh_token.as_bytes())?;
        store.put(USER_ID_KEY, self.user_id.as_bytes())?;
        store.put(USER_EMAIL_KEY, self.user_email.as_bytes())?;
        store.put(USER_ROLE_KEY, self.role.as_str().as_bytes())?;
        Ok(())
    }

    /// Read stored credentials. `None` unless the access token and role are
    /// both present.
    pub fn load<S: KeyValueStore>(store: &S) -> Result<Option<Self>, ClearanceError> {
        let Some(access_token) = read_text(store, ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };
        let Some(role) = read_text(store, USER_ROLE_KEY)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            access_token,
            refresh_token: read_text(store, REFRESH_TOKEN_KEY)?.unwrap_or_default(),
            user_id: read_text(store, USER_ID_KEY)?.unwrap_or_default(),
            user_email: read_text(store, USER_EMAIL_KEY)?.unwrap_or_default(),
            role: role.parse()?,
        }))
    }

    /// Remove every credential key.
    pub fn clear<S: KeyValueStore>(store: &mut S) -> Result<(), ClearanceError> {
        for key in CREDENTIAL_KEYS {
            store.remove(key)?;
        }
        Ok(())
    }

    /// Authorization header value.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

fn read_text<S: KeyValueStore>(store: &S, key: &str) -> Result<Option<String>, ClearanceError> {
    match store.get(key)? {
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| ClearanceError::SerializationError(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}

/// What the caller does after an authenticated call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Keep the session.
    Continue,
    /// Credentials were cleared; go to [`LOGIN_PATH`].
    RedirectToLogin,
}

/// Apply the session rule for `status`: a 401 logs the user out.
pub fn handle_status<S: KeyValueStore>(store: &mut S, status: u16) -> Result<AuthOutcome, ClearanceError> {
    if status != 401 {
        return Ok(AuthOutcome::Continue);
    }
    tracing::warn!("authentication rejected, clearing credentials");
    Credentials::clear(store)?;
    Ok(AuthOutcome::RedirectToLogin)
}

// =============================================================================
// TESTS
// =============================================================================
