use serde::{Deserialize, Serialize};

/// Request configuration a platform needs to avoid bot detection.
///
/// Each platform crate ships a default profile, applications may replace any
/// part of it (usually the cookies) from their own configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformProfile {
    /// Falls back to a random Chrome user agent when absent
    pub user_agent: Option<String>,
    pub extra_headers: Vec<(String, String)>,
    /// Raw `Cookie` header value
    pub cookies: Option<String>,
}

impl PlatformProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extra_headers.push((key.into(), value.into()));
        self
    }

    pub fn cookies<S: Into<String>>(mut self, cookies: S) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    /// Overlay the non-empty parts of `other` on top of this profile.
    ///
    /// Headers from `other` replace headers with the same name (case-insensitive).
    pub fn merge(mut self, other: PlatformProfile) -> Self {
        if other.user_agent.is_some() {
            self.user_agent = other.user_agent;
        }
        if other.cookies.is_some() {
            self.cookies = other.cookies;
        }
        for (key, value) in other.extra_headers {
            self.extra_headers
                .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&key));
            self.extra_headers.push((key, value));
        }
        self
    }
}
