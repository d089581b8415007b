use {
    chrono::{DateTime, Utc},
    secrecy::Secret,
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// Messaging-capable account attached to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingAccount {
    pub id: String,
    #[serde(default, rename = "username")]
    pub handle: Option<String>,
    #[serde(default, rename = "profile_picture_url")]
    pub avatar_url: Option<String>,
}

/// A business page eligible for linking.
///
/// `connected` arrives from the backend as `is_connected` and is re-derived
/// locally once channels are known. The bearer credential is only ever held
/// in memory and is skipped on serialization.
#[derive(Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing)]
    pub access_token: Option<Secret<String>>,
    #[serde(default, rename = "instagram_business_account")]
    pub messaging_account: Option<MessagingAccount>,
    #[serde(default, rename = "is_connected")]
    pub connected: bool,
}

impl Page {
    /// A page can be connected only when it has a linked messaging account
    /// and is not already connected.
    #[must_use]
    pub fn can_connect(&self) -> bool {
        self.messaging_account.is_some() && !self.connected
    }

    #[must_use]
    pub fn can_disconnect(&self) -> bool {
        self.connected
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("name", &self.name)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("messaging_account", &self.messaging_account)
            .field("connected", &self.connected)
            .finish()
    }
}

/// Which side of the link an auto-reply applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Facebook,
    #[default]
    Instagram,
}

impl ChannelKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
        }
    }
}

/// Persisted link between a page and its messaging account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    #[serde(rename = "facebookPageId")]
    pub page_id: String,
    #[serde(rename = "facebookPageName")]
    pub page_name: String,
    #[serde(default, rename = "instagramAccountId")]
    pub account_id: String,
    #[serde(default, rename = "instagramUsername")]
    pub account_handle: String,
    #[serde(default, rename = "instagramProfilePicture")]
    pub avatar_url: Option<String>,
    #[serde(default, rename = "welcomeMessage", alias = "autoReply")]
    pub auto_reply: Option<String>,
    #[serde(default, rename = "pageType")]
    pub kind: ChannelKind,
    #[serde(rename = "connectedAt")]
    pub connected_at: DateTime<Utc>,
}

/// Outcome of a mutating backend call, normalized from the several payload
/// shapes the backend uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Ok { message: Option<String> },
    Failed { message: String },
}

const DEFAULT_FAILURE: &str = "request was not accepted";

impl AuthResult {
    /// Normalize a raw response body.
    ///
    /// An explicit `success`/`ok` boolean wins; otherwise the presence of an
    /// `error` field means failure. Anything else on a 2xx answer, including
    /// an empty body, counts as success.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::Ok { message: None };
        };

        let text = |key: &str| {
            obj.get(key)
                .and_then(|v| v.as_str().or_else(|| v.get("message").and_then(Value::as_str)))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };
        let message = text("message")
            .or_else(|| text("error"))
            .or_else(|| text("error_description"));

        let flag = obj
            .get("success")
            .or_else(|| obj.get("ok"))
            .and_then(Value::as_bool);
        let ok = flag.unwrap_or_else(|| obj.get("error").is_none_or(Value::is_null));

        if ok {
            Self::Ok { message }
        } else {
            Self::Failed {
                message: message.unwrap_or_else(|| DEFAULT_FAILURE.to_string()),
            }
        }
    }

    /// Normalize a raw body string; non-JSON bodies count as success.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str::<Value>(body)
            .map(|v| Self::from_value(&v))
            .unwrap_or(Self::Ok { message: None })
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}
