use url::Url;

/// Keys the provider (or the backend, on its behalf) appends to the callback
/// location. All of them are consumed and stripped.
const RETURN_KEYS: &[&str] = &[
    "auth_success",
    "success",
    "auth_error",
    "error",
    "error_description",
    "error_reason",
    "error_code",
    "code",
    "state",
];

/// Keys carrying the multi-tenant identifier on first load.
const TENANT_KEYS: &[&str] = &["cUUID", "company_uuid"];

/// Classified return parameters of an authorization handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnParams {
    /// `auth_success=true` (or the bare `success=true` shape).
    Success,
    /// `auth_error=<message>` or `error=<message>`.
    Failure { message: String },
    /// The provider redirected here directly with an authorization code that
    /// still has to be exchanged through the backend.
    Code { code: String, state: String },
    /// None of the recognised shapes is present.
    Absent,
}

impl ReturnParams {
    pub fn from_url(url: &Url) -> Self {
        let get = |key: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().to_string())
        };

        let non_empty = |key: &str| get(key).filter(|v| !v.is_empty());
        if let Some(error) = non_empty("auth_error").or_else(|| non_empty("error")) {
            let message = match get("error_description").filter(|d| !d.is_empty() && *d != error) {
                Some(description) => format!("{error} ({description})"),
                None => error,
            };
            return Self::Failure { message };
        }

        if let Some(flag) = get("auth_success").or_else(|| get("success")) {
            return if is_truthy(&flag) {
                Self::Success
            } else {
                Self::Failure {
                    message: "authorization was not completed".into(),
                }
            };
        }

        match (get("code").filter(|c| !c.is_empty()), get("state")) {
            (Some(code), Some(state)) if !state.is_empty() => Self::Code { code, state },
            (Some(_), _) => Self::Failure {
                message: "authorization code returned without state".into(),
            },
            (None, _) => Self::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Tenant identifier delivered alongside the return parameters, if any.
pub fn tenant_hint(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| TENANT_KEYS.contains(&k.as_ref()))
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Remove every return and tenant key, keeping unrelated query pairs and the
/// fragment. A query left empty is dropped entirely.
pub fn strip_return_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !RETURN_KEYS.contains(&k.as_ref()) && !TENANT_KEYS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}
