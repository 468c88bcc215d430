//! Parsing of the provider's redirect back to the application

use gcal_domain::{AuthError, AuthResult};
use url::form_urlencoded;

/// Parameters carried by the authorization callback.
///
/// The OAuth `state` parameter is itself a form-encoded payload; its
/// `security_token` entry is lifted out here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub security_token: Option<String>,
    /// Provider error code, e.g. `access_denied`.
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse a raw query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    /// Parse a full callback URL.
    pub fn from_url(url: &str) -> AuthResult<Self> {
        let url = url::Url::parse(url)
            .map_err(|err| AuthError::InvalidCallback(format!("unparseable callback URL: {err}")))?;
        Ok(Self::from_query(url.query().unwrap_or_default()))
    }

    /// Build from already-decoded query pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "code" => params.code = non_empty(value.into()),
                "state" => params.security_token = security_token_from_state(&value.into()),
                "error" => params.error = non_empty(value.into()),
                _ => {}
            }
        }
        params
    }
}

/// Encode the OAuth `state` payload for `security_token`.
pub fn encode_state(security_token: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("security_token", security_token)
        .finish()
}

fn security_token_from_state(state: &str) -> Option<String> {
    form_urlencoded::parse(state.as_bytes())
        .find(|(key, _)| key == "security_token")
        .and_then(|(_, value)| non_empty(value.into_owned()))
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::callback.
    use super::*;

    /// Validates `CallbackParams::from_query` for a successful redirect.
    ///
    /// Assertions:
    /// - Ensures the code is decoded.
    /// - Ensures the security token is lifted out of the nested state.
    #[test]
    fn test_parse_success_callback() {
        let state = encode_state("Ab3-._~x");
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("code", "4/0Ab")
            .append_pair("state", &state)
            .append_pair("scope", "openid")
            .finish();

        let params = CallbackParams::from_query(&format!("?{query}"));
        assert_eq!(params.code.as_deref(), Some("4/0Ab"));
        assert_eq!(params.security_token.as_deref(), Some("Ab3-._~x"));
        assert!(params.error.is_none());
    }

    /// Validates `CallbackParams::from_url` for a provider error.
    ///
    /// Assertions:
    /// - Ensures the error code is captured.
    /// - Ensures a missing code stays `None`.
    #[test]
    fn test_parse_error_callback() {
        let params = CallbackParams::from_url(
            "http://127.0.0.1:8085/callback?error=access_denied&state=security_token%3Dtok",
        )
        .unwrap();
        assert_eq!(params.error.as_deref(), Some("access_denied"));
        assert_eq!(params.security_token.as_deref(), Some("tok"));
        assert!(params.code.is_none());
    }

    /// Validates handling of empty and malformed values.
    ///
    /// Assertions:
    /// - Ensures empty values are treated as absent.
    /// - Ensures a state without `security_token` yields none.
    /// - Ensures an unparseable URL is an `InvalidCallback`.
    #[test]
    fn test_empty_and_malformed_values() {
        let params = CallbackParams::from_query("code=&error=&state=other%3Dx");
        assert_eq!(params, CallbackParams::default());

        assert!(matches!(
            CallbackParams::from_url("not a url"),
            Err(AuthError::InvalidCallback(_))
        ));
    }
}
