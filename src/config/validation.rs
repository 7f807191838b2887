//! Enqueue payload validation
//!
//! Runs synchronously at enqueue time; a payload that fails here is
//! rejected outright and no job row is ever created.

use crate::config::{AuthSession, CrawlRequest};
use crate::ConfigError;
use url::Url;

/// Validates a crawl request
pub fn validate_request(request: &CrawlRequest) -> Result<(), ConfigError> {
    validate_http_url("url", &request.url)?;
    validate_http_url("outputBaseUrl", &request.output_base_url)?;

    if request.request_delay > 60_000 {
        return Err(ConfigError::Validation(format!(
            "requestDelay must be at most 60000ms, got {}",
            request.request_delay
        )));
    }

    if request.delay > 60_000 {
        return Err(ConfigError::Validation(format!(
            "delay must be at most 60000ms, got {}",
            request.delay
        )));
    }

    if !(0.5..=4.0).contains(&request.device_scale_factor) {
        return Err(ConfigError::Validation(format!(
            "deviceScaleFactor must be between 0.5 and 4.0, got {}",
            request.device_scale_factor
        )));
    }

    if let Some(auth) = &request.auth {
        validate_auth(auth)?;
    }

    Ok(())
}

/// Checks that a field holds a parseable http(s) URL with a host
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} is required")));
    }

    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("{field}: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{field} must be http or https, got {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("{field} has no host")));
    }

    Ok(())
}

fn validate_auth(auth: &AuthSession) -> Result<(), ConfigError> {
    match auth {
        AuthSession::Cookies(cookies) => {
            if cookies.is_empty() {
                return Err(ConfigError::Validation(
                    "auth.cookies must not be empty".to_string(),
                ));
            }
            for cookie in cookies {
                if cookie.name.is_empty() {
                    return Err(ConfigError::Validation(
                        "auth cookie name must not be empty".to_string(),
                    ));
                }
            }
        }
        AuthSession::Credentials(creds) => {
            validate_http_url("auth.credentials.loginUrl", &creds.login_url)?;
            if creds.username.is_empty() || creds.password.is_empty() {
                return Err(ConfigError::Validation(
                    "auth credentials require a username and password".to_string(),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthCookie, Credentials};

    fn valid_request() -> CrawlRequest {
        serde_json::from_str(
            r#"{"url": "https://example.com", "outputBaseUrl": "https://cdn.example.com/out"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate_request(&valid_request()).is_ok());
    }

    #[test]
    fn test_missing_url_rejected() {
        let mut request = valid_request();
        request.url = String::new();
        assert!(matches!(
            validate_request(&request),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let mut request = valid_request();
        request.output_base_url = "ftp://cdn.example.com".to_string();
        assert!(matches!(
            validate_request(&request),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_excessive_delay_rejected() {
        let mut request = valid_request();
        request.request_delay = 120_000;
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_device_scale_bounds() {
        let mut request = valid_request();
        request.device_scale_factor = 8.0;
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_empty_cookie_list_rejected() {
        let mut request = valid_request();
        request.auth = Some(AuthSession::Cookies(vec![]));
        assert!(validate_request(&request).is_err());

        request.auth = Some(AuthSession::Cookies(vec![AuthCookie {
            name: "sid".to_string(),
            value: "v".to_string(),
        }]));
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_credentials_require_login_url() {
        let mut request = valid_request();
        request.auth = Some(AuthSession::Credentials(Credentials {
            login_url: "not a url".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
        }));
        assert!(validate_request(&request).is_err());
    }
}
