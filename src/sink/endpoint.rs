//! Write URL construction and request authentication.

use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use url::Url;

use crate::config::{ApiVersion, EndpointConfig, WRITE_PATH_V1, WRITE_PATH_V2};
use crate::error_handling::ConfigError;

/// Builds the write URL for `config`.
///
/// - v2: `{host}/api/v2/write?org={org}&bucket={bucket}&precision={p}`
/// - v1: `{host}/write?db={bucket}&precision={p}`
///
/// Query values are percent-encoded. A trailing `/` on the host is ignored.
///
/// # Errors
///
/// `ConfigError::InvalidHostUrl` if the result does not parse, and
/// `ConfigError::UnsupportedScheme` for anything but http/https (which also
/// catches a host given without a scheme, like `localhost:8086`).
pub fn write_url(config: &EndpointConfig) -> Result<Url, ConfigError> {
    let base = config.host_url.trim().trim_end_matches('/');
    let path = match config.api {
        ApiVersion::V2 => WRITE_PATH_V2,
        ApiVersion::V1 => WRITE_PATH_V1,
    };

    let mut url =
        Url::parse(&format!("{}{}", base, path)).map_err(|source| ConfigError::InvalidHostUrl {
            url: config.host_url.clone(),
            source,
        })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }

    {
        let mut query = url.query_pairs_mut();
        match config.api {
            ApiVersion::V2 => {
                query.append_pair("org", &config.organization);
                query.append_pair("bucket", &config.bucket);
            }
            ApiVersion::V1 => {
                query.append_pair("db", &config.bucket);
            }
        }
        query.append_pair("precision", config.precision.as_str());
    }

    Ok(url)
}

/// Attaches credentials to a write request.
///
/// A configured token always wins and is sent as `Authorization: Token ..`.
/// Without one, the v1 API falls back to basic auth when a username is set.
/// Otherwise the request goes out unauthenticated, which is what a server
/// with authentication disabled expects.
pub fn authenticate(request: RequestBuilder, config: &EndpointConfig) -> RequestBuilder {
    if let Some(token) = config.token() {
        return request.header(AUTHORIZATION, format!("Token {}", token));
    }

    if config.api == ApiVersion::V1 {
        if let Some(username) = config.username.as_deref().filter(|u| !u.is_empty()) {
            return request.basic_auth(username, config.password.as_deref());
        }
    }

    request
}
