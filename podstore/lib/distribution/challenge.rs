use std::{str::FromStr, sync::LazyLock};

use getset::Getters;
use regex::Regex;

use crate::PodstoreError;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static CHALLENGE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    // Token-based auth parameters are `key="value"` pairs separated by commas (RFC 6750).
    Regex::new(r#"(?P<key>[A-Za-z_]+)\s*=\s*"(?P<value>[\x20-\x21\x23-\x5B\x5D-\x7E]*)""#)
        .expect("challenge parameter pattern is valid")
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A `WWW-Authenticate: Bearer ...` challenge sent by a registry that wants a token.
///
/// Reference: <https://distribution.github.io/distribution/spec/auth/token/>
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct BearerChallenge {
    /// The token endpoint.
    realm: String,

    /// The service the token is issued for.
    service: Option<String>,

    /// The access the token should grant, e.g. `repository:library/alpine:pull`.
    scope: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl BearerChallenge {
    /// The query parameters to send to the token endpoint.
    pub fn token_query(&self) -> Vec<(&'static str, &str)> {
        let mut query = Vec::with_capacity(2);
        if let Some(service) = &self.service {
            query.push(("service", service.as_str()));
        }

        if let Some(scope) = &self.scope {
            query.push(("scope", scope.as_str()));
        }

        query
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for BearerChallenge {
    type Err = PodstoreError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let unsupported = || PodstoreError::UnsupportedAuthentication(header.to_string());

        let trimmed = header.trim_start();
        let (scheme, params) = trimmed.split_at(trimmed.find(' ').unwrap_or(trimmed.len()));
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(unsupported());
        }

        let mut realm = None;
        let mut service = None;
        let mut scope = None;
        for captures in CHALLENGE_PARAM.captures_iter(params) {
            let value = captures["value"].to_string();
            match captures["key"].to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let realm = realm
            .filter(|r| r.starts_with("https://") || r.starts_with("http://"))
            .ok_or_else(unsupported)?;

        Ok(Self {
            realm,
            service,
            scope,
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
