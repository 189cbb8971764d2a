use std::env;

use crate::{config::REGISTRY_PASSWORD_ENV_VAR, oci::Image, PodstoreError, PodstoreResult};

use super::CredentialProvider;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Reads the registry password from an environment variable.
///
/// The same password is used for every image; the user comes from the image itself.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EnvCredentialProvider {
    /// Reads the password from `PODSTORE_REGISTRY_PASSWORD`.
    pub fn new() -> Self {
        Self::with_var(REGISTRY_PASSWORD_ENV_VAR)
    }

    /// Reads the password from the given variable.
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn get_password(&self, image: &Image) -> PodstoreResult<String> {
        match env::var(&self.var) {
            Ok(password) if !password.is_empty() => Ok(password),
            _ => Err(PodstoreError::CredentialUnavailable(format!(
                "{} is not set, no password for {}",
                self.var,
                image.get_registry()
            ))),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
