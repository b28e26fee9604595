//! API key authentication against the configured user list.

use std::collections::HashMap;

use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::errors::ApplicationError;

pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";
pub const UNKNOWN_API_KEY: &str = "Unknown API key";

/// The user a request was authenticated as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiUser {
    pub username: String,
}

/// Maps pre-shared API keys to their users. Keys are held only in memory.
#[derive(Clone, Default)]
pub struct ApiKeyAuthenticator {
    users_by_key: HashMap<String, ApiUser>,
}

impl std::fmt::Debug for ApiKeyAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthenticator").field("users", &self.users_by_key.len()).finish()
    }
}

impl ApiKeyAuthenticator {
    pub fn from_config(config: &AuthConfig) -> Self {
        let users_by_key = config
            .api_users
            .iter()
            .map(|user| {
                (
                    user.api_key.expose_secret().trim().to_owned(),
                    ApiUser { username: user.username.clone() },
                )
            })
            .collect();
        Self { users_by_key }
    }

    pub fn authenticate(&self, api_key: Option<&str>) -> Result<ApiUser, ApplicationError> {
        let Some(key) = api_key.map(str::trim).filter(|key| !key.is_empty()) else {
            debug!(event_name = "auth.missing_key", "request carried no api key");
            return Err(ApplicationError::Authentication(AUTHENTICATION_REQUIRED.to_owned()));
        };

        match self.users_by_key.get(key) {
            Some(user) => Ok(user.clone()),
            None => {
                warn!(event_name = "auth.unknown_key", "request carried an unknown api key");
                Err(ApplicationError::Authentication(UNKNOWN_API_KEY.to_owned()))
            }
        }
    }

    pub fn user_count(&self) -> usize {
        self.users_by_key.len()
    }
}
