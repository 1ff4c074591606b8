use serde::{Deserialize, Serialize};

/// Identity attached to a request by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Subject claim of the validated access token; owns every generation it creates
    pub sub: String,
}

impl AuthenticatedUser {
    pub fn new(sub: impl Into<String>) -> Self {
        Self { sub: sub.into() }
    }
}
