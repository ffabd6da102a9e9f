use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque stable identifier for a user, resolved from a bearer token by the
/// external auth provider. The core treats it as an unstructured string.
pub type UserId = String;

/// A user's profile as seen by the core: display name and avatar are the
/// only mutable facets, pushed in through the external profile interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
