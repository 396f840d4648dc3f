use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the signed-in patient, as resolved by the external
/// identity provider. This is the only thing the core ever reads from
/// the authentication layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub display_name: String,
}
