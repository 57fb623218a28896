use serde::{Deserialize, Serialize};

pub const USERNAME_MAX_LENGTH: usize = 128;
pub const PUSH_USERNAME_MAX_LENGTH: usize = 1024;
pub const PASSWORD_MAX_LENGTH: usize = 256;
pub const KEY_MAX_LENGTH: usize = 4096;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Ok,
    Failed,
    #[default]
    Unknown,
}

impl Connectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Ok => "ok",
            Connectivity::Failed => "failed",
            Connectivity::Unknown => "unknown",
        }
    }
}

/// Read view of a stored credential. Secret material is never included.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AssetUser {
    pub id: String,
    pub hostname: String,
    pub ip: String,
    pub username: String,
    pub asset: String,
    pub version: u32,
    pub is_latest: bool,
    #[serde(default)]
    pub connectivity: Connectivity,
    pub backend: String,
    pub date_created: String,
    pub date_updated: String,
}

/// Credential view used for bulk export, secrets included.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AssetUserExport {
    #[serde(flatten)]
    pub user: AssetUser,
    pub password: Option<String>,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct AssetUserAuthInfo {
    pub password: Option<String>,
    pub private_key: Option<String>,
    pub public_key: Option<String>,
}

/// Write payload for a credential. Fields are kept optional so a missing
/// value can be told apart from a blank one during validation.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CreateAssetUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AssetUserPushRequest {
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdateConnectivityBody {
    pub connectivity: Connectivity,
}

/// A request body that is either a single object or a list of them.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }
}
