use serde::{Deserialize, Serialize};

/// Summary of a managed host as embedded in credential views.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct BasicAsset {
    pub hostname: String,
    pub ip: String,
}
