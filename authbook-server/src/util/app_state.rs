use std::sync::Arc;

use crate::backends::AssetUserManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<AssetUserManager>,
}
