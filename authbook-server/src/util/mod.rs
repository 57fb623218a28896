pub mod app_state;
pub mod json;
pub mod logging;
pub mod org;
pub mod pagination;
pub mod ssh_key;
