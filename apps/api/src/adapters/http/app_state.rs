use std::sync::Arc;

use crate::{
    application::use_cases::session_authority::SessionAuthority, infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session_authority: Arc<SessionAuthority>,
}
