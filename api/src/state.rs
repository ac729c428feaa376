use std::sync::Arc;

use tonebridge_core::auth::ExpectedCredentials;

use crate::chat_log::ChatLogStore;
use crate::conversation::ConversationService;

#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConversationService>,
    pub chat_log: Option<Arc<dyn ChatLogStore>>,
    pub log_credentials: Option<ExpectedCredentials>,
}
