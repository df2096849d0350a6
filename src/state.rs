use crate::store::VoteStore;
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn VoteStore>,
}

pub type SharedState = Arc<AppState>;
