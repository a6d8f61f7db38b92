use crate::ingest::Ingestor;
use crate::store::JsonStore;
use std::sync::Mutex;

pub struct AppState {
    pub store: Mutex<JsonStore>,
    pub ingestor: Ingestor,
}
