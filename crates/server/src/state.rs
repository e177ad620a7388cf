use cidvault_core::config::AuthConfig;
use cidvault_ingest::Ingestor;

pub struct AppState {
    pub ingestor: Ingestor,
    pub auth: AuthConfig,
    /// Body limit applied to `POST /ipfs`.
    pub upload_max_bytes: usize,
}
