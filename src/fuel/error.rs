use crate::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum FuelError {
    #[error("Failed to reach the Fuel platform.")]
    Transport(#[from] reqwest::Error),
    #[error("Fuel authentication failed: {0}")]
    Authentication(String),
    #[error("Failed to decode a Fuel response: {0}")]
    Decode(String),
}

impl std::fmt::Debug for FuelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
