//! API key storage in the OS keychain, one entry per backend URL.

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "wardline";

pub struct KeyStore;

impl KeyStore {
    /// Store the API key for a backend URL
    pub fn store(backend_url: &str, api_key: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, backend_url).context("Failed to create keyring entry")?;
        entry
            .set_password(api_key)
            .context("Failed to store API key in keychain")?;
        Ok(())
    }

    /// Retrieve the API key for a backend URL
    pub fn get(backend_url: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, backend_url).context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve API key from keychain")
    }

    /// Remove the stored key for a backend URL
    pub fn delete(backend_url: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, backend_url).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete API key from keychain")?;
        Ok(())
    }
}
