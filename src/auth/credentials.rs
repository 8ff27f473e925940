use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "canteen-tui";

/// OS-keychain storage for the last username's password, used to
/// prefill the login form. Stored on successful login and removed on
/// logout, the same lifecycle as the token store.
pub struct CredentialStore;

impl CredentialStore {
    pub fn store(username: &str, password: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    pub fn get_password(username: &str) -> Result<String> {
        let entry =
            Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    pub fn delete(username: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    pub fn has_credentials(username: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, username) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The platform keychain is not available everywhere tests run, so
    // these go through keyring's in-memory mock store.
    fn use_mock_store() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
    }

    #[test]
    fn test_store_get_delete_round_trip() {
        use_mock_store();
        CredentialStore::store("mrossi", "s3cret").expect("Failed to store credential");
        assert!(CredentialStore::has_credentials("mrossi"));
        assert_eq!(
            CredentialStore::get_password("mrossi").expect("Failed to read credential"),
            "s3cret"
        );

        // Logout removes the entry along with the session store
        CredentialStore::delete("mrossi").expect("Failed to delete credential");
        assert!(!CredentialStore::has_credentials("mrossi"));
    }
}
