//! LMDB implementation of the broker credential table.

use skiff_store::{BrokerCredential, CredentialStore, StoreError};

use crate::LmdbStore;

fn backend(e: heed::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl CredentialStore for LmdbStore {
    fn put_credential(&self, credential: &BrokerCredential) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(backend)?;
        self.credentials
            .put(&mut wtxn, &credential.username, credential)
            .map_err(backend)?;
        wtxn.commit().map_err(backend)?;
        Ok(())
    }

    fn get_credential(&self, username: &str) -> Result<Option<BrokerCredential>, StoreError> {
        let rtxn = self.env.read_txn().map_err(backend)?;
        let row = self.credentials.get(&rtxn, username).map_err(backend)?;
        Ok(row)
    }
}
