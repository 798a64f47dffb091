//! Broker credential rows.
//!
//! Credential provisioning itself happens outside this gateway; the store
//! only holds the rows the broker's auth plugin reads.

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// One broker login: who may connect, and which topics they may use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerCredential {
    pub mountpoint: String,
    pub client_id: String,
    pub username: String,
    /// Already hashed by the provisioning side; stored opaque.
    pub password_hash: String,
    pub publish_acl: Vec<String>,
    pub subscribe_acl: Vec<String>,
}

/// Storage for broker credential rows, keyed by username.
pub trait CredentialStore {
    fn put_credential(&self, credential: &BrokerCredential) -> Result<(), StoreError>;
    fn get_credential(&self, username: &str) -> Result<Option<BrokerCredential>, StoreError>;
}
