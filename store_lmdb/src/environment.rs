//! LMDB environment setup.

use std::path::Path;

use heed::types::{SerdeBincode, Str};
use heed::{Database, DatabaseFlags, Env, EnvOpenOptions};

use skiff_store::BrokerCredential;

use crate::LmdbError;

/// Default LMDB map size: 256 MiB. The gateway's tables are small.
pub const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;

/// Number of named LMDB databases.
const MAX_DBS: u32 = 3;

/// Wraps the LMDB environment and all database handles.
///
/// `registrations` is a DUP_SORT database: one account key maps to a sorted
/// set of unique members, so re-adding an existing member is a no-op.
pub struct LmdbStore {
    pub(crate) env: Env,
    pub(crate) registrations: Database<Str, Str>,
    pub(crate) timestamps: Database<Str, SerdeBincode<u64>>,
    pub(crate) credentials: Database<Str, SerdeBincode<BrokerCredential>>,
}

impl LmdbStore {
    /// Open or create an LMDB environment at `path` with the default map
    /// size.
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    /// Open or create an LMDB environment at `path`.
    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // Safety: the environment path is not opened twice within this
        // process; multi-process access is what LMDB is built for.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let registrations = env
            .database_options()
            .types::<Str, Str>()
            .name("registrations")
            .flags(DatabaseFlags::DUP_SORT)
            .create(&mut wtxn)?;
        let timestamps = env
            .database_options()
            .types::<Str, SerdeBincode<u64>>()
            .name("timestamps")
            .create(&mut wtxn)?;
        let credentials = env
            .database_options()
            .types::<Str, SerdeBincode<BrokerCredential>>()
            .name("credentials")
            .create(&mut wtxn)?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env,
            registrations,
            timestamps,
            credentials,
        })
    }
}
