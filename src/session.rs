//! Local session state: the three persisted stores sharing one database.

use std::path::Path;
use std::rc::Rc;

use tracing::info;

use crate::history::HistoryStore;
use crate::settings::cloak::CloakStore;
use crate::settings::SettingsStore;
use crate::store::{KvStore, StoreError};

pub struct Session {
    pub history: HistoryStore,
    pub settings: SettingsStore,
    pub cloak: CloakStore,
}

impl Session {
    /// Open the stores at `path`, or in memory when `path` is `None`.
    pub fn open(path: Option<&Path>) -> Result<Self, StoreError> {
        let kv = Rc::new(KvStore::open(path)?);
        Ok(Self {
            history: HistoryStore::new(Rc::clone(&kv)),
            settings: SettingsStore::new(Rc::clone(&kv)),
            cloak: CloakStore::new(kv),
        })
    }

    /// "Clear all data": empty history, default settings, default cloak.
    pub fn clear_all_data(&mut self) -> Result<(), StoreError> {
        info!("clearing all local data");
        self.history.clear()?;
        self.settings.reset()?;
        self.cloak.reset()?;
        Ok(())
    }
}
