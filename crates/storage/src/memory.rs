use std::{collections::BTreeMap, sync::RwLock};

use fitnews_domain as domain;
use log::{debug, trace};

use crate::json::{Catalog, CatalogError, UserState, UserStateError};

/// Catalog snapshot and user states held in memory.
///
/// Reads are point-in-time copies, so concurrent queries never observe a partially replaced
/// user state.
pub struct MemoryStore {
    catalog: Vec<domain::ExerciseVariation>,
    users: RwLock<BTreeMap<domain::UserID, domain::UserState>>,
    settings: domain::SelectionSettings,
}

impl MemoryStore {
    #[must_use]
    pub fn new(mut catalog: Vec<domain::ExerciseVariation>) -> Self {
        catalog.sort_by_key(|c| (c.exercise.id, c.variation.id));
        Self {
            catalog,
            users: RwLock::new(BTreeMap::new()),
            settings: domain::SelectionSettings::default(),
        }
    }

    pub fn from_json(catalog: &str) -> Result<Self, MemoryStoreError> {
        let catalog = serde_json::from_str::<Catalog>(catalog)?.into_combos()?;
        debug!("loaded catalog with {} variations", catalog.len());
        Ok(Self::new(catalog))
    }

    #[must_use]
    pub fn with_settings(mut self, settings: domain::SelectionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_user_state(mut self, state: domain::UserState) -> Self {
        if let Ok(users) = self.users.get_mut() {
            users.insert(state.user.id, state);
        }
        self
    }

    /// Add the user states of a JSON array, replacing states of the same users.
    pub fn load_user_states(&self, json: &str) -> Result<usize, MemoryStoreError> {
        let states = serde_json::from_str::<Vec<UserState>>(json)?
            .into_iter()
            .map(domain::UserState::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let count = states.len();
        let mut users = self.users.write().map_err(|_| MemoryStoreError::Poisoned)?;
        for state in states {
            users.insert(state.user.id, state);
        }
        debug!("loaded {count} user states");
        Ok(count)
    }

    pub fn user_states_to_json(&self) -> Result<String, MemoryStoreError> {
        let users = self.users.read().map_err(|_| MemoryStoreError::Poisoned)?;
        Ok(serde_json::to_string(
            &users.values().map(UserState::from).collect::<Vec<_>>(),
        )?)
    }

    pub fn catalog_to_json(&self) -> Result<String, MemoryStoreError> {
        Ok(serde_json::to_string(&Catalog::from(self.catalog.as_slice()))?)
    }
}

impl domain::CatalogRepository for MemoryStore {
    fn read_catalog(
        &self,
        section: Option<domain::Section>,
    ) -> Result<Vec<domain::ExerciseVariation>, domain::ReadError> {
        let section = section.filter(|s| !s.is_empty());
        let combos = self
            .catalog
            .iter()
            .filter(|c| section.is_none_or(|s| c.variation.section.has_any(s)))
            .cloned()
            .collect::<Vec<_>>();
        trace!(
            "read {} of {} catalog entries for section {}",
            combos.len(),
            self.catalog.len(),
            section.unwrap_or_default()
        );
        Ok(combos)
    }
}

impl domain::UserStateRepository for MemoryStore {
    fn read_user_state(&self, id: domain::UserID) -> Result<domain::UserState, domain::ReadError> {
        let users = self
            .users
            .read()
            .map_err(|_| domain::StorageError::from(MemoryStoreError::Poisoned))?;
        users
            .get(&id)
            .cloned()
            .ok_or(domain::ReadError::Storage(domain::StorageError::NotFound))
    }

    fn replace_user_state(
        &self,
        mut state: domain::UserState,
    ) -> Result<domain::UserState, domain::UpdateError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| domain::StorageError::from(MemoryStoreError::Poisoned))?;
        let Some(stored) = users.get_mut(&state.user.id) else {
            return Err(domain::UpdateError::Storage(
                domain::StorageError::NotFound,
            ));
        };
        if stored.revision != state.revision {
            debug!(
                "rejected user state based on revision {}, stored revision is {}",
                state.revision, stored.revision
            );
            return Err(domain::UpdateError::Conflict);
        }
        state.revision += 1;
        *stored = state.clone();
        Ok(state)
    }
}

impl domain::SettingsRepository for MemoryStore {
    fn read_settings(&self) -> Result<domain::SelectionSettings, domain::ReadError> {
        Ok(self.settings)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MemoryStoreError {
    #[error("lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    UserState(#[from] UserStateError),
}

impl From<MemoryStoreError> for domain::StorageError {
    fn from(value: MemoryStoreError) -> Self {
        domain::StorageError::Other(Box::new(value))
    }
}
