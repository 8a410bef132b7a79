use chrono::NaiveDate;
use log::{debug, error};

use crate::{
    CatalogRepository, Query, QueryError, QueryResult, ReadError, SelectionService,
    SelectionSettings, SettingsRepository, SettingsService, UpdateError, UserID, UserState,
    UserStateRepository, UserStateService,
};

/// Attempts to store seen variations before giving up on concurrent updates.
const RECORD_SEEN_ATTEMPTS: usize = 3;

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R: CatalogRepository> SelectionService for Service<R> {
    fn select(&self, query: &Query<'_>) -> Result<Vec<QueryResult>, QueryError> {
        log_on_error!(
            query.run(&self.repository),
            QueryError,
            "select",
            "exercises"
        )
    }
}

impl<R: UserStateRepository + SettingsRepository> UserStateService for Service<R> {
    fn get_user_state(&self, id: UserID) -> Result<UserState, ReadError> {
        log_on_error!(
            self.repository.read_user_state(id),
            ReadError,
            "get",
            "user state"
        )
    }

    fn record_seen(
        &self,
        id: UserID,
        results: &[QueryResult],
        today: NaiveDate,
    ) -> Result<UserState, UpdateError> {
        let settings = self.get_settings()?;
        let mut attempt = 1;
        loop {
            let mut state = self.get_user_state(id)?;
            state.mark_seen(results, today, u64::from(settings.refresh_days));
            match self.repository.replace_user_state(state) {
                Err(UpdateError::Conflict) if attempt < RECORD_SEEN_ATTEMPTS => {
                    debug!("user state changed concurrently, retrying (attempt {attempt})");
                    attempt += 1;
                }
                result => {
                    return log_on_error!(result, UpdateError, "replace", "user state");
                }
            }
        }
    }
}

impl<R: SettingsRepository> SettingsService for Service<R> {
    fn get_settings(&self) -> Result<SelectionSettings, ReadError> {
        log_on_error!(
            self.repository.read_settings(),
            ReadError,
            "get",
            "settings"
        )
    }
}
