//! Profile CRUD on top of the [`Store`], recording every mutation.

use chrono::Utc;
use tracing::info;

use crate::error::{CmError, Result};
use crate::history::{ChangeAction, HistoryRecorder};
use crate::profile::{ModelOverrides, Profile, ProfileUpdate};
use crate::store::Store;

/// Entry point for everything that reads or changes profiles.
///
/// Construct one per invocation and pass it to whoever needs it.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    store: Store,
}

impl ProfileRegistry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn open_default() -> Self {
        Self::new(Store::open_default())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn history(&self) -> HistoryRecorder<'_> {
        HistoryRecorder::new(&self.store)
    }

    pub fn add_model(
        &self,
        name: &str,
        token: &str,
        base_url: &str,
        description: Option<&str>,
        overrides: ModelOverrides,
    ) -> Result<Profile> {
        if name.trim().is_empty() || token.trim().is_empty() || base_url.trim().is_empty() {
            return Err(CmError::validation("Name, token, and baseUrl are required"));
        }

        let mut data = self.store.read_store()?;
        if data.find(name).is_some() {
            return Err(CmError::conflict(name));
        }

        let profile = Profile::new(name, token, base_url, description, overrides, Utc::now());
        data.models.push(profile.clone());
        self.store.write_store(&data)?;
        self.history()
            .add_change(ChangeAction::Add, name, format!("Added new model: {name}"))?;

        info!(model = name, id = %profile.id, "added model");
        Ok(profile)
    }

    pub fn list_models(&self) -> Result<Vec<Profile>> {
        Ok(self.store.read_store()?.models)
    }

    pub fn get_model(&self, name: &str) -> Result<Option<Profile>> {
        Ok(self.store.read_store()?.find(name).cloned())
    }

    pub fn remove_model(&self, name: &str) -> Result<Profile> {
        let mut data = self.store.read_store()?;
        let index = data.position(name).ok_or_else(|| CmError::not_found(name))?;

        let removed = data.models.remove(index);
        if data.is_current(name) {
            data.current_model = None;
        }
        self.store.write_store(&data)?;
        self.history()
            .add_change(ChangeAction::Remove, name, format!("Removed model: {name}"))?;

        info!(model = name, "removed model");
        Ok(removed)
    }

    /// Select `name` and stamp its `lastUsed`. Does not launch anything.
    pub fn switch_model(&self, name: &str) -> Result<Profile> {
        let mut data = self.store.read_store()?;
        let index = data.position(name).ok_or_else(|| CmError::not_found(name))?;

        data.models[index].last_used = Some(Utc::now());
        data.current_model = Some(name.to_string());
        let profile = data.models[index].clone();
        self.store.write_store(&data)?;
        self.history()
            .add_change(ChangeAction::Switch, name, format!("Switched to model: {name}"))?;

        info!(model = name, "switched model");
        Ok(profile)
    }

    pub fn get_current_model(&self) -> Result<Option<Profile>> {
        Ok(self.store.read_store()?.current().cloned())
    }

    /// Apply a sparse patch. A rename of the current model moves the
    /// selection along with it in the same write.
    pub fn update_model(&self, name: &str, update: ProfileUpdate) -> Result<Profile> {
        update.validate()?;

        let mut data = self.store.read_store()?;
        let index = data.position(name).ok_or_else(|| CmError::not_found(name))?;

        let new_name = update.renames(name).map(str::to_string);
        if let Some(new_name) = &new_name
            && data.find(new_name).is_some()
        {
            return Err(CmError::conflict(new_name.as_str()));
        }

        let profile = &mut data.models[index];
        update.apply_to(profile);
        profile.updated_at = Some(Utc::now());
        let updated = profile.clone();

        if let Some(new_name) = &new_name
            && data.is_current(name)
        {
            data.current_model = Some(new_name.clone());
        }
        self.store.write_store(&data)?;
        self.history()
            .add_change(ChangeAction::Update, name, format!("Updated model: {name}"))?;

        info!(model = name, renamed_to = new_name.as_deref(), "updated model");
        Ok(updated)
    }
}
