use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};

use super::controller::{
    FormController, FormError, FormId, FormResult, SubmitStatus, transition_submit_status,
    write_lock,
};
use super::values::FormValues;

pub trait FormDraftStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save(&self, form_id: FormId, values: &FormValues) -> Result<(), Self::Error>;
    fn load(&self, form_id: FormId) -> Result<Option<FormValues>, Self::Error>;
    fn clear(&self, form_id: FormId) -> Result<(), Self::Error>;
}

/// Process-local store. A writer that panicked does not lose earlier drafts.
#[derive(Clone, Default)]
pub struct InMemoryDraftStore {
    drafts: Arc<RwLock<BTreeMap<FormId, FormValues>>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_drafts<R>(&self, f: impl FnOnce(&mut BTreeMap<FormId, FormValues>) -> R) -> R {
        let mut drafts = self.drafts.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut drafts)
    }
}

impl FormDraftStore for InMemoryDraftStore {
    type Error = Infallible;

    fn save(&self, form_id: FormId, values: &FormValues) -> Result<(), Self::Error> {
        self.with_drafts(|drafts| drafts.insert(form_id, values.clone()));
        Ok(())
    }

    fn load(&self, form_id: FormId) -> Result<Option<FormValues>, Self::Error> {
        Ok(self.with_drafts(|drafts| drafts.get(&form_id).cloned()))
    }

    fn clear(&self, form_id: FormId) -> Result<(), Self::Error> {
        self.with_drafts(|drafts| drafts.remove(&form_id));
        Ok(())
    }
}

impl FormController {
    pub fn save_draft<S>(&self, store: &S) -> FormResult<()>
    where
        S: FormDraftStore,
    {
        let values = self.values()?;
        store
            .save(self.id, &values)
            .map_err(|error| FormError::DraftSaveFailed(error.to_string()))
    }

    /// Replaces current values with the stored draft. Entries the schema no
    /// longer knows, or whose kind changed, are skipped.
    pub fn load_draft<S>(&self, store: &S) -> FormResult<bool>
    where
        S: FormDraftStore,
    {
        self.ensure_alive()?;
        let Some(draft) = store
            .load(self.id)
            .map_err(|error| FormError::DraftLoadFailed(error.to_string()))?
        else {
            return Ok(false);
        };

        let mut state = write_lock(&self.state, "loading draft into form")?;
        if state.submission.status == SubmitStatus::Submitting {
            return Err(FormError::InvalidStateTransition {
                from: SubmitStatus::Submitting,
                to: SubmitStatus::Idle,
            });
        }
        for (key, value) in draft {
            match self.schema.field(key) {
                Some(spec) if spec.kind() == value.kind() => {
                    state.values.insert(key, value);
                    state.refresh_dirty(key);
                }
                _ => tracing::debug!(form_id = self.id.0, field = %key, "skipping stale draft entry"),
            }
        }
        state.errors.clear_all();
        transition_submit_status(&mut state, SubmitStatus::Idle)?;
        state.submission.last_error = None;
        state.submission.attempts = 0;
        Ok(true)
    }

    pub fn clear_draft<S>(&self, store: &S) -> FormResult<()>
    where
        S: FormDraftStore,
    {
        store
            .clear(self.id)
            .map_err(|error| FormError::DraftClearFailed(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FieldKey;

    const ACCOUNT: FieldKey = FieldKey::new("account");

    #[test]
    fn store_survives_a_panicking_writer() {
        let store = InMemoryDraftStore::new();
        let form_id = FormId(7);
        let mut values = FormValues::new();
        values.insert(ACCOUNT, "CH93 0076 2011 6238 5295 7".into());
        store.save(form_id, &values).expect("save draft");

        let crashing = store.clone();
        let crashed = std::thread::spawn(move || {
            crashing.with_drafts(|_| panic!("writer crashed mid-save"));
        })
        .join();
        assert!(crashed.is_err());

        assert_eq!(store.load(form_id).expect("load draft"), Some(values));
        store.clear(form_id).expect("clear draft");
        assert_eq!(store.load(form_id).expect("load cleared draft"), None);
    }
}
