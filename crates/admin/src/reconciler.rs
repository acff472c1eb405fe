//! Edit reconciler: one controller per admin editor.
//!
//! Wraps an [`EditSession`] with the network side of the workflow. Local
//! edits never touch the network; `load`, `save` and immediate deletes do,
//! and every failure they hit is both returned and queued as a [`Notice`].

use folio_core::content::DeleteMode;
use folio_core::records::Content;
use folio_core::session::{
    decode_persisted, ActionEffect, DeleteEffect, EditAction, EditSession, EditableRecord,
    SavePlan, SelectionMode, UpdateSummary,
};
use folio_core::types::{RecordId, RecordKey, TempId};
use folio_core::wire::{
    normalize_collection, BulkCreateResponse, BulkUpdateResponse, FailureReason,
};
use serde_json::Value;

use crate::error::{ReconcileError, TransportError};
use crate::notice::{Notice, NoticeAction};
use crate::transport::ResourceTransport;

/// What happened to a record the user deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// An unpublished record was dropped locally.
    Discarded,
    /// Hidden and queued; the server delete happens on the next save.
    Deferred,
    /// Deleted on the server immediately.
    Confirmed,
    /// The server delete failed; the record is back in the working set.
    RolledBack(ReconcileError),
    /// The server no longer had the record; it was dropped locally.
    Stale,
}

/// Result of [`EditReconciler::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Applied to the local session only.
    Local(ActionEffect),
    /// A delete, which may have reached the server.
    Deleted(DeleteOutcome),
}

/// Result of one save phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseResult<S> {
    /// There was no work for this phase.
    Skipped,
    Succeeded(S),
    Failed(ReconcileError),
}

impl<S> PhaseResult<S> {
    pub fn is_failed(&self) -> bool {
        matches!(self, PhaseResult::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PhaseResult::Skipped)
    }
}

/// Outcome of [`EditReconciler::save`], one entry per phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// The bulk update/delete call.
    pub update: PhaseResult<UpdateSummary>,
    /// The bulk create call; carries the ids assigned to new records.
    pub create: PhaseResult<Vec<RecordId>>,
    /// Whether the collection was reloaded afterwards.
    pub reloaded: bool,
}

impl SaveReport {
    fn nothing() -> Self {
        Self {
            update: PhaseResult::Skipped,
            create: PhaseResult::Skipped,
            reloaded: false,
        }
    }

    /// No call was made because there were no changes.
    pub fn nothing_to_save(&self) -> bool {
        self.update.is_skipped() && self.create.is_skipped()
    }

    pub fn is_success(&self) -> bool {
        !self.update.is_failed() && !self.create.is_failed()
    }
}

/// Controller bridging an optimistic local collection and the content API.
pub struct EditReconciler<T: Content, R: ResourceTransport> {
    transport: R,
    session: EditSession<T>,
    notices: Vec<Notice>,
    saving: bool,
}

impl<T: Content, R: ResourceTransport> EditReconciler<T, R> {
    pub fn new(transport: R) -> Self {
        Self {
            transport,
            session: EditSession::new(),
            notices: Vec::new(),
            saving: false,
        }
    }

    pub fn session(&self) -> &EditSession<T> {
        &self.session
    }

    pub fn records(&self) -> &[EditableRecord<T>] {
        self.session.records()
    }

    /// Whether a save is between [`begin_save`](Self::begin_save) and
    /// [`finish_save`](Self::finish_save). The UI disables its save trigger
    /// while this is true.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -- Load --------------------------------------------------------------

    /// Fetch the collection and replace the working set, clearing all
    /// tracking. On failure the current working set is left as it was.
    ///
    /// Returns the number of records loaded.
    pub async fn load(&mut self) -> Result<usize, ReconcileError> {
        let kind = T::KIND;
        let raw = match self.transport.list(kind).await {
            Ok(raw) => raw,
            Err(e) => return Err(self.fail(NoticeAction::Load, e.into())),
        };

        let items = normalize_collection(raw, kind.list_key());
        let (records, rejected) = decode_persisted::<T>(items);
        if rejected > 0 {
            tracing::warn!(collection = kind.slug(), rejected, "Skipped unreadable records");
            self.notices.push(Notice::warning(
                NoticeAction::Load,
                format!("{rejected} record(s) could not be read and are not shown"),
            ));
        }

        let count = records.len();
        self.session.replace_all(records);
        tracing::debug!(collection = kind.slug(), count, "Collection loaded");
        Ok(count)
    }

    // -- Messages ----------------------------------------------------------

    /// Apply one editor message.
    ///
    /// Everything but `Delete` stays local. `Delete` follows the content
    /// type's delete discipline, as [`delete`](Self::delete) does.
    pub async fn dispatch(&mut self, action: EditAction<T>) -> Result<Dispatched, ReconcileError> {
        match action {
            EditAction::Delete { key } => self.delete(&key).await.map(Dispatched::Deleted),
            local => Ok(Dispatched::Local(self.session.dispatch(local)?)),
        }
    }

    // -- Local edits -------------------------------------------------------

    /// Set one field. Persisted records become dirty; no network call.
    pub fn edit_field(
        &mut self,
        key: &RecordKey,
        field: &str,
        value: Value,
    ) -> Result<(), ReconcileError> {
        Ok(self.session.edit_field(key, field, value)?)
    }

    /// Add an unpublished record with the given values and select it.
    pub fn add_new(&mut self, defaults: T) -> TempId {
        self.session.add_new(defaults)
    }

    /// Add an unpublished record with the type's placeholder values.
    pub fn add_placeholder(&mut self) -> TempId {
        self.session.add_new(T::placeholder())
    }

    /// Focus a record in the edit form. The returned mode tells the form
    /// whether it needs an explicit publish.
    pub fn select_for_editing(&mut self, key: RecordKey) -> Result<SelectionMode, ReconcileError> {
        Ok(self.session.select(key)?)
    }

    // -- Delete ------------------------------------------------------------

    /// Delete a record.
    ///
    /// Unpublished records are dropped locally. Persisted records are
    /// hidden at once; depending on the content type the server delete is
    /// sent now (rolled back on failure) or on the next save.
    pub async fn delete(&mut self, key: &RecordKey) -> Result<DeleteOutcome, ReconcileError> {
        let kind = T::KIND;
        let effect = self.session.delete(key)?;
        let id = match (effect, key) {
            (DeleteEffect::Marked, RecordKey::Persisted(id)) => id,
            _ => return Ok(DeleteOutcome::Discarded),
        };

        if kind.delete_mode() == DeleteMode::Deferred {
            return Ok(DeleteOutcome::Deferred);
        }

        match self.transport.delete_one(kind, id).await {
            Ok(()) => {
                self.session.confirm_deleted(id);
                tracing::info!(collection = kind.slug(), record_id = %id, "Record deleted");
                Ok(DeleteOutcome::Confirmed)
            }
            Err(e) => match ReconcileError::from(e) {
                ReconcileError::NotFound(message) => {
                    self.session.forget(id);
                    self.notices.push(Notice::warning(
                        NoticeAction::Delete,
                        format!("Record was already removed: {message}"),
                    ));
                    Ok(DeleteOutcome::Stale)
                }
                err => {
                    self.session.restore_deleted(id);
                    let err = self.fail(NoticeAction::Delete, err);
                    Ok(DeleteOutcome::RolledBack(err))
                }
            },
        }
    }

    // -- Save --------------------------------------------------------------

    /// Push all local changes: one bulk update/delete call and one bulk
    /// create call, each only if it has work. The phases are independent: a
    /// failed update does not prevent the create.
    ///
    /// After both phases succeed the collection is reloaded, unless edits
    /// made while the save was in flight are still pending.
    pub async fn save(&mut self) -> Result<SaveReport, ReconcileError> {
        let Some(plan) = self.begin_save()? else {
            return Ok(SaveReport::nothing());
        };

        let kind = plan.kind;
        let update = match &plan.update {
            Some(request) => Some(self.transport.bulk_update(kind, request).await),
            None => None,
        };
        let create = match &plan.create {
            Some(request) => Some(self.transport.bulk_create(kind, request).await),
            None => None,
        };

        Ok(self.finish_save(plan, update, create).await)
    }

    /// Capture the diff to save. `None` (with an info notice) when there is
    /// nothing to save.
    ///
    /// For UIs that run the network calls elsewhere; pair with
    /// [`finish_save`](Self::finish_save).
    pub fn begin_save(&mut self) -> Result<Option<SavePlan>, ReconcileError> {
        let plan = self.session.plan_save()?;
        match plan {
            Some(plan) => {
                self.saving = true;
                Ok(Some(plan))
            }
            None => {
                self.notices
                    .push(Notice::info(NoticeAction::Save, "Nothing to save"));
                Ok(None)
            }
        }
    }

    /// Fold the answers to a captured plan back into the session.
    ///
    /// `update` and `create` are the results of the calls the plan asked
    /// for; `None` for a phase the plan had no work for.
    pub async fn finish_save(
        &mut self,
        plan: SavePlan,
        update: Option<Result<BulkUpdateResponse, TransportError>>,
        create: Option<Result<BulkCreateResponse, TransportError>>,
    ) -> SaveReport {
        let update = match update {
            Some(result) => self.fold_update(&plan, result),
            None => PhaseResult::Skipped,
        };
        let create = match create {
            Some(result) => self.fold_create(&plan, result),
            None => PhaseResult::Skipped,
        };
        self.saving = false;

        let mut report = SaveReport {
            update,
            create,
            reloaded: false,
        };
        if !report.is_success() {
            return report;
        }

        if self.session.has_changes() {
            self.notices.push(Notice::info(
                NoticeAction::Save,
                "Saved. Changes made during the save are kept for the next save",
            ));
            return report;
        }

        report.reloaded = self.load().await.is_ok();
        report
    }

    fn fold_update(
        &mut self,
        plan: &SavePlan,
        result: Result<BulkUpdateResponse, TransportError>,
    ) -> PhaseResult<UpdateSummary> {
        let kind = plan.kind;
        let response = match result {
            Ok(response) => response,
            Err(e) => return PhaseResult::Failed(self.fail(NoticeAction::SaveUpdate, e.into())),
        };

        if !response.success && response.failed.is_empty() {
            // Nothing says which records failed; keep everything for retry.
            let err = ReconcileError::Rejected {
                status: 200,
                message: response.message,
            };
            return PhaseResult::Failed(self.fail(NoticeAction::SaveUpdate, err));
        }

        let summary = self.session.apply_update_outcome(plan, &response.failed);
        tracing::info!(
            collection = kind.slug(),
            applied = summary.applied.len(),
            stale = summary.stale.len(),
            kept = summary.kept.len(),
            restored = summary.restored.len(),
            "Bulk update answered",
        );

        if response.failed.is_empty() {
            return PhaseResult::Succeeded(summary);
        }

        for failure in &response.failed {
            let notice = match failure.reason {
                FailureReason::NotFound => Notice::warning(
                    NoticeAction::SaveUpdate,
                    format!("{} no longer exists and was removed", failure.id),
                ),
                FailureReason::Validation | FailureReason::Conflict => Notice::error(
                    NoticeAction::SaveUpdate,
                    format!("{}: {}", failure.id, failure.message),
                ),
            };
            self.notices.push(notice);
        }
        PhaseResult::Failed(ReconcileError::PartialBatch(response.failed))
    }

    fn fold_create(
        &mut self,
        plan: &SavePlan,
        result: Result<BulkCreateResponse, TransportError>,
    ) -> PhaseResult<Vec<RecordId>> {
        let response = match result {
            Ok(response) => response,
            Err(e) => return PhaseResult::Failed(self.fail(NoticeAction::SaveCreate, e.into())),
        };

        match self.session.apply_create_outcome(plan, response.records) {
            Ok(ids) => {
                tracing::info!(
                    collection = plan.kind.slug(),
                    count = ids.len(),
                    "New records published",
                );
                PhaseResult::Succeeded(ids)
            }
            Err(e) => PhaseResult::Failed(self.fail(NoticeAction::SaveCreate, e.into())),
        }
    }

    /// Queue an error notice and hand the error back.
    fn fail(&mut self, action: NoticeAction, err: ReconcileError) -> ReconcileError {
        tracing::warn!(collection = T::KIND.slug(), %action, error = %err, "Operation failed");
        self.notices.push(Notice::error(action, err.to_string()));
        err
    }
}
