//! Edit session state machine.
//!
//! One [`EditSession`] backs one admin editor. It owns the working copy of
//! a record collection and tracks which persisted records were changed or
//! deleted and which records were created locally. Nothing here performs
//! I/O: [`EditSession::plan_save`] captures the diff as request bodies and
//! the `apply_*` methods fold the server's answers back in.
//!
//! Invariants:
//! - `dirty` and `deleted` only hold persistent ids.
//! - A persistent id is in at most one of `dirty` and `deleted`.
//! - A deleted record is not in the visible working set.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::content::ContentType;
use crate::records::Content;
use crate::types::{RecordId, RecordKey, TempId, ID_FIELD};
use crate::wire::{BulkCreateRequest, BulkUpdateRequest, FailureReason, RecordFailure};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A record in the working set, tagged with its lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub enum EditableRecord<T> {
    /// Known to the server.
    Persisted { id: RecordId, fields: T },
    /// Created locally, not yet published.
    Pending { temp_id: TempId, fields: T },
}

impl<T> EditableRecord<T> {
    pub fn key(&self) -> RecordKey {
        match self {
            EditableRecord::Persisted { id, .. } => RecordKey::Persisted(id.clone()),
            EditableRecord::Pending { temp_id, .. } => RecordKey::Temp(*temp_id),
        }
    }

    pub fn fields(&self) -> &T {
        match self {
            EditableRecord::Persisted { fields, .. } | EditableRecord::Pending { fields, .. } => {
                fields
            }
        }
    }

    fn fields_mut(&mut self) -> &mut T {
        match self {
            EditableRecord::Persisted { fields, .. } | EditableRecord::Pending { fields, .. } => {
                fields
            }
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, EditableRecord::Pending { .. })
    }

    fn matches(&self, key: &RecordKey) -> bool {
        match (self, key) {
            (EditableRecord::Persisted { id, .. }, RecordKey::Persisted(k)) => id == k,
            (EditableRecord::Pending { temp_id, .. }, RecordKey::Temp(k)) => temp_id == k,
            _ => false,
        }
    }
}

/// Decode server records (`{ _id, ...fields }`) into typed records.
///
/// Returns the decoded records in order and the number of entries that had
/// no string `_id` or did not match the record type.
pub fn decode_persisted<T: Content>(items: Vec<Value>) -> (Vec<(RecordId, T)>, usize) {
    let mut records = Vec::with_capacity(items.len());
    let mut rejected = 0;
    for item in items {
        let Some(id) = item.get(ID_FIELD).and_then(Value::as_str).map(RecordId::from) else {
            rejected += 1;
            continue;
        };
        match serde_json::from_value::<T>(item) {
            Ok(fields) => records.push((id, fields)),
            Err(_) => rejected += 1,
        }
    }
    (records, rejected)
}

// ---------------------------------------------------------------------------
// Errors and effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No record {0} in the working set")]
    UnknownRecord(RecordKey),

    #[error("Cannot set field '{field}': {message}")]
    Field { field: String, message: String },

    #[error("Failed to encode record: {0}")]
    Encode(String),

    #[error("Server created {created} record(s) for {submitted} submitted")]
    CreateMismatch { submitted: usize, created: usize },
}

/// What a local delete did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteEffect {
    /// An unpublished record was dropped; nothing to tell the server.
    Discarded,
    /// A persisted record was hidden and queued for deletion.
    Marked,
}

/// Form mode derived from the selected record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// A temporary record; the form needs an explicit publish.
    Unpublished,
    /// A persisted record; edits go straight into the dirty set.
    Existing,
}

/// Messages accepted by [`EditSession::dispatch`].
#[derive(Debug, Clone)]
pub enum EditAction<T> {
    EditField {
        key: RecordKey,
        field: String,
        value: Value,
    },
    AddNew {
        defaults: T,
    },
    Delete {
        key: RecordKey,
    },
    Select {
        key: RecordKey,
    },
    ClearSelection,
}

/// Result of a dispatched [`EditAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEffect {
    Edited,
    Added(TempId),
    Deleted(DeleteEffect),
    Selected(SelectionMode),
    SelectionCleared,
}

// ---------------------------------------------------------------------------
// Save plans
// ---------------------------------------------------------------------------

/// The diff captured at save time.
///
/// Edits made after the plan was captured are not part of it and stay
/// tracked for the next save.
#[derive(Debug, Clone)]
pub struct SavePlan {
    pub kind: ContentType,
    /// Present when there are dirty or deleted records.
    pub update: Option<BulkUpdateRequest>,
    /// Present when there are pending new records.
    pub create: Option<BulkCreateRequest>,
    dirty_revisions: BTreeMap<RecordId, u64>,
    deleted_ids: Vec<RecordId>,
    pending: Vec<(TempId, Value)>,
}

impl SavePlan {
    pub fn updated_ids(&self) -> impl Iterator<Item = &RecordId> {
        self.dirty_revisions.keys()
    }

    pub fn deleted_ids(&self) -> &[RecordId] {
        &self.deleted_ids
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// How a bulk update answer was folded into the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Ids whose tracking was cleared.
    pub applied: Vec<RecordId>,
    /// Ids the server no longer has; evicted locally.
    pub stale: Vec<RecordId>,
    /// Ids still dirty because the server rejected them.
    pub kept: Vec<RecordId>,
    /// Deleted records put back because the server refused the delete.
    pub restored: Vec<RecordId>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Tombstone<T> {
    index: usize,
    fields: T,
    /// Edit revision if the record was dirty when deleted.
    dirty: Option<u64>,
}

/// Working copy and change tracking for one editor.
#[derive(Debug, Clone)]
pub struct EditSession<T: Content> {
    working_set: Vec<EditableRecord<T>>,
    dirty: BTreeMap<RecordId, u64>,
    deleted: BTreeMap<RecordId, Tombstone<T>>,
    selection: Option<RecordKey>,
    revision: u64,
}

impl<T: Content> Default for EditSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Content> EditSession<T> {
    pub fn new() -> Self {
        Self {
            working_set: Vec::new(),
            dirty: BTreeMap::new(),
            deleted: BTreeMap::new(),
            selection: None,
            revision: 0,
        }
    }

    pub fn kind(&self) -> ContentType {
        T::KIND
    }

    // -- Accessors ---------------------------------------------------------

    /// Records currently shown: persisted ones in server order, then the
    /// pending ones in creation order (unless promoted in place).
    pub fn records(&self) -> &[EditableRecord<T>] {
        &self.working_set
    }

    pub fn get(&self, key: &RecordKey) -> Option<&EditableRecord<T>> {
        self.working_set.iter().find(|r| r.matches(key))
    }

    pub fn dirty_ids(&self) -> BTreeSet<RecordId> {
        self.dirty.keys().cloned().collect()
    }

    pub fn deleted_ids(&self) -> BTreeSet<RecordId> {
        self.deleted.keys().cloned().collect()
    }

    pub fn pending_new_records(&self) -> impl Iterator<Item = &EditableRecord<T>> {
        self.working_set.iter().filter(|r| r.is_new())
    }

    pub fn is_dirty(&self, id: &RecordId) -> bool {
        self.dirty.contains_key(id)
    }

    pub fn is_deleted(&self, id: &RecordId) -> bool {
        self.deleted.contains_key(id)
    }

    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty() || !self.deleted.is_empty() || self.pending_new_records().count() > 0
    }

    pub fn selection(&self) -> Option<&RecordKey> {
        self.selection.as_ref()
    }

    /// Form mode of the current selection.
    pub fn selection_mode(&self) -> Option<SelectionMode> {
        self.selection.as_ref().map(|key| match key {
            RecordKey::Temp(_) => SelectionMode::Unpublished,
            RecordKey::Persisted(_) => SelectionMode::Existing,
        })
    }

    // -- Messages ----------------------------------------------------------

    pub fn dispatch(&mut self, action: EditAction<T>) -> Result<ActionEffect, SessionError> {
        match action {
            EditAction::EditField { key, field, value } => {
                self.edit_field(&key, &field, value).map(|()| ActionEffect::Edited)
            }
            EditAction::AddNew { defaults } => Ok(ActionEffect::Added(self.add_new(defaults))),
            EditAction::Delete { key } => self.delete(&key).map(ActionEffect::Deleted),
            EditAction::Select { key } => self.select(key).map(ActionEffect::Selected),
            EditAction::ClearSelection => {
                self.selection = None;
                Ok(ActionEffect::SelectionCleared)
            }
        }
    }

    /// Replace the working set with a fresh server copy and clear tracking.
    pub fn replace_all(&mut self, records: Vec<(RecordId, T)>) {
        self.working_set = records
            .into_iter()
            .map(|(id, fields)| EditableRecord::Persisted { id, fields })
            .collect();
        self.dirty.clear();
        self.deleted.clear();
        let keep_selection = match &self.selection {
            Some(key @ RecordKey::Persisted(_)) => self.working_set.iter().any(|r| r.matches(key)),
            _ => false,
        };
        if !keep_selection {
            self.selection = None;
        }
    }

    /// Set one named field through the record's wire representation.
    ///
    /// Unknown fields and values the record type cannot hold are rejected
    /// and leave the record untouched.
    pub fn edit_field(
        &mut self,
        key: &RecordKey,
        field: &str,
        value: Value,
    ) -> Result<(), SessionError> {
        let record = self
            .working_set
            .iter_mut()
            .find(|r| r.matches(key))
            .ok_or_else(|| SessionError::UnknownRecord(key.clone()))?;

        let field_error = |message: String| SessionError::Field {
            field: field.to_string(),
            message,
        };

        let not_a_field = || field_error(format!("not a field of {}", T::KIND.entity_name()));

        let mut doc = serde_json::to_value(record.fields())
            .map_err(|e| SessionError::Encode(e.to_string()))?;
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| SessionError::Encode("record is not a JSON object".into()))?;

        // Optional fields may be absent from this record; the placeholder
        // carries every field a user can edit.
        if !obj.contains_key(field) {
            let template = serde_json::to_value(T::placeholder())
                .map_err(|e| SessionError::Encode(e.to_string()))?;
            if template.get(field).is_none() {
                return Err(not_a_field());
            }
        }
        obj.insert(field.to_string(), value.clone());

        let updated: T = serde_json::from_value(doc).map_err(|e| field_error(e.to_string()))?;

        // Serde ignores unknown keys and may coerce values; read the field
        // back to make sure the edit actually landed.
        let echoed = serde_json::to_value(&updated).map_err(|e| SessionError::Encode(e.to_string()))?;
        let landed = match echoed.get(field) {
            Some(v) => *v == value,
            None => value.is_null(),
        };
        if !landed {
            return Err(not_a_field());
        }

        *record.fields_mut() = updated;
        self.mark_dirty(key);
        Ok(())
    }

    fn mark_dirty(&mut self, key: &RecordKey) {
        self.revision += 1;
        if let RecordKey::Persisted(id) = key {
            self.dirty.insert(id.clone(), self.revision);
        }
    }

    /// Append an unpublished record and select it.
    pub fn add_new(&mut self, defaults: T) -> TempId {
        let temp_id = TempId::generate();
        self.working_set.push(EditableRecord::Pending {
            temp_id,
            fields: defaults,
        });
        self.selection = Some(RecordKey::Temp(temp_id));
        temp_id
    }

    /// Remove a record from the visible working set.
    ///
    /// Pending records are dropped outright. Persisted records leave the
    /// dirty set and enter the deleted set with a tombstone that
    /// [`restore_deleted`](Self::restore_deleted) can roll back.
    pub fn delete(&mut self, key: &RecordKey) -> Result<DeleteEffect, SessionError> {
        let index = self
            .working_set
            .iter()
            .position(|r| r.matches(key))
            .ok_or_else(|| SessionError::UnknownRecord(key.clone()))?;
        let record = self.working_set.remove(index);

        if self.selection.as_ref() == Some(key) {
            self.selection = None;
        }

        match record {
            EditableRecord::Pending { .. } => Ok(DeleteEffect::Discarded),
            EditableRecord::Persisted { id, fields } => {
                let dirty = self.dirty.remove(&id);
                self.deleted.insert(
                    id,
                    Tombstone {
                        index,
                        fields,
                        dirty,
                    },
                );
                Ok(DeleteEffect::Marked)
            }
        }
    }

    /// Put a deleted record back where it was, dirty again if it was dirty
    /// before. Returns `false` if `id` was not marked for deletion.
    pub fn restore_deleted(&mut self, id: &RecordId) -> bool {
        let Some(tombstone) = self.deleted.remove(id) else {
            return false;
        };
        let index = tombstone.index.min(self.working_set.len());
        if let Some(revision) = tombstone.dirty {
            self.dirty.insert(id.clone(), revision);
        }
        self.working_set.insert(
            index,
            EditableRecord::Persisted {
                id: id.clone(),
                fields: tombstone.fields,
            },
        );
        true
    }

    /// The server confirmed a deletion; stop tracking it.
    pub fn confirm_deleted(&mut self, id: &RecordId) -> bool {
        self.deleted.remove(id).is_some()
    }

    /// Drop every trace of a persistent id (the server no longer has it).
    pub fn forget(&mut self, id: &RecordId) {
        let key = RecordKey::Persisted(id.clone());
        self.working_set.retain(|r| !r.matches(&key));
        self.dirty.remove(id);
        self.deleted.remove(id);
        if self.selection.as_ref() == Some(&key) {
            self.selection = None;
        }
    }

    /// Focus a record in the edit form. No tracking side effects.
    pub fn select(&mut self, key: RecordKey) -> Result<SelectionMode, SessionError> {
        if self.get(&key).is_none() {
            return Err(SessionError::UnknownRecord(key));
        }
        let mode = if key.is_temp() {
            SelectionMode::Unpublished
        } else {
            SelectionMode::Existing
        };
        self.selection = Some(key);
        Ok(mode)
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // -- Save --------------------------------------------------------------

    /// Capture the current diff. `None` means there is nothing to save.
    pub fn plan_save(&self) -> Result<Option<SavePlan>, SessionError> {
        if !self.has_changes() {
            return Ok(None);
        }

        let update = if self.dirty.is_empty() && self.deleted.is_empty() {
            None
        } else {
            let mut updated = Vec::with_capacity(self.dirty.len());
            for record in &self.working_set {
                if let EditableRecord::Persisted { id, fields } = record {
                    if self.dirty.contains_key(id) {
                        let mut doc = encode(fields)?;
                        if let Value::Object(map) = &mut doc {
                            map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
                        }
                        updated.push(doc);
                    }
                }
            }
            Some(BulkUpdateRequest {
                updated,
                deleted_ids: self.deleted.keys().map(RecordId::to_string).collect(),
            })
        };

        let mut pending = Vec::new();
        for record in &self.working_set {
            if let EditableRecord::Pending { temp_id, fields } = record {
                pending.push((*temp_id, encode(fields)?));
            }
        }
        let create = if pending.is_empty() {
            None
        } else {
            Some(BulkCreateRequest {
                records: pending.iter().map(|(_, doc)| doc.clone()).collect(),
            })
        };

        Ok(Some(SavePlan {
            kind: T::KIND,
            update,
            create,
            dirty_revisions: self.dirty.clone(),
            deleted_ids: self.deleted.keys().cloned().collect(),
            pending,
        }))
    }

    /// Fold a bulk update answer into the session.
    ///
    /// `failures` lists the records the server could not apply; everything
    /// else in the plan's update phase is treated as applied.
    pub fn apply_update_outcome(
        &mut self,
        plan: &SavePlan,
        failures: &[RecordFailure],
    ) -> UpdateSummary {
        let failed: HashMap<&str, FailureReason> = failures
            .iter()
            .map(|f| (f.id.as_str(), f.reason))
            .collect();
        let mut summary = UpdateSummary::default();

        for (id, planned_rev) in &plan.dirty_revisions {
            match failed.get(id.as_str()) {
                Some(FailureReason::NotFound) => {
                    self.forget(id);
                    summary.stale.push(id.clone());
                }
                Some(FailureReason::Validation | FailureReason::Conflict) => {
                    summary.kept.push(id.clone());
                }
                None => {
                    // Edited again while the request was in flight: keep it.
                    if self.dirty.get(id) == Some(planned_rev) {
                        self.dirty.remove(id);
                    }
                    summary.applied.push(id.clone());
                }
            }
        }

        for id in &plan.deleted_ids {
            match failed.get(id.as_str()) {
                Some(FailureReason::NotFound) => {
                    self.forget(id);
                    summary.stale.push(id.clone());
                }
                Some(FailureReason::Validation | FailureReason::Conflict) => {
                    if self.restore_deleted(id) {
                        summary.restored.push(id.clone());
                    }
                }
                None => {
                    self.confirm_deleted(id);
                    summary.applied.push(id.clone());
                }
            }
        }

        summary
    }

    /// Promote the plan's pending records using the records the server
    /// created (same order as submitted). Returns the new persistent ids.
    ///
    /// A record edited locally after the plan was captured keeps its local
    /// fields and becomes dirty; one deleted meanwhile is queued for
    /// deletion under its new id.
    pub fn apply_create_outcome(
        &mut self,
        plan: &SavePlan,
        created: Vec<Value>,
    ) -> Result<Vec<RecordId>, SessionError> {
        if created.len() != plan.pending.len() {
            return Err(SessionError::CreateMismatch {
                submitted: plan.pending.len(),
                created: created.len(),
            });
        }

        let mut new_ids = Vec::with_capacity(created.len());
        for ((temp_id, submitted), server_doc) in plan.pending.iter().zip(created) {
            let id = server_doc
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .map(RecordId::from)
                .ok_or_else(|| SessionError::Encode("created record has no _id".into()))?;
            let temp_key = RecordKey::Temp(*temp_id);

            match self.working_set.iter().position(|r| r.matches(&temp_key)) {
                Some(index) => {
                    let local = self.working_set[index].fields().clone();
                    let edited_since = encode(&local)? != *submitted;
                    let fields = if edited_since {
                        local
                    } else {
                        serde_json::from_value::<T>(server_doc.clone()).unwrap_or(local)
                    };
                    self.working_set[index] = EditableRecord::Persisted {
                        id: id.clone(),
                        fields,
                    };
                    if edited_since {
                        self.revision += 1;
                        self.dirty.insert(id.clone(), self.revision);
                    }
                    if self.selection.as_ref() == Some(&temp_key) {
                        self.selection = Some(RecordKey::Persisted(id.clone()));
                    }
                }
                None => {
                    // Discarded while the create was in flight.
                    if let Ok(fields) = serde_json::from_value::<T>(server_doc) {
                        self.deleted.insert(
                            id.clone(),
                            Tombstone {
                                index: self.working_set.len(),
                                fields,
                                dirty: None,
                            },
                        );
                    }
                }
            }
            new_ids.push(id);
        }
        Ok(new_ids)
    }
}

fn encode<T: Content>(fields: &T) -> Result<Value, SessionError> {
    serde_json::to_value(fields).map_err(|e| SessionError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Certification, Education, Stat};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn cert(name: &str) -> Certification {
        Certification {
            name: name.into(),
            issuer: "Issuer".into(),
            date: "2024".into(),
            order: 0,
        }
    }

    fn loaded(names: &[&str]) -> EditSession<Certification> {
        let mut session = EditSession::new();
        session.replace_all(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| (RecordId::new((i + 1).to_string()), cert(n)))
                .collect(),
        );
        session
    }

    fn pid(id: &str) -> RecordKey {
        RecordKey::Persisted(RecordId::new(id))
    }

    #[test]
    fn test_edit_marks_persisted_record_dirty() {
        let mut session = loaded(&["A", "B"]);
        session.edit_field(&pid("1"), "name", json!("A2")).unwrap();
        session.edit_field(&pid("1"), "name", json!("A2")).unwrap();

        assert_eq!(session.dirty_ids(), BTreeSet::from([RecordId::new("1")]));
        assert_eq!(session.get(&pid("1")).unwrap().fields().name, "A2");
    }

    #[test]
    fn test_edit_on_temp_record_is_not_tracked_as_dirty() {
        let mut session = loaded(&[]);
        let temp = session.add_new(cert("New"));
        session
            .edit_field(&RecordKey::Temp(temp), "issuer", json!("AWS"))
            .unwrap();
        assert!(session.dirty_ids().is_empty());
        assert_eq!(session.pending_new_records().count(), 1);
    }

    #[test]
    fn test_edit_unknown_field_is_rejected_and_record_unchanged() {
        let mut session = loaded(&["A"]);
        let err = session
            .edit_field(&pid("1"), "nmae", json!("typo"))
            .unwrap_err();
        assert_matches!(err, SessionError::Field { .. });
        let err = session
            .edit_field(&pid("1"), "nmae", Value::Null)
            .unwrap_err();
        assert_matches!(err, SessionError::Field { .. });
        assert!(session.dirty_ids().is_empty());
        assert_eq!(session.get(&pid("1")).unwrap().fields().name, "A");
    }

    #[test]
    fn test_clearing_optional_field_is_accepted() {
        let mut session = EditSession::<Stat>::new();
        session.replace_all(vec![(RecordId::new("s1"), Stat::placeholder())]);

        session.edit_field(&pid("s1"), "suffix", Value::Null).unwrap();
        assert_eq!(session.get(&pid("s1")).unwrap().fields().suffix, None);

        // Absent now, but still a field of the type.
        session.edit_field(&pid("s1"), "suffix", json!("%")).unwrap();
        assert_eq!(
            session.get(&pid("s1")).unwrap().fields().suffix.as_deref(),
            Some("%")
        );
    }

    #[test]
    fn test_dirty_iff_edited_since_last_load() {
        #[derive(Clone, Copy)]
        enum Step {
            Edit(&'static str),
            Reload,
        }
        use Step::{Edit, Reload};

        let cases: &[&[Step]] = &[
            &[],
            &[Edit("1")],
            &[Edit("1"), Edit("1"), Edit("1")],
            &[Edit("1"), Reload],
            &[Edit("1"), Reload, Edit("2")],
            &[Reload, Edit("2"), Edit("1"), Reload],
            &[Edit("2"), Reload, Reload, Edit("2")],
        ];

        for steps in cases {
            let mut session = loaded(&["A", "B"]);
            let mut expected = BTreeSet::new();
            for (n, step) in steps.iter().enumerate() {
                match *step {
                    Edit(id) => {
                        session
                            .edit_field(&pid(id), "name", json!(format!("edit {n}")))
                            .unwrap();
                        expected.insert(RecordId::new(id));
                    }
                    Reload => {
                        session.replace_all(vec![
                            (RecordId::new("1"), cert("A")),
                            (RecordId::new("2"), cert("B")),
                        ]);
                        expected.clear();
                    }
                }
            }
            assert_eq!(session.dirty_ids(), expected);
        }
    }

    #[test]
    fn test_edit_with_wrong_type_is_rejected() {
        let mut session = loaded(&["A"]);
        let err = session
            .edit_field(&pid("1"), "order", json!("first"))
            .unwrap_err();
        assert_matches!(err, SessionError::Field { .. });
    }

    #[test]
    fn test_add_then_delete_temp_leaves_nothing_pending() {
        let mut session = loaded(&["A"]);
        let temp = session.add_new(cert("New"));
        assert_eq!(session.selection_mode(), Some(SelectionMode::Unpublished));

        let effect = session.delete(&RecordKey::Temp(temp)).unwrap();
        assert_eq!(effect, DeleteEffect::Discarded);
        assert_eq!(session.pending_new_records().count(), 0);
        assert!(session.selection().is_none());
        assert!(session.plan_save().unwrap().is_none());
    }

    #[test]
    fn test_delete_dirty_record_moves_it_to_deleted() {
        let mut session = loaded(&["A", "B"]);
        session.edit_field(&pid("2"), "name", json!("B2")).unwrap();
        session.select(pid("2")).unwrap();

        assert_eq!(session.delete(&pid("2")).unwrap(), DeleteEffect::Marked);
        assert!(!session.is_dirty(&RecordId::new("2")));
        assert!(session.is_deleted(&RecordId::new("2")));
        assert!(session.get(&pid("2")).is_none());
        assert!(session.selection().is_none());
    }

    #[test]
    fn test_restore_deleted_puts_record_back_in_place() {
        let mut session = loaded(&["A", "B", "C"]);
        session.delete(&pid("2")).unwrap();
        assert!(session.restore_deleted(&RecordId::new("2")));

        let names: Vec<_> = session.records().iter().map(|r| r.fields().name.clone()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(session.deleted_ids().is_empty());
    }

    #[test]
    fn test_restored_record_keeps_pending_edits() {
        let mut session = loaded(&["A", "B"]);
        session.edit_field(&pid("2"), "name", json!("B2")).unwrap();
        session.delete(&pid("2")).unwrap();
        assert!(session.restore_deleted(&RecordId::new("2")));

        assert!(session.is_dirty(&RecordId::new("2")));
        assert_eq!(session.get(&pid("2")).unwrap().fields().name, "B2");
    }

    #[test]
    fn test_select_unknown_record_fails() {
        let mut session = loaded(&["A"]);
        assert!(session.select(pid("9")).is_err());
        assert_eq!(session.select(pid("1")).unwrap(), SelectionMode::Existing);
    }

    #[test]
    fn test_plan_save_builds_both_envelopes() {
        let mut session = loaded(&["A", "B", "C"]);
        session.edit_field(&pid("1"), "name", json!("A2")).unwrap();
        session.edit_field(&pid("2"), "name", json!("B2")).unwrap();
        session.delete(&pid("3")).unwrap();
        session.add_new(cert("N1"));

        let plan = session.plan_save().unwrap().unwrap();
        let update = plan.update.as_ref().unwrap();
        assert_eq!(update.updated.len(), 2);
        assert_eq!(update.updated[0]["_id"], "1");
        assert_eq!(update.updated[0]["name"], "A2");
        assert_eq!(update.updated[1]["_id"], "2");
        assert_eq!(update.deleted_ids, vec!["3"]);

        let create = plan.create.as_ref().unwrap();
        assert_eq!(create.records.len(), 1);
        assert_eq!(create.records[0]["name"], "N1");
        assert!(create.records[0].get("_id").is_none());
    }

    #[test]
    fn test_only_creates_skips_update_phase() {
        let mut session = loaded(&["A"]);
        session.add_new(cert("N1"));
        let plan = session.plan_save().unwrap().unwrap();
        assert!(plan.update.is_none());
        assert!(plan.create.is_some());
    }

    #[test]
    fn test_update_outcome_clears_applied_and_keeps_later_edits() {
        let mut session = loaded(&["A", "B"]);
        session.edit_field(&pid("1"), "name", json!("A2")).unwrap();
        session.edit_field(&pid("2"), "name", json!("B2")).unwrap();
        let plan = session.plan_save().unwrap().unwrap();

        // Edit made while the request is in flight.
        session.edit_field(&pid("2"), "name", json!("B3")).unwrap();

        let summary = session.apply_update_outcome(&plan, &[]);
        assert_eq!(summary.applied.len(), 2);
        assert_eq!(session.dirty_ids(), BTreeSet::from([RecordId::new("2")]));
    }

    #[test]
    fn test_partial_failure_keeps_exactly_the_failed_records() {
        let mut session = loaded(&["A", "B", "C", "D"]);
        session.edit_field(&pid("1"), "name", json!("A2")).unwrap();
        session.edit_field(&pid("2"), "name", json!("")).unwrap();
        session.edit_field(&pid("3"), "name", json!("C2")).unwrap();
        session.delete(&pid("4")).unwrap();
        let plan = session.plan_save().unwrap().unwrap();

        let failures = vec![
            RecordFailure {
                id: "2".into(),
                reason: FailureReason::Validation,
                message: "name is required".into(),
            },
            RecordFailure {
                id: "3".into(),
                reason: FailureReason::NotFound,
                message: "gone".into(),
            },
        ];
        let summary = session.apply_update_outcome(&plan, &failures);

        assert_eq!(summary.kept, vec![RecordId::new("2")]);
        assert_eq!(summary.stale, vec![RecordId::new("3")]);
        assert_eq!(session.dirty_ids(), BTreeSet::from([RecordId::new("2")]));
        assert!(session.deleted_ids().is_empty());
        assert!(session.get(&pid("3")).is_none());
    }

    #[test]
    fn test_refused_delete_is_restored() {
        let mut session = loaded(&["A", "B"]);
        session.delete(&pid("1")).unwrap();
        let plan = session.plan_save().unwrap().unwrap();
        let failures = vec![RecordFailure {
            id: "1".into(),
            reason: FailureReason::Conflict,
            message: "still referenced".into(),
        }];
        let summary = session.apply_update_outcome(&plan, &failures);
        assert_eq!(summary.restored, vec![RecordId::new("1")]);
        assert!(session.get(&pid("1")).is_some());
    }

    #[test]
    fn test_create_outcome_promotes_pending_records() {
        let mut session = loaded(&[]);
        let temp = session.add_new(cert(" N1 "));
        let plan = session.plan_save().unwrap().unwrap();

        let created = vec![json!({"_id": "srv-1", "name": "N1", "issuer": "Issuer", "date": "2024", "order": 0})];
        let ids = session.apply_create_outcome(&plan, created).unwrap();

        assert_eq!(ids, vec![RecordId::new("srv-1")]);
        assert_eq!(session.pending_new_records().count(), 0);
        let record = session.get(&pid("srv-1")).unwrap();
        assert_eq!(record.fields().name, "N1");
        assert_eq!(session.selection(), Some(&pid("srv-1")));
        assert!(session.get(&RecordKey::Temp(temp)).is_none());
        assert!(!session.has_changes());
    }

    #[test]
    fn test_create_outcome_keeps_edits_made_in_flight() {
        let mut session = loaded(&[]);
        let temp = session.add_new(cert("N1"));
        let plan = session.plan_save().unwrap().unwrap();
        session
            .edit_field(&RecordKey::Temp(temp), "name", json!("N1 edited"))
            .unwrap();

        let created = vec![json!({"_id": "srv-1", "name": "N1", "issuer": "Issuer", "date": "2024"})];
        session.apply_create_outcome(&plan, created).unwrap();

        assert_eq!(session.get(&pid("srv-1")).unwrap().fields().name, "N1 edited");
        assert!(session.is_dirty(&RecordId::new("srv-1")));
    }

    #[test]
    fn test_create_outcome_queues_delete_for_record_discarded_in_flight() {
        let mut session = loaded(&[]);
        let temp = session.add_new(cert("N1"));
        let plan = session.plan_save().unwrap().unwrap();
        session.delete(&RecordKey::Temp(temp)).unwrap();

        let created = vec![json!({"_id": "srv-1", "name": "N1", "issuer": "Issuer", "date": "2024"})];
        session.apply_create_outcome(&plan, created).unwrap();
        assert!(session.is_deleted(&RecordId::new("srv-1")));
    }

    #[test]
    fn test_create_outcome_count_mismatch() {
        let mut session = loaded(&[]);
        session.add_new(cert("N1"));
        let plan = session.plan_save().unwrap().unwrap();
        assert_eq!(
            session.apply_create_outcome(&plan, vec![]),
            Err(SessionError::CreateMismatch {
                submitted: 1,
                created: 0
            })
        );
    }

    #[test]
    fn test_replace_all_clears_tracking() {
        let mut session = loaded(&["A", "B"]);
        session.edit_field(&pid("1"), "name", json!("A2")).unwrap();
        session.delete(&pid("2")).unwrap();
        session.add_new(cert("N"));

        session.replace_all(vec![(RecordId::new("1"), cert("A2"))]);
        assert!(!session.has_changes());
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn test_decode_persisted_skips_records_without_id() {
        let items = vec![
            json!({"_id": "1", "degree": "BSc", "institution": "U", "period": "p", "description": "d"}),
            json!({"degree": "MSc", "institution": "U", "period": "p", "description": "d"}),
            json!({"_id": "3", "degree": 5}),
        ];
        let (records, rejected) = decode_persisted::<Education>(items);
        assert_eq!(records.len(), 1);
        assert_eq!(rejected, 2);
    }

    #[test]
    fn test_dispatch_routes_messages() {
        let mut session = loaded(&["A"]);
        let effect = session
            .dispatch(EditAction::AddNew {
                defaults: cert("N"),
            })
            .unwrap();
        let ActionEffect::Added(temp) = effect else {
            panic!("expected Added, got {effect:?}");
        };
        assert_eq!(
            session
                .dispatch(EditAction::Select {
                    key: RecordKey::Temp(temp)
                })
                .unwrap(),
            ActionEffect::Selected(SelectionMode::Unpublished)
        );
        assert_eq!(
            session
                .dispatch(EditAction::EditField {
                    key: pid("1"),
                    field: "issuer".into(),
                    value: json!("GCP"),
                })
                .unwrap(),
            ActionEffect::Edited
        );
        assert_eq!(
            session.dispatch(EditAction::ClearSelection).unwrap(),
            ActionEffect::SelectionCleared
        );
    }
}
