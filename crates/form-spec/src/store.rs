use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EntityKind, FormError};
use crate::spec::{
    Answer, AnswerId, Field, FieldId, Form, FormId, FormWriteRequest, Response, ResponseId,
    ResponseWriteRequest,
};
use crate::validate::{
    FieldDraft, ResponsePolicy, ValidationErrors, validate_answer, validate_field_spec,
    validate_title,
};
use crate::view::{AnswerDetail, FormDetail, FormSummary, ResponseDetail};

/// Order in which a form's fields are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// Ascending position; equal positions fall back to creation order.
    #[default]
    Position,
    /// Creation order.
    Creation,
}

/// Order in which a form's responses are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TableCounts {
    pub forms: usize,
    pub fields: usize,
    pub responses: usize,
    pub answers: usize,
}

/// Last identifier handed out per table. Identifiers are never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    forms: u64,
    fields: u64,
    responses: u64,
    answers: u64,
}

impl Sequences {
    fn next(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }
}

enum FieldChange {
    Create(FieldDraft),
    Update(FieldId, FieldDraft),
    Delete(FieldId),
}

struct FormPlan {
    title: String,
    description: Option<Option<String>>,
    changes: Vec<FieldChange>,
}

/// The four tables behind forms and their responses.
///
/// Every write is checked in full before anything is touched and is then
/// applied to a working copy that replaces the tables only on success, so a
/// rejected write leaves no trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormStore {
    #[serde(default)]
    forms: BTreeMap<FormId, Form>,
    #[serde(default)]
    fields: BTreeMap<FieldId, Field>,
    #[serde(default)]
    responses: BTreeMap<ResponseId, Response>,
    #[serde(default)]
    answers: BTreeMap<AnswerId, Answer>,
    #[serde(default)]
    sequences: Sequences,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> TableCounts {
        TableCounts {
            forms: self.forms.len(),
            fields: self.fields.len(),
            responses: self.responses.len(),
            answers: self.answers.len(),
        }
    }

    fn transaction<T>(
        &mut self,
        op: impl FnOnce(&mut FormStore) -> Result<T, FormError>,
    ) -> Result<T, FormError> {
        let mut working = self.clone();
        let output = op(&mut working)?;
        *self = working;
        Ok(output)
    }

    /// Create a form and every field listed in the request.
    pub fn create_form(&mut self, request: &FormWriteRequest) -> Result<FormId, FormError> {
        self.write_form(None, request)
    }

    /// Apply a nested write to an existing form: retitle it and create,
    /// update, or delete its fields in one step.
    pub fn update_form(
        &mut self,
        id: FormId,
        request: &FormWriteRequest,
    ) -> Result<FormId, FormError> {
        self.form(id)?;
        self.write_form(Some(id), request)
    }

    fn write_form(
        &mut self,
        target: Option<FormId>,
        request: &FormWriteRequest,
    ) -> Result<FormId, FormError> {
        let plan = self.plan_form_write(target, request).inspect_err(|err| {
            warn!(form_id = ?target.map(FormId::get), error = %err, "form write rejected");
        })?;
        self.transaction(|store| store.apply_form_plan(target, plan))
    }

    fn plan_form_write(
        &self,
        target: Option<FormId>,
        request: &FormWriteRequest,
    ) -> Result<FormPlan, FormError> {
        let mut errors = ValidationErrors::new();
        validate_title(&request.title, &mut errors);

        let mut seen = HashSet::new();
        let mut changes = Vec::with_capacity(request.fields.len());
        for (index, spec) in request.fields.iter().enumerate() {
            let path = format!("fields[{index}]");
            let existing = match spec.id {
                Some(id) => Some(self.owned_field(target, id)?),
                None => None,
            };

            if let Some(id) = spec.id
                && !seen.insert(id)
            {
                errors.add(&path, "id", "appears more than once", "duplicate_field");
                continue;
            }

            if spec.delete {
                if let Some(field) = existing {
                    changes.push(FieldChange::Delete(field.id));
                }
                continue;
            }

            if let Some(draft) = validate_field_spec(spec, existing, &path, &mut errors) {
                changes.push(match existing {
                    Some(field) => FieldChange::Update(field.id, draft),
                    None => FieldChange::Create(draft),
                });
            }
        }
        errors.into_result()?;

        Ok(FormPlan {
            title: request.title.clone(),
            description: request.description.as_deref().map(normalize_description),
            changes,
        })
    }

    fn owned_field(&self, target: Option<FormId>, id: FieldId) -> Result<&Field, FormError> {
        self.fields
            .get(&id)
            .filter(|field| Some(field.form_id) == target)
            .ok_or_else(|| FormError::reference(EntityKind::Field, id))
    }

    fn apply_form_plan(
        &mut self,
        target: Option<FormId>,
        plan: FormPlan,
    ) -> Result<FormId, FormError> {
        let now = Utc::now();
        let form_id = match target {
            Some(id) => {
                let form = self
                    .forms
                    .get_mut(&id)
                    .ok_or_else(|| FormError::not_found(EntityKind::Form, id))?;
                form.title = plan.title;
                if let Some(description) = plan.description {
                    form.description = description;
                }
                form.updated_at = now;
                id
            }
            None => {
                let id = FormId(Sequences::next(&mut self.sequences.forms));
                self.forms.insert(
                    id,
                    Form {
                        id,
                        title: plan.title,
                        description: plan.description.flatten(),
                        created_at: now,
                        updated_at: now,
                    },
                );
                id
            }
        };

        let (mut created, mut updated, mut deleted) = (0, 0, 0);
        for change in plan.changes {
            match change {
                FieldChange::Create(draft) => {
                    let id = FieldId(Sequences::next(&mut self.sequences.fields));
                    self.fields.insert(
                        id,
                        Field {
                            id,
                            form_id,
                            label: draft.label,
                            position: draft.position,
                            config: draft.config,
                            created_at: now,
                            updated_at: now,
                        },
                    );
                    created += 1;
                }
                FieldChange::Update(id, draft) => {
                    let field = self
                        .fields
                        .get_mut(&id)
                        .ok_or_else(|| FormError::reference(EntityKind::Field, id))?;
                    field.label = draft.label;
                    field.position = draft.position;
                    field.config = draft.config;
                    field.updated_at = now;
                    updated += 1;
                }
                FieldChange::Delete(id) => {
                    self.remove_field_rows(id);
                    deleted += 1;
                }
            }
        }

        info!(form_id = form_id.get(), created, updated, deleted, "form saved");
        Ok(form_id)
    }

    fn remove_field_rows(&mut self, id: FieldId) -> usize {
        self.fields.remove(&id);
        let before = self.answers.len();
        self.answers.retain(|_, answer| answer.field_id != id);
        before - self.answers.len()
    }

    /// Create a response and all of its answers, or nothing at all.
    pub fn submit_response(
        &mut self,
        request: &ResponseWriteRequest,
        policy: &ResponsePolicy,
    ) -> Result<ResponseId, FormError> {
        let form_id = request.form_id;
        if !self.forms.contains_key(&form_id) {
            return Err(FormError::reference(EntityKind::Form, form_id));
        }

        let mut errors = ValidationErrors::new();
        let mut seen = HashSet::new();
        for (index, spec) in request.answers.iter().enumerate() {
            let path = format!("answers[{index}]");
            let field = self
                .fields
                .get(&spec.field_id)
                .ok_or_else(|| FormError::reference(EntityKind::Field, spec.field_id))?;
            if field.form_id != form_id {
                errors.add(
                    &path,
                    "field_id",
                    "does not belong to this form",
                    "field_form_mismatch",
                );
                continue;
            }
            if !seen.insert(field.id) {
                errors.add(
                    &path,
                    "field_id",
                    "is answered more than once",
                    "duplicate_answer",
                );
                continue;
            }
            validate_answer(field, &spec.value, policy, &path, &mut errors);
        }
        errors.into_result().inspect_err(|errors| {
            warn!(form_id = form_id.get(), errors = errors.len(), "response rejected");
        })?;

        self.transaction(|store| {
            let now = Utc::now();
            let id = ResponseId(Sequences::next(&mut store.sequences.responses));
            store.responses.insert(
                id,
                Response {
                    id,
                    form_id,
                    created_at: now,
                    updated_at: now,
                },
            );
            for spec in &request.answers {
                let answer_id = AnswerId(Sequences::next(&mut store.sequences.answers));
                store.answers.insert(
                    answer_id,
                    Answer {
                        id: answer_id,
                        response_id: id,
                        field_id: spec.field_id,
                        value: spec.value.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
            info!(
                form_id = form_id.get(),
                response_id = id.get(),
                answers = request.answers.len(),
                "response submitted"
            );
            Ok(id)
        })
    }

    /// Remove a form with its fields, responses, and their answers.
    pub fn delete_form(&mut self, id: FormId) -> Result<(), FormError> {
        self.form(id)?;
        self.transaction(|store| {
            store.forms.remove(&id);
            let field_ids: BTreeSet<FieldId> = store
                .fields
                .values()
                .filter(|field| field.form_id == id)
                .map(|field| field.id)
                .collect();
            let response_ids: BTreeSet<ResponseId> = store
                .responses
                .values()
                .filter(|response| response.form_id == id)
                .map(|response| response.id)
                .collect();
            store.fields.retain(|field_id, _| !field_ids.contains(field_id));
            store
                .responses
                .retain(|response_id, _| !response_ids.contains(response_id));
            store.answers.retain(|_, answer| {
                !response_ids.contains(&answer.response_id) && !field_ids.contains(&answer.field_id)
            });
            info!(
                form_id = id.get(),
                fields = field_ids.len(),
                responses = response_ids.len(),
                "form deleted"
            );
            Ok(())
        })
    }

    /// Remove one field and the answers given for it.
    pub fn delete_field(&mut self, id: FieldId) -> Result<(), FormError> {
        self.field(id)?;
        self.transaction(|store| {
            let answers = store.remove_field_rows(id);
            info!(field_id = id.get(), answers, "field deleted");
            Ok(())
        })
    }

    /// Remove a response of `form_id` and its answers.
    pub fn delete_response(&mut self, form_id: FormId, id: ResponseId) -> Result<(), FormError> {
        self.form_response(form_id, id)?;
        self.transaction(|store| {
            store.responses.remove(&id);
            store.answers.retain(|_, answer| answer.response_id != id);
            info!(form_id = form_id.get(), response_id = id.get(), "response deleted");
            Ok(())
        })
    }

    pub fn form(&self, id: FormId) -> Result<&Form, FormError> {
        self.forms
            .get(&id)
            .ok_or_else(|| FormError::not_found(EntityKind::Form, id))
    }

    pub fn field(&self, id: FieldId) -> Result<&Field, FormError> {
        self.fields
            .get(&id)
            .ok_or_else(|| FormError::not_found(EntityKind::Field, id))
    }

    pub fn response(&self, id: ResponseId) -> Result<&Response, FormError> {
        self.responses
            .get(&id)
            .ok_or_else(|| FormError::not_found(EntityKind::Response, id))
    }

    /// A response looked up through the form it belongs to.
    pub fn form_response(&self, form_id: FormId, id: ResponseId) -> Result<&Response, FormError> {
        self.form(form_id)?;
        self.response(id)
            .ok()
            .filter(|response| response.form_id == form_id)
            .ok_or_else(|| FormError::not_found(EntityKind::Response, id))
    }

    /// Fields of a form in the requested order.
    pub fn fields(&self, form_id: FormId, order: FieldOrder) -> Result<Vec<&Field>, FormError> {
        self.form(form_id)?;
        let mut fields = self
            .fields
            .values()
            .filter(|field| field.form_id == form_id)
            .collect::<Vec<_>>();
        match order {
            FieldOrder::Position => fields.sort_by_key(|field| (field.position, field.id)),
            FieldOrder::Creation => fields.sort_by_key(|field| field.id),
        }
        Ok(fields)
    }

    /// Responses of a form in the requested order.
    pub fn responses(
        &self,
        form_id: FormId,
        order: ResponseOrder,
    ) -> Result<Vec<&Response>, FormError> {
        self.form(form_id)?;
        let mut responses = self
            .responses
            .values()
            .filter(|response| response.form_id == form_id)
            .collect::<Vec<_>>();
        responses.sort_by_key(|response| (response.created_at, response.id));
        if order == ResponseOrder::NewestFirst {
            responses.reverse();
        }
        Ok(responses)
    }

    /// Answers of a response in no particular order.
    pub fn answers(&self, response_id: ResponseId) -> Result<Vec<&Answer>, FormError> {
        self.response(response_id)?;
        Ok(self
            .answers
            .values()
            .filter(|answer| answer.response_id == response_id)
            .collect())
    }

    /// Every form, oldest first, with field and response counts.
    pub fn form_summaries(&self) -> Vec<FormSummary> {
        self.forms
            .values()
            .map(|form| FormSummary {
                id: form.id,
                title: form.title.clone(),
                description: form.description.clone(),
                field_count: self
                    .fields
                    .values()
                    .filter(|field| field.form_id == form.id)
                    .count(),
                response_count: self
                    .responses
                    .values()
                    .filter(|response| response.form_id == form.id)
                    .count(),
                created_at: form.created_at,
            })
            .collect()
    }

    /// A form with its fields in position order.
    pub fn form_detail(&self, id: FormId) -> Result<FormDetail, FormError> {
        let form = self.form(id)?.clone();
        let fields = self
            .fields(id, FieldOrder::Position)?
            .into_iter()
            .cloned()
            .collect();
        Ok(FormDetail { form, fields })
    }

    /// A response of `form_id` with its answers joined to their fields, listed in position order.
    pub fn response_detail(
        &self,
        form_id: FormId,
        id: ResponseId,
    ) -> Result<ResponseDetail, FormError> {
        let form = self.form(form_id)?;
        let response = self.form_response(form_id, id)?.clone();
        let answers = self.answers(id)?;

        let mut details = Vec::with_capacity(answers.len());
        for field in self.fields(form_id, FieldOrder::Position)? {
            details.extend(
                answers
                    .iter()
                    .filter(|answer| answer.field_id == field.id)
                    .map(|answer| AnswerDetail {
                        answer_id: answer.id,
                        field_id: field.id,
                        label: field.label.clone(),
                        field_type: field.field_type(),
                        position: field.position,
                        options: field.options().to_vec(),
                        value: answer.value.clone(),
                    }),
            );
        }

        Ok(ResponseDetail {
            response,
            form_title: form.title.clone(),
            answers: details,
        })
    }

    /// A response request with one empty answer per field, in position order.
    pub fn blank_response(&self, form_id: FormId) -> Result<ResponseWriteRequest, FormError> {
        let request = self
            .fields(form_id, FieldOrder::Position)?
            .into_iter()
            .fold(ResponseWriteRequest::new(form_id), |request, field| {
                request.with_answer(field.id, "")
            });
        Ok(request)
    }
}

fn normalize_description(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}
