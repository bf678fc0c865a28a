use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use remedy_core::form::{parse_field_equals, FormEntry, FormName, FormValues};
use remedy_core::RemedyError;
use serde_json::{json, Value};

use crate::{AttachmentPart, FormService};

/// An attachment received by the mock, with the entry it was attached to.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub form: FormName,
    pub request_id: String,
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: bytes::Bytes,
}

#[derive(Default)]
struct MockState {
    entries: HashMap<&'static str, Vec<FormValues>>,
    uploads: Vec<RecordedUpload>,
    next_id: u64,
}

/// In-memory FormService for tests.
///
/// Entries get a sequential `Request ID` on insert. Queries understand
/// single-field equality qualifications only.
#[derive(Default)]
pub struct MockFormService {
    state: Mutex<MockState>,
    username: Option<String>,
    failure: Option<String>,
}

impl MockFormService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every call fails with a transport error.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Store an entry directly, keeping any `Request ID` it already has.
    pub fn insert(&self, form: FormName, mut values: FormValues) -> FormEntry {
        let mut state = self.state.lock().unwrap();
        if !values.contains_key("Request ID") {
            state.next_id += 1;
            values.insert(
                "Request ID".into(),
                Value::String(format!("{:015}", state.next_id)),
            );
        }
        state
            .entries
            .entry(form.as_str())
            .or_default()
            .push(values.clone());
        FormEntry::new(values)
    }

    pub fn entries(&self, form: FormName) -> Vec<FormValues> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .get(form.as_str())
            .cloned()
            .unwrap_or_default()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    fn check(&self) -> Result<(), RemedyError> {
        match &self.failure {
            Some(msg) => Err(RemedyError::Transport(msg.clone())),
            None => Ok(()),
        }
    }

    fn merge(
        &self,
        form: FormName,
        request_id: &str,
        values: &FormValues,
    ) -> Result<(), RemedyError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entries
            .get_mut(form.as_str())
            .and_then(|list| {
                list.iter_mut()
                    .find(|v| v.get("Request ID").and_then(Value::as_str) == Some(request_id))
            })
            .ok_or_else(|| RemedyError::NotFound(format!("{form}/{request_id}")))?;
        for (k, v) in values {
            entry.insert(k.clone(), v.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl FormService for MockFormService {
    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    async fn query_entries(
        &self,
        form: FormName,
        qualification: &str,
    ) -> Result<Vec<FormEntry>, RemedyError> {
        self.check()?;
        let (field, value) = parse_field_equals(qualification).ok_or_else(|| {
            RemedyError::InvalidInput(format!("unsupported qualification: {qualification}"))
        })?;
        Ok(self
            .entries(form)
            .into_iter()
            .filter(|v| v.get(&field).and_then(Value::as_str) == Some(value.as_str()))
            .map(FormEntry::new)
            .collect())
    }

    async fn get_entry(&self, form: FormName, request_id: &str) -> Result<FormEntry, RemedyError> {
        self.check()?;
        self.entries(form)
            .into_iter()
            .find(|v| v.get("Request ID").and_then(Value::as_str) == Some(request_id))
            .map(FormEntry::new)
            .ok_or_else(|| RemedyError::NotFound(format!("{form}/{request_id}")))
    }

    async fn create_entry(
        &self,
        form: FormName,
        values: &FormValues,
    ) -> Result<FormEntry, RemedyError> {
        self.check()?;
        let mut values = values.clone();
        values.remove("Request ID");
        Ok(self.insert(form, values))
    }

    async fn update_entry(
        &self,
        form: FormName,
        request_id: &str,
        values: &FormValues,
    ) -> Result<u16, RemedyError> {
        self.check()?;
        self.merge(form, request_id, values)?;
        Ok(204)
    }

    async fn update_entry_with_attachment(
        &self,
        form: FormName,
        request_id: &str,
        values: &FormValues,
        attachment: AttachmentPart,
    ) -> Result<u16, RemedyError> {
        self.check()?;
        self.merge(form, request_id, values)?;
        self.state.lock().unwrap().uploads.push(RecordedUpload {
            form,
            request_id: request_id.to_string(),
            field: attachment.field,
            file_name: attachment.file_name,
            content_type: attachment.content_type,
            data: attachment.data,
        });
        Ok(204)
    }

    async fn get_form_fields(
        &self,
        form: &str,
        field_ids: Option<&str>,
    ) -> Result<Value, RemedyError> {
        self.check()?;
        Ok(json!([{ "name": "Request ID", "id": 1, "form": form, "ids": field_ids }]))
    }
}
