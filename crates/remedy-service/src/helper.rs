use chrono::Utc;
use remedy_core::attachment::{read_payload, AttachmentRequest, ATTACHMENT_FIELD};
use remedy_core::form::{field_equals, FormEntry, FormName, FormValues, Visibility};
use remedy_core::work_order::{self, ImportedWorkOrder};
use remedy_core::{Order, RemedyConfig, RemedyError};
use serde_json::Value;
use tracing::{info, warn};

use crate::{AttachmentPart, FormService};

/// Result of attaching a file: the work order as stored after the upload
/// and the status code of the update call.
#[derive(Debug, Clone)]
pub struct AttachmentOutcome {
    pub values: FormValues,
    pub status: u16,
}

/// Maps platform records onto Remedy forms.
///
/// Every operation is a single independent call; nothing is retried or
/// deduplicated, so submitting the same payload twice creates two entries.
pub struct RemedyHelper<S> {
    service: S,
    config: RemedyConfig,
}

impl<S: FormService> RemedyHelper<S> {
    pub fn new(service: S, config: RemedyConfig) -> Result<Self, RemedyError> {
        config.validate()?;
        Ok(Self { service, config })
    }

    pub fn config(&self) -> &RemedyConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn into_service(self) -> S {
        self.service
    }

    async fn query(
        &self,
        form: FormName,
        field: &str,
        value: &str,
    ) -> Result<Vec<FormEntry>, RemedyError> {
        let entries = self
            .service
            .query_entries(form, &field_equals(field, value))
            .await?;
        if entries.is_empty() {
            warn!("no {form} entry with {field} = {value}");
            return Err(RemedyError::NotFound(format!("{form} where {field} = {value}")));
        }
        Ok(entries)
    }

    async fn first(
        &self,
        form: FormName,
        field: &str,
        value: &str,
    ) -> Result<FormEntry, RemedyError> {
        let mut entries = self.query(form, field, value).await?;
        Ok(entries.swap_remove(0))
    }

    // -- Work orders --

    pub async fn submit_work_order(&self, values: &FormValues) -> Result<FormValues, RemedyError> {
        let entry = self
            .service
            .create_entry(FormName::WorkOrderInterface, values)
            .await?;
        info!(
            "created work order {}",
            entry.field_str("Work Order ID").unwrap_or("(id not returned)")
        );
        Ok(entry.values)
    }

    /// Map `order` to work order values without submitting anything.
    pub fn build_work_order(&self, order: &Order) -> Result<FormValues, RemedyError> {
        work_order::build_work_order(order, &self.config)
    }

    pub async fn create_work_order(&self, order: &Order) -> Result<FormValues, RemedyError> {
        let values = self.build_work_order(order)?;
        info!(
            "submitting {} work order for order {}",
            order.item.type_name(),
            order.id
        );
        self.submit_work_order(&values).await
    }

    pub async fn get_work_order(&self, work_order_id: &str) -> Result<FormEntry, RemedyError> {
        self.first(FormName::WorkOrderInterface, "Work Order ID", work_order_id)
            .await
    }

    pub async fn get_work_order_tasks(
        &self,
        work_order_id: &str,
    ) -> Result<Vec<FormEntry>, RemedyError> {
        self.query(FormName::Task, "RootRequestID", work_order_id)
            .await
    }

    /// Update a task and return it as stored afterwards.
    pub async fn set_work_order_task(
        &self,
        task_id: &str,
        values: &FormValues,
    ) -> Result<FormValues, RemedyError> {
        self.service
            .update_entry(FormName::Task, task_id, values)
            .await?;
        info!("updated task {task_id}");
        let entry = self.service.get_entry(FormName::Task, task_id).await?;
        Ok(entry.values)
    }

    pub async fn create_work_order_note(
        &self,
        work_order_id: &str,
        note: &str,
        visibility: Visibility,
    ) -> Result<FormValues, RemedyError> {
        let submitter = self.service.username().ok_or_else(|| {
            RemedyError::InvalidInput("work log submitter unknown: no username".into())
        })?;
        let values =
            work_order::work_order_note(work_order_id, note, submitter, visibility, Utc::now());
        let entry = self.service.create_entry(FormName::WorkInfo, &values).await?;
        info!("added work log to {work_order_id}");
        Ok(entry.values)
    }

    /// Attach a local file to a work order.
    ///
    /// Files at or above the configured cap are cut to their trailing
    /// bytes. An unreadable file fails the call before anything is sent.
    pub async fn attach_file_to_work_order(
        &self,
        request: &AttachmentRequest,
    ) -> Result<AttachmentOutcome, RemedyError> {
        let work_order = self.get_work_order(&request.work_order_id).await?;
        let request_id = work_order
            .field_str("Request ID")
            .ok_or_else(|| {
                RemedyError::NotFound(format!(
                    "request id for work order {}",
                    request.work_order_id
                ))
            })?
            .to_string();

        let data = read_payload(&request.path, self.config.attachment_size_cap_bytes)?;
        let size = data.len();

        let mut values = FormValues::new();
        values.insert("z1D_Details".into(), Value::String(request.details.clone()));
        values.insert(
            "z1D_View_Access".into(),
            Value::String(request.visibility.as_str().into()),
        );
        values.insert(
            "z1D_Activity_Type".into(),
            Value::String("General Information".into()),
        );
        values.insert("z1D_Secure_Log".into(), Value::String("Yes".into()));
        values.insert(
            ATTACHMENT_FIELD.into(),
            Value::String(request.file_name.clone()),
        );

        let part = AttachmentPart {
            field: ATTACHMENT_FIELD.to_string(),
            file_name: request.file_name.clone(),
            content_type: request.content_type.clone(),
            data,
        };
        let status = self
            .service
            .update_entry_with_attachment(FormName::WorkOrder, &request_id, &values, part)
            .await?;
        info!(
            "attached {} ({size} bytes) to work order {}",
            request.file_name, request.work_order_id
        );

        let refreshed = self
            .service
            .get_entry(FormName::WorkOrder, &request_id)
            .await?;
        Ok(AttachmentOutcome {
            values: refreshed.values,
            status,
        })
    }

    /// Fetch a work order and reduce it to the record the platform keeps.
    pub async fn import_work_order(
        &self,
        work_order_id: &str,
        order_id: Option<&str>,
    ) -> Result<ImportedWorkOrder, RemedyError> {
        let entry = self.get_work_order(work_order_id).await?;
        ImportedWorkOrder::from_entry(&entry, order_id, &self.config)
    }

    // -- People and incidents --

    pub async fn get_person_by_username(&self, username: &str) -> Result<FormEntry, RemedyError> {
        self.first(FormName::People, "Remedy Login ID", username)
            .await
    }

    pub async fn get_incident(&self, incident_id: &str) -> Result<FormEntry, RemedyError> {
        self.first(FormName::HelpDesk, "Incident ID", incident_id)
            .await
    }

    pub async fn get_incident_notes(
        &self,
        incident_id: &str,
    ) -> Result<Vec<FormEntry>, RemedyError> {
        self.query(FormName::IncidentWorkLog, "Incident Number", incident_id)
            .await
    }

    pub async fn get_form_fields(
        &self,
        form: &str,
        field_ids: Option<&str>,
    ) -> Result<Value, RemedyError> {
        self.service.get_form_fields(form, field_ids).await
    }
}
