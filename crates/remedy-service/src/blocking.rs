use std::time::Duration;

use remedy_core::attachment::AttachmentRequest;
use remedy_core::form::{FormEntry, FormValues, Visibility};
use remedy_core::work_order::ImportedWorkOrder;
use remedy_core::{Order, RemedyConfig, RemedyError};
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use crate::{AttachmentOutcome, Credentials, HttpFormService, RemedyHelper};

/// Blocking wrapper around `RemedyHelper<HttpFormService>`.
///
/// Owns a current-thread tokio runtime and uses `block_on()` for each call,
/// so exactly one request is in flight at a time. Designed for sync callers
/// like the CLI.
pub struct BlockingRemedyHelper {
    inner: RemedyHelper<HttpFormService>,
    rt: Runtime,
}

fn runtime() -> Result<Runtime, RemedyError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| RemedyError::Config(format!("failed to create tokio runtime: {e}")))
}

impl BlockingRemedyHelper {
    /// Connect to `base_url`, authenticating with `credentials`.
    ///
    /// The config is checked before logging in so a rejected config never
    /// opens a session.
    pub fn connect(
        base_url: &str,
        timeout: Duration,
        credentials: Credentials,
        config: RemedyConfig,
    ) -> Result<Self, RemedyError> {
        config.validate()?;
        let rt = runtime()?;
        let service = rt.block_on(HttpFormService::connect(base_url, timeout, credentials))?;
        Ok(Self {
            inner: RemedyHelper::new(service, config)?,
            rt,
        })
    }

    pub fn config(&self) -> &RemedyConfig {
        self.inner.config()
    }

    /// Release the session token and drop the client.
    pub fn logout(self) -> Result<(), RemedyError> {
        let mut service = self.inner.into_service();
        self.rt.block_on(service.logout())
    }

    pub fn submit_work_order(&self, values: &FormValues) -> Result<FormValues, RemedyError> {
        self.rt.block_on(self.inner.submit_work_order(values))
    }

    pub fn build_work_order(&self, order: &Order) -> Result<FormValues, RemedyError> {
        self.inner.build_work_order(order)
    }

    pub fn create_work_order(&self, order: &Order) -> Result<FormValues, RemedyError> {
        self.rt.block_on(self.inner.create_work_order(order))
    }

    pub fn get_work_order(&self, work_order_id: &str) -> Result<FormEntry, RemedyError> {
        self.rt.block_on(self.inner.get_work_order(work_order_id))
    }

    pub fn get_work_order_tasks(&self, work_order_id: &str) -> Result<Vec<FormEntry>, RemedyError> {
        self.rt.block_on(self.inner.get_work_order_tasks(work_order_id))
    }

    pub fn set_work_order_task(
        &self,
        task_id: &str,
        values: &FormValues,
    ) -> Result<FormValues, RemedyError> {
        self.rt.block_on(self.inner.set_work_order_task(task_id, values))
    }

    pub fn create_work_order_note(
        &self,
        work_order_id: &str,
        note: &str,
        visibility: Visibility,
    ) -> Result<FormValues, RemedyError> {
        self.rt.block_on(self.inner.create_work_order_note(work_order_id, note, visibility))
    }

    pub fn attach_file_to_work_order(
        &self,
        request: &AttachmentRequest,
    ) -> Result<AttachmentOutcome, RemedyError> {
        self.rt.block_on(self.inner.attach_file_to_work_order(request))
    }

    pub fn import_work_order(
        &self,
        work_order_id: &str,
        order_id: Option<&str>,
    ) -> Result<ImportedWorkOrder, RemedyError> {
        self.rt.block_on(self.inner.import_work_order(work_order_id, order_id))
    }

    pub fn get_person_by_username(&self, username: &str) -> Result<FormEntry, RemedyError> {
        self.rt.block_on(self.inner.get_person_by_username(username))
    }

    pub fn get_incident(&self, incident_id: &str) -> Result<FormEntry, RemedyError> {
        self.rt.block_on(self.inner.get_incident(incident_id))
    }

    pub fn get_incident_notes(&self, incident_id: &str) -> Result<Vec<FormEntry>, RemedyError> {
        self.rt.block_on(self.inner.get_incident_notes(incident_id))
    }

    pub fn get_form_fields(
        &self,
        form: &str,
        field_ids: Option<&str>,
    ) -> Result<Value, RemedyError> {
        self.rt.block_on(self.inner.get_form_fields(form, field_ids))
    }
}
