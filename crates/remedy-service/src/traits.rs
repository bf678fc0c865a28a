use async_trait::async_trait;
use bytes::Bytes;
use remedy_core::form::{FormEntry, FormName, FormValues};
use remedy_core::RemedyError;
use serde_json::Value;

/// A binary part uploaded alongside an entry update.
#[derive(Debug, Clone)]
pub struct AttachmentPart {
    /// Attachment field the file is stored in.
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Abstraction over AR System form entry operations.
///
/// `RemedyHelper` programs against this trait.
/// `HttpFormService` talks to a live AR REST endpoint.
/// `MockFormService` keeps entries in memory for tests.
#[async_trait]
pub trait FormService: Send + Sync {
    /// Login name of the authenticated user, if known.
    fn username(&self) -> Option<&str> {
        None
    }

    /// Entries of `form` matching an AR qualification, in server order.
    async fn query_entries(
        &self,
        form: FormName,
        qualification: &str,
    ) -> Result<Vec<FormEntry>, RemedyError>;

    async fn get_entry(&self, form: FormName, request_id: &str) -> Result<FormEntry, RemedyError>;

    /// Create an entry and return it as stored.
    async fn create_entry(
        &self,
        form: FormName,
        values: &FormValues,
    ) -> Result<FormEntry, RemedyError>;

    /// Update an entry. Returns the HTTP status of the update.
    async fn update_entry(
        &self,
        form: FormName,
        request_id: &str,
        values: &FormValues,
    ) -> Result<u16, RemedyError>;

    /// Update an entry with a multipart body carrying one attachment.
    async fn update_entry_with_attachment(
        &self,
        form: FormName,
        request_id: &str,
        values: &FormValues,
        attachment: AttachmentPart,
    ) -> Result<u16, RemedyError>;

    /// Raw field definitions of a form, optionally limited to `field_ids`
    /// (comma separated).
    async fn get_form_fields(
        &self,
        form: &str,
        field_ids: Option<&str>,
    ) -> Result<Value, RemedyError>;
}
