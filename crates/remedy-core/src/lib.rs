pub mod attachment;
pub mod config;
pub mod description;
pub mod error;
pub mod form;
pub mod order;
pub mod work_order;

pub use attachment::AttachmentRequest;
pub use config::RemedyConfig;
pub use error::{ErrorKind, RemedyError};
pub use form::{FormEntry, FormName, FormValues, Visibility};
pub use order::{Order, OrderItem};
pub use work_order::{ImportedWorkOrder, WorkOrderKind};
