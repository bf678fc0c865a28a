mod blocking;
mod helper;
mod http;
pub mod mock;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
mod traits;

pub use blocking::BlockingRemedyHelper;
pub use helper::{AttachmentOutcome, RemedyHelper};
pub use http::{Credentials, HttpFormService, DEFAULT_TIMEOUT};
pub use traits::{AttachmentPart, FormService};
