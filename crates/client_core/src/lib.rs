//! Client-side controllers for the storefront: image classification upload and
//! live cart quantity sync, plus the request client and view seams they share.

pub mod cart;
pub mod error;
pub mod notifications;
pub mod pricing;
pub mod settings;
pub mod transport;
pub mod types;
pub mod upload;
pub mod validation;
pub mod view;

pub use cart::{CartLine, CartTotals, ChangeOutcome, QuantitySyncController, SyncState};
pub use error::{CartError, RequestError, ValidationError};
pub use notifications::{Toast, ToastBoard};
pub use pricing::{PriceFormatter, RubleFormatter};
pub use settings::{load_settings, ClientSettings};
pub use transport::{HttpStorefrontClient, StorefrontBackend};
pub use types::{ImageFile, SelectionSource};
pub use upload::{SubmitOutcome, UploadController, UploadPhase, UploadSession};
pub use validation::{validate_file, validate_quantity};
pub use view::{CartView, Notifier, UploadView};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
