pub mod client;
pub mod error;
pub mod params;
pub mod protocol;
pub mod rate_limit;
pub mod signer;
pub mod sync;

pub use client::{ClientSettings, PreparedRequest, SellerCenterClient, UserAgent};
pub use error::{SellerCenterError, SignError, SyncError};
pub use params::{RequestParameters, SIGNATURE_KEY};
pub use protocol::{extract_error_message, TimestampStyle, WireProtocol};
pub use signer::{canonical_string, sign, verify, Canonicalization};
pub use sync::{SyncOutcome, SyncResult};
