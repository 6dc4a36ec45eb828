//! # Import Client
//!
//! HTTP client for the person import endpoint, its wire payload and the
//! normalized response descriptor.

pub mod import;
pub mod payload;
pub mod response;

pub use import::ImportClient;
pub use payload::{EntityDescriptor, ImportRequest, PersonIdValue};
pub use response::{
    ImportResponseDescriptor, ReceivedResponse, ResponseBody, TransportFailure,
    TransportFailureKind, SUCCESS_STATUSES,
};
