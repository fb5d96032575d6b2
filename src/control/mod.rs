//! USB control transfer handling for the WebUSB and MS OS 2.0 requests
//!
//! - `request`: SETUP decoding and vendor request classification
//! - `dispatcher`: turns a classified request into a response

pub mod dispatcher;
pub mod request;

pub use dispatcher::{ControlDispatcher, ControlResponse};
pub use request::{ControlRequest, Direction, Recipient, RequestType, VendorRequest};
