//! Device protocol definitions
//!
//! Only the Reface DX is supported.

pub mod reface_dx;

pub use reface_dx::{
    parameter_change, parameter_request, reply_value, DeviceRequest, ReplyError, IDENTITY_REPLY,
    IDENTITY_REQUEST,
};
