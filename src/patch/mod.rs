//! Voice data model
//!
//! The parameter table and the patch image are two index-aligned
//! structures: table entry `i` is the device address of image byte `i`.

pub mod image;
pub mod name;
pub mod table;

pub use image::PatchImage;
pub use name::{encode_name, VoiceName};
pub use table::{
    operator_range, ParameterAddress, ParameterBlock, ParameterTable, COMMON_RANGE, NAME_LEN,
    NAME_RANGE, PATCH_SIZE,
};
