//! Background tasks moving lines between the engine and the helper.

pub(crate) mod read;
pub(crate) mod stderr;
pub(crate) mod write;
