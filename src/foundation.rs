/// Core value types (frame indices, frame rate, canvas, crop windows).
pub mod core;
/// Error taxonomy and result alias.
pub mod error;
pub(crate) mod math;
