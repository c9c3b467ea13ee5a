//! Platform abstraction layer
//!
//! Translates raw browser/native events into simulation input.

pub mod input;

pub use input::{Control, InputState, TouchStick};
