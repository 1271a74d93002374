// KZ Record Overlay

pub mod core;
pub mod overlay;
