//! Small reusable rendering helpers shared across screens.

pub mod severity;
pub mod status_indicator;
pub mod time_fmt;
