pub mod experiments;
pub mod plot;
pub mod render;
pub mod sweep;
