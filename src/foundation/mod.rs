pub(crate) mod clock;
pub(crate) mod config;
pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod geom;
pub(crate) mod math;
