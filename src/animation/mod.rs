pub(crate) mod animated_rect;
pub(crate) mod ease;
pub(crate) mod spring;
