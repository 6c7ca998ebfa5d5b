pub(crate) mod coverage;
pub(crate) mod drawer;
pub(crate) mod raster;
pub(crate) mod sink;
