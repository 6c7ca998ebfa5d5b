pub(crate) mod addressing;
pub(crate) mod tile;
pub(crate) mod tiled_image;
