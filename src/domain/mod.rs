pub mod collision;
pub mod entity;
pub mod exit;
pub mod marker;
pub mod raster;
