mod basemap;
mod geometry;
mod projection;
mod renderer;

pub use basemap::{Basemap, Lod};
pub use projection::Viewport;
pub use renderer::{MapLayers, MapRenderer};
