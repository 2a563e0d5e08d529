//! Overlay drawing for sky images.
//!
//! - Overlay objects as a tagged [`Shape`] union
//! - Density-preserving decimation of large catalogs
//! - A [`Drawer`] with primary, select and highlight layers and a
//!   cancelable chunked draw
//! - A tiny-skia raster surface with PNG output

pub mod colormap;
pub mod config;
pub mod decimate;
pub mod drawer;
pub mod error;
pub mod paint;
pub mod png;
pub mod raster;
pub mod shape;
pub mod surface;

pub use colormap::simple_color_map;
pub use config::{DataType, DrawerConfig};
pub use decimate::{decimate, DecimateParams, Decimator};
pub use drawer::{DrawTask, Drawer, Layer, TaskStatus};
pub use error::{DrawError, Result};
pub use raster::PixmapSurface;
pub use shape::{Connector, DrawSymbol, OverlayObject, Shadow, Shape, SizeUnit};
pub use surface::{DrawSurface, RecordingSurface, SurfaceOp};
