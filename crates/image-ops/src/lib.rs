//! Pixel-level operations on sky images.
//!
//! - [`Geom`]: resample onto another WCS grid using tie points
//! - [`Histogram`]: adaptive 4096-bin histogram, percentiles and stretch tables
//! - [`crop`]/[`crop_sky`], [`flip_x`]/[`flip_y`] and rotation helpers
//!
//! Every operation returns a new [`SkyImage`](sky_common::SkyImage); inputs
//! are never modified.

pub mod config;
pub mod crop;
pub mod error;
pub mod flip;
pub mod geom;
pub mod histogram;
pub mod interpolation;
pub mod rotate;

pub use config::GeomConfig;
pub use crop::{crop, crop_sky};
pub use error::{ImageOpsError, Result};
pub use flip::{flip_x, flip_y};
pub use geom::{Geom, GeomOverrides};
pub use histogram::{Histogram, HIST_SIZE};
pub use interpolation::Interpolation;
pub use rotate::{rotate_by_angle, rotate_to_north, rotate_to_position_angle};
