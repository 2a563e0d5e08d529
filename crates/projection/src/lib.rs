//! Coordinate transformations between world (sky), image pixel, screen
//! and viewport spaces.
//!
//! Implements the TAN, SIN and CAR projections (with SIP distortion)
//! from scratch, plus the zoom/pan conversions used for drawing.

pub mod celestial;
pub mod converter;
pub mod linear;
pub mod rotate;
pub mod sip;
pub mod spherical;
pub mod wcs;
pub mod zenithal;

pub use converter::{CoordConverter, RoughBounds};
pub use rotate::SphereRotation;
pub use sip::SipDistortion;
pub use wcs::Projection;
