//! Common types shared by the skyview crates: points, coordinate systems,
//! view state, image headers and pixel arrays.

pub mod color;
pub mod coord_sys;
pub mod error;
pub mod header;
pub mod pixel;
pub mod point;
pub mod view;

pub use color::Color;
pub use coord_sys::CoordSys;
pub use error::{SkyError, SkyResult};
pub use header::{ImageHeader, ProjectionType, SipCoefficients};
pub use pixel::{PixelArray, SkyImage};
pub use point::{ImagePt, Pt, ScreenPt, ViewPortPt, WorldPt};
pub use view::{ViewPort, ViewState};
