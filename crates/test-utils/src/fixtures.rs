//! Common test fixtures: headers and view states that represent typical
//! imaging scenarios.

use sky_common::{ImageHeader, SipCoefficients, ViewPort, ViewState};

/// Reference positions used across tests.
pub mod positions {
    /// M51 (Whirlpool galaxy), equatorial J2000 degrees
    pub const M51: (f64, f64) = (202.4696, 47.1952);

    /// Near the north celestial pole
    pub const NEAR_NCP: (f64, f64) = (45.0, 89.95);

    /// Straddles RA 0/360
    pub const RA_ZERO: (f64, f64) = (0.05, 10.0);

    /// Galactic center in galactic coordinates
    pub const GALACTIC_CENTER: (f64, f64) = (0.0, 0.0);
}

/// 492x504 north-up TAN image of M51 at 1 arcsec/pixel.
pub fn m51_header() -> ImageHeader {
    let (ra, dec) = positions::M51;
    ImageHeader::new_tan(492, 504, ra, dec, 1.0 / 3600.0)
}

/// A small square TAN header for quick resampling tests.
pub fn small_tan_header(size: usize) -> ImageHeader {
    let (ra, dec) = positions::M51;
    ImageHeader::new_tan(size, size, ra, dec, 2.0 / 3600.0)
}

/// The M51 header with mild quadratic SIP distortion and inverse terms
/// omitted, so conversions must iterate.
pub fn m51_sip_header() -> ImageHeader {
    let mut header = m51_header();
    header.ctype1 = "RA---TAN-SIP".to_string();
    header.ctype2 = "DEC--TAN-SIP".to_string();
    header.sip = Some(SipCoefficients {
        a: vec![vec![0.0, 0.0, 2e-7], vec![0.0, -1e-7, 0.0], vec![4e-7, 0.0, 0.0]],
        b: vec![vec![0.0, 0.0, -3e-7], vec![0.0, 2e-7, 0.0], vec![1e-7, 0.0, 0.0]],
        ap: Vec::new(),
        bp: Vec::new(),
    });
    header
}

/// An all-sky plate carree image in galactic coordinates, 1 degree/pixel.
pub fn allsky_car_header() -> ImageHeader {
    let mut header = ImageHeader::new_tan(360, 180, 0.0, 0.0, 1.0);
    header.ctype1 = "GLON-CAR".to_string();
    header.ctype2 = "GLAT-CAR".to_string();
    header
}

/// A TAN header centered close to the north celestial pole.
pub fn polar_header() -> ImageHeader {
    let (ra, dec) = positions::NEAR_NCP;
    ImageHeader::new_tan(400, 400, ra, dec, 3.0 / 3600.0)
}

/// A view showing the whole image at zoom 1.
pub fn full_view(header: &ImageHeader) -> ViewState {
    ViewState::fit(header.naxis1, header.naxis2, 1.0)
}

/// A 300x200 viewport scrolled to (`x`, `y`) at the given zoom.
pub fn window_view(header: &ImageHeader, zoom: f64, x: f64, y: f64) -> ViewState {
    ViewState::new(
        ViewPort::new(x, y, 300, 200),
        zoom,
        header.naxis1,
        header.naxis2,
    )
}
