//! Tests for header, view and image pairing behavior.

use sky_common::{
    Color, CoordSys, ImageHeader, PixelArray, ProjectionType, SkyImage, ViewState,
};

// ============================================================================
// Header JSON tests
// ============================================================================

#[test]
fn test_header_minimal_json() {
    let json = r#"{
        "naxis1": 492, "naxis2": 504,
        "crpix1": 246.5, "crpix2": 252.5,
        "crval1": 202.48, "crval2": 47.23,
        "cdelt1": -0.000277, "cdelt2": 0.000277,
        "ctype1": "RA---TAN", "ctype2": "DEC--TAN"
    }"#;
    let header: ImageHeader = serde_json::from_str(json).unwrap();
    assert_eq!(header.bitpix, -32);
    assert_eq!(header.naxis3, 1);
    assert_eq!(header.naxis(), 2);
    assert_eq!(header.projection_type(), ProjectionType::Gnomonic);
    assert_eq!(header.coord_sys(), CoordSys::EqJ2000);
    assert!(header.validate().is_ok());
}

#[test]
fn test_header_keeps_extra_cards() {
    let mut header = ImageHeader::new_tan(10, 10, 1.0, 2.0, 0.01);
    header.cards.insert("TELESCOP".to_string(), "2MASS".to_string());
    let json = serde_json::to_string(&header).unwrap();
    let back: ImageHeader = serde_json::from_str(&json).unwrap();
    assert_eq!(back.cards.get("TELESCOP").map(String::as_str), Some("2MASS"));
    assert_eq!(back, header);
}

#[test]
fn test_galactic_header() {
    let mut header = ImageHeader::new_tan(10, 10, 120.0, -5.0, 0.01);
    header.ctype1 = "GLON-TAN".to_string();
    header.ctype2 = "GLAT-TAN".to_string();
    assert_eq!(header.coord_sys(), CoordSys::Galactic);
    assert_eq!(header.coord_sys().ctype_prefixes(), ("GLON", "GLAT"));
}

// ============================================================================
// SkyImage tests
// ============================================================================

#[test]
fn test_sky_image_cube() {
    let mut header = ImageHeader::new_tan(4, 3, 0.0, 0.0, 0.1);
    header.naxis3 = 2;
    let pixels = PixelArray::new(vec![4, 3, 2], vec![1.0; 24]).unwrap();
    let image = SkyImage::new(header, pixels).unwrap();
    assert_eq!(image.pixels.planes(), 2);
}

// ============================================================================
// ViewState tests
// ============================================================================

#[test]
fn test_view_fit() {
    let view = ViewState::fit(100, 50, 2.0);
    assert_eq!(view.viewport.dim(), (200, 100));
    assert_eq!(view.screen_width(), 200.0);
    let scrolled = view.scrolled_to(10.0, 20.0);
    assert_eq!(scrolled.viewport_origin().x, 10.0);
    assert_ne!(scrolled, view);
}

#[test]
fn test_color_default_is_red() {
    assert_eq!(Color::default(), Color::RED);
}
