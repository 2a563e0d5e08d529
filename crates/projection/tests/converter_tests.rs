//! Tests for coordinate conversion between world, image, screen and
//! viewport spaces.

use std::io;
use std::sync::{Arc, Mutex};

use projection::{CoordConverter, Projection, SphereRotation};
use sky_common::{CoordSys, ImagePt, Pt, ScreenPt, SkyError, ViewPortPt, WorldPt};
use tracing_subscriber::fmt::MakeWriter;
use test_utils::{
    allsky_car_header, assert_approx_eq, assert_world_approx_eq, full_view, m51_header,
    m51_sip_header, polar_header, positions, window_view,
};

fn converter_for(header: &sky_common::ImageHeader, view: sky_common::ViewState) -> CoordConverter {
    let projection = Arc::new(Projection::from_header(header).unwrap());
    CoordConverter::new(view, projection)
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_debug_logs(f: impl FnOnce()) -> String {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}

// ============================================================================
// Image <-> screen <-> viewport
// ============================================================================

#[test]
fn test_image_to_screen_flips_y() {
    let h = m51_header();
    let cc = converter_for(&h, full_view(&h));
    let sp = cc.image_to_screen(&ImagePt::new(10.2, 0.0));
    assert_eq!(sp, ScreenPt::new(10.0, 504.0));
    let sp = cc.image_to_screen(&ImagePt::new(0.0, 504.0));
    assert_eq!(sp, ScreenPt::new(0.0, 0.0));
}

#[test]
fn test_zoom_and_scroll() {
    let h = m51_header();
    let cc = converter_for(&h, window_view(&h, 2.0, 100.0, 50.0));
    let vp = cc.to_viewport(&Pt::Image(ImagePt::new(60.0, 470.0))).unwrap();
    // screen = (120, (504-470)*2 = 68), minus origin (100, 50)
    assert_eq!(vp, ViewPortPt::new(20.0, 18.0));
    let back = cc.to_image(&Pt::ViewPort(vp)).unwrap();
    assert_approx_eq!(back.x, 60.0, 1e-9);
    assert_approx_eq!(back.y, 470.0, 1e-9);
}

// ============================================================================
// World <-> image
// ============================================================================

#[test]
fn test_world_image_roundtrip() {
    let h = m51_header();
    let cc = converter_for(&h, full_view(&h));
    let ip = ImagePt::new(100.25, 333.75);
    let wp = cc.image_to_world(&ip).unwrap();
    let back = cc.world_to_image(&wp).unwrap();
    assert_approx_eq!(back.x, ip.x, 1e-7);
    assert_approx_eq!(back.y, ip.y, 1e-7);
}

#[test]
fn test_crval_lands_on_crpix() {
    let h = m51_header();
    let cc = converter_for(&h, full_view(&h));
    let (ra, dec) = positions::M51;
    let ip = cc.world_to_image(&WorldPt::new(ra, dec)).unwrap();
    // FITS pixel 246.5 is 0-based 245.5, image space adds 0.5
    assert_approx_eq!(ip.x, 246.0, 1e-9);
    assert_approx_eq!(ip.y, 252.0, 1e-9);
}

#[test]
fn test_sip_roundtrip() {
    let h = m51_sip_header();
    let cc = converter_for(&h, full_view(&h));
    for &(x, y) in &[(5.0, 5.0), (480.0, 20.0), (250.0, 500.0)] {
        let wp = cc.image_to_world(&ImagePt::new(x, y)).unwrap();
        let back = cc.world_to_image(&wp).unwrap();
        assert_approx_eq!(back.x, x, 1e-6);
        assert_approx_eq!(back.y, y, 1e-6);
    }
}

#[test]
fn test_sip_moves_corner() {
    let plain = converter_for(&m51_header(), full_view(&m51_header()));
    let sip = converter_for(&m51_sip_header(), full_view(&m51_sip_header()));
    let a = plain.image_to_world(&ImagePt::new(0.5, 0.5)).unwrap();
    let b = sip.image_to_world(&ImagePt::new(0.5, 0.5)).unwrap();
    assert!((a.lon - b.lon).abs() > 1e-6 || (a.lat - b.lat).abs() > 1e-6);
}

// ============================================================================
// Rough guess
// ============================================================================

#[test]
fn test_rough_guess_accepts_center_rejects_far() {
    let h = m51_header();
    let cc = converter_for(&h, full_view(&h));
    let (ra, dec) = positions::M51;
    assert!(cc.point_in_plot_rough_guess(&WorldPt::new(ra, dec)));
    assert!(!cc.point_in_plot_rough_guess(&WorldPt::new(ra + 10.0, dec)));
    assert!(!cc.point_in_plot_rough_guess(&WorldPt::new(ra, dec - 5.0)));
}

#[test]
fn test_rough_guess_galactic_input() {
    let h = m51_header();
    let cc = converter_for(&h, full_view(&h));
    let (ra, dec) = positions::M51;
    let gal = projection::celestial::convert(&WorldPt::new(ra, dec), CoordSys::Galactic).unwrap();
    assert!(cc.point_in_plot_rough_guess(&gal));
}

#[test]
fn test_rough_guess_near_pole_ignores_ra() {
    let h = polar_header();
    let cc = converter_for(&h, full_view(&h));
    assert!(cc.point_in_plot_rough_guess(&WorldPt::new(200.0, 89.9)));
    assert!(!cc.point_in_plot_rough_guess(&WorldPt::new(200.0, 80.0)));
}

#[test]
fn test_rough_guess_always_true_for_wrapping() {
    let h = allsky_car_header();
    let cc = converter_for(&h, full_view(&h));
    assert!(cc.point_in_plot_rough_guess(&WorldPt::new(123.0, -45.0)));
}

// ============================================================================
// Containment
// ============================================================================

#[test]
fn test_point_in_viewport() {
    let h = m51_header();
    let cc = converter_for(&h, window_view(&h, 1.0, 0.0, 0.0));
    assert!(cc.point_in_viewport(&Pt::ViewPort(ViewPortPt::new(10.0, 10.0))));
    assert!(!cc.point_in_viewport(&Pt::ViewPort(ViewPortPt::new(301.0, 10.0))));
    assert!(!cc.point_in_viewport(&Pt::ViewPort(ViewPortPt::new(-1.0, 10.0))));
}

#[test]
fn test_point_in_data() {
    let h = m51_header();
    let cc = converter_for(&h, full_view(&h));
    assert!(cc.point_in_data(&Pt::Image(ImagePt::new(10.0, 10.0))));
    assert!(!cc.point_in_data(&Pt::Image(ImagePt::new(493.0, 10.0))));
    let (ra, dec) = positions::M51;
    assert!(cc.point_in_data(&Pt::World(WorldPt::new(ra, dec))));
}

// ============================================================================
// Wrap detection
// ============================================================================

#[test]
fn test_coords_wrap_on_allsky_seam() {
    let h = allsky_car_header();
    let cc = converter_for(&h, full_view(&h));
    let a = WorldPt::with_csys(179.0, 0.0, CoordSys::Galactic);
    let b = WorldPt::with_csys(181.0, 0.0, CoordSys::Galactic);
    assert!(cc.coords_wrap(&a, &b));
    let c = WorldPt::with_csys(10.0, 0.0, CoordSys::Galactic);
    let d = WorldPt::with_csys(12.0, 0.0, CoordSys::Galactic);
    assert!(!cc.coords_wrap(&c, &d));
}

#[test]
fn test_coords_wrap_never_for_tan() {
    let h = m51_header();
    let cc = converter_for(&h, full_view(&h));
    assert!(!cc.coords_wrap(&WorldPt::new(202.4, 47.1), &WorldPt::new(202.5, 47.2)));
}

// ============================================================================
// Sphere rotation
// ============================================================================

#[test]
fn test_rotate_unrotate_grid_of_points() {
    let rot = SphereRotation::new(&WorldPt::new(positions::M51.0, positions::M51.1));
    for lon in (0..360).step_by(30) {
        for lat in (-80..=80).step_by(20) {
            let p = WorldPt::new(lon as f64 + 0.25, lat as f64);
            assert_world_approx_eq!(rot.unrotate(&rot.rotate(&p)), p, 1e-10);
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_rejected_header_is_logged() {
    let mut h = m51_header();
    h.ctype1 = "RA---AIT".to_string();
    h.ctype2 = "DEC--AIT".to_string();

    let logs = capture_debug_logs(|| {
        let err = Projection::from_header(&h).unwrap_err();
        assert!(matches!(err, SkyError::UnsupportedProjection(_)), "{}", err);
    });
    assert!(logs.contains("Rejected header"), "{}", logs);
    assert!(logs.contains("RA---AIT"), "{}", logs);
}

#[test]
fn test_singular_cd_is_logged() {
    let mut h = m51_header();
    h.cd = Some([[1e-4, 2e-4], [1e-4, 2e-4]]);

    let logs = capture_debug_logs(|| {
        assert!(Projection::from_header(&h).is_err());
    });
    assert!(logs.contains("Rejected header"), "{}", logs);
}
