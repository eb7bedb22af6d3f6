use chart_digitizer::calibration::AnchorName;
use chart_digitizer::test_image_gen::horizontal_line_chart;
use chart_digitizer::{CalibrationSession, DigitizeError, ExtractConfig, PixelPoint, extract_series};

/// Plot area from column 20 (x = 0) to column 180 (x = 8), row 90 (y = 0)
/// to row 10 (y = 4).
fn clicked_session() -> CalibrationSession {
    let mut session = CalibrationSession::four_point();
    for (name, value) in [
        (AnchorName::X1, 0.0),
        (AnchorName::X2, 8.0),
        (AnchorName::Y1, 0.0),
        (AnchorName::Y2, 4.0),
    ] {
        session.set_axis_value(name, value).expect("value");
    }
    for pixel in [
        PixelPoint::new(90.0, 20.0),
        PixelPoint::new(90.0, 180.0),
        PixelPoint::new(90.0, 20.0),
        PixelPoint::new(10.0, 20.0),
    ] {
        session.record_click(pixel);
    }
    session
}

#[test]
fn clicked_axes_calibrate_a_flat_line() {
    // Row 50 is halfway between the y anchors, so y = 2.
    let img = horizontal_line_chart(200, 100, 50, 1);
    let session = clicked_session();
    assert!(session.is_complete());

    let series = extract_series(&img, &session.model(), &ExtractConfig::default()).expect("series");
    for p in &series {
        assert!((p.y - 2.0).abs() <= 0.05, "y = {}", p.y);
    }
    let (x_lo, x_hi) = series.x_range().expect("x range");
    assert!((x_lo + 1.0).abs() < 1e-9, "x_lo = {x_lo}");
    assert!((x_hi - 8.95).abs() < 1e-9, "x_hi = {x_hi}");
}

#[test]
fn incomplete_session_is_rejected_before_extraction() {
    // A blank image would otherwise fail with NoCurveFound.
    let img = horizontal_line_chart(50, 50, 0, 0);
    let mut session = CalibrationSession::three_point();
    session.record_click(PixelPoint::new(1.0, 1.0));

    match extract_series(&img, &session.model(), &ExtractConfig::default()) {
        Err(DigitizeError::CalibrationIncomplete { missing }) => {
            assert_eq!(missing, vec![AnchorName::P2, AnchorName::P3]);
        }
        other => panic!("expected CalibrationIncomplete, got {other:?}"),
    }
}
