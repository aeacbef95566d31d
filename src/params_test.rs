use proptest::prelude::*;

use super::*;

#[test]
fn defaults_match_new_session() {
    let p = TransformParameters::default();
    assert_eq!(p.width, Some(1920.0));
    assert_eq!(p.height, Some(1080.0));
    assert_eq!(p.unit, Unit::Px);
    assert_eq!(p.mode, FillMode::Stretch);
    assert_eq!(p.format, OutputFormat::Jpeg);
    assert_eq!(p.quality, 90);
    assert_eq!(p.resolution_mode, ResolutionMode::Auto);
    assert_eq!(p.crop, None);
    assert_eq!(p.rotation, 0);
    assert_eq!(p.max_size_kb, None);
}

#[test]
fn quality_and_dpi_are_clamped() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::Quality(0));
    assert_eq!(p.quality, 1);
    p.apply(ParameterChange::Quality(250));
    assert_eq!(p.quality, 100);
    p.apply(ParameterChange::Dpi(0));
    assert_eq!(p.dpi, 1);
}

#[test]
fn zero_size_budget_clears_it() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::MaxSizeKb(Some(100)));
    assert!(p.quality_is_auto());
    p.apply(ParameterChange::MaxSizeKb(Some(0)));
    assert_eq!(p.max_size_kb, None);
    assert!(!p.quality_is_auto());
}

#[test]
fn unit_switch_converts_dimensions() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::ResolutionMode(ResolutionMode::Fixed));
    p.apply(ParameterChange::Dpi(300));
    p.apply(ParameterChange::Unit(Unit::In));
    assert_eq!(p.unit, Unit::In);
    assert_eq!(p.width, Some(6.4));
    assert_eq!(p.height, Some(3.6));

    p.apply(ParameterChange::Unit(Unit::Px));
    assert_eq!(p.width, Some(1920.0));
    assert_eq!(p.height, Some(1080.0));
}

#[test]
fn unit_switch_turns_empty_fields_into_zero() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::Width(None));
    p.apply(ParameterChange::Unit(Unit::Cm));
    assert_eq!(p.width, Some(0.0));
    assert!(!p.has_positive_dimensions());
}

#[test]
fn positive_dimensions_guard() {
    let mut p = TransformParameters::default();
    assert!(p.has_positive_dimensions());
    p.apply(ParameterChange::Height(Some(0.0)));
    assert!(!p.has_positive_dimensions());
    p.apply(ParameterChange::Height(None));
    assert!(!p.has_positive_dimensions());
}

#[test]
fn degenerate_crop_is_not_effective() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::Crop(Some(CropRegion::new(10.0, 10.0, 0.0, 50.0))));
    assert_eq!(p.effective_crop(), None);
    p.apply(ParameterChange::Crop(Some(CropRegion::new(10.0, 10.0, 50.0, 50.0))));
    assert_eq!(p.effective_crop(), Some(CropRegion::new(10.0, 10.0, 50.0, 50.0)));
}

#[test]
fn rotate_buttons_keep_raw_value() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::RotateLeft);
    assert_eq!(p.rotation, -90);
    assert_eq!(p.normalized_rotation(), 270);
    p.apply(ParameterChange::RotateRight);
    p.apply(ParameterChange::RotateRight);
    assert_eq!(p.normalized_rotation(), 90);
}

#[test]
fn fit_to_source_uses_active_unit() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::FitToSource { natural_width: 2000, natural_height: 1000 });
    assert_eq!((p.width, p.height), (Some(2000.0), Some(1000.0)));

    p.apply(ParameterChange::Unit(Unit::In));
    p.apply(ParameterChange::FitToSource { natural_width: 600, natural_height: 300 });
    assert_eq!((p.width, p.height), (Some(2.0), Some(1.0)));
}

#[test]
fn pdf_previews_as_jpeg() {
    assert_eq!(OutputFormat::Pdf.for_preview(), OutputFormat::Jpeg);
    assert_eq!(OutputFormat::Webp.for_preview(), OutputFormat::Webp);
    assert_eq!(OutputFormat::Pdf.extension(), "pdf");
    assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
}

#[test]
fn enums_parse_from_wire_names() {
    assert_eq!("blur".parse::<FillMode>().unwrap(), FillMode::Blur);
    assert_eq!("WEBP".parse::<OutputFormat>().unwrap(), OutputFormat::Webp);
    assert_eq!("fixed".parse::<ResolutionMode>().unwrap(), ResolutionMode::Fixed);
    let err = "gif".parse::<OutputFormat>().unwrap_err();
    assert_eq!(err.to_string(), "unknown format 'gif'");
}

#[test]
fn crop_region_parses_four_numbers() {
    assert_eq!("10, 10, 50, 50".parse::<CropRegion>().unwrap(), CropRegion::new(10.0, 10.0, 50.0, 50.0));
    assert!("10,10,50".parse::<CropRegion>().is_err());
    assert!("a,b,c,d".parse::<CropRegion>().is_err());
}

#[test]
fn rotate_buttons_survive_extreme_stored_rotation() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::Rotation(2_147_483_610));
    p.apply(ParameterChange::RotateRight);
    assert_eq!(i64::from(p.normalized_rotation()), (2_147_483_610_i64 + 90).rem_euclid(360));

    p.apply(ParameterChange::Rotation(i32::MIN));
    p.apply(ParameterChange::RotateLeft);
    assert_eq!(i64::from(p.normalized_rotation()), (i64::from(i32::MIN) - 90).rem_euclid(360));

    p.apply(ParameterChange::Rotation(i32::MAX));
    p.apply(ParameterChange::RotateRight);
    p.apply(ParameterChange::RotateRight);
    assert_eq!(i64::from(p.normalized_rotation()), (i64::from(i32::MAX) + 180).rem_euclid(360));
}

#[test]
fn non_finite_dimensions_are_not_positive() {
    let mut p = TransformParameters::default();
    p.apply(ParameterChange::Width(Some(f64::NAN)));
    assert!(!p.has_positive_dimensions());
    p.apply(ParameterChange::Width(Some(f64::INFINITY)));
    assert!(!p.has_positive_dimensions());
}

fn rotation_step() -> impl Strategy<Value = ParameterChange> {
    prop_oneof![
        Just(ParameterChange::RotateLeft),
        Just(ParameterChange::RotateRight),
        (-8i32..8).prop_map(|turns| ParameterChange::Rotation(turns * 90)),
        any::<i32>().prop_map(ParameterChange::Rotation),
    ]
}

proptest! {
    #[test]
    fn normalized_rotation_matches_total(steps in proptest::collection::vec(rotation_step(), 0..64)) {
        let mut p = TransformParameters::default();
        let mut total: i64 = 0;
        for step in steps {
            match &step {
                ParameterChange::RotateLeft => total -= 90,
                ParameterChange::RotateRight => total += 90,
                ParameterChange::Rotation(deg) => total = i64::from(*deg),
                _ => unreachable!(),
            }
            p.apply(step);
            let shown = p.normalized_rotation();
            prop_assert!((0..360).contains(&shown));
            prop_assert_eq!(i64::from(shown), total.rem_euclid(360));
        }
    }
}
