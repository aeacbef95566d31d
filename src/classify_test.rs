use super::*;
use crate::params::{CropRegion, ParameterChange};

fn snapshot_after(changes: &[ParameterChange]) -> PreviewSnapshot {
    let mut p = TransformParameters::default();
    for change in changes {
        p.apply(change.clone());
    }
    PreviewSnapshot::from(&p)
}

#[test]
fn first_evaluation_is_relevant() {
    let next = snapshot_after(&[]);
    assert!(classify(None, &next).relevant);
}

#[test]
fn identical_snapshot_is_not_relevant() {
    let a = snapshot_after(&[]);
    let b = snapshot_after(&[]);
    assert!(!classify(Some(&a), &b).relevant);
}

#[test]
fn crop_and_rotation_are_ignored() {
    let base = snapshot_after(&[]);
    let edited = snapshot_after(&[
        ParameterChange::Crop(Some(CropRegion::new(5.0, 5.0, 40.0, 40.0))),
        ParameterChange::RotateRight,
        ParameterChange::Rotation(270),
    ]);
    assert!(!classify(Some(&base), &edited).relevant);
}

#[test]
fn relevant_fields_trigger() {
    let base = snapshot_after(&[]);
    let cases = [
        ParameterChange::Width(Some(1000.0)),
        ParameterChange::Height(None),
        ParameterChange::Mode(FillMode::Blur),
        ParameterChange::Format(OutputFormat::Png),
        ParameterChange::Quality(80),
        ParameterChange::BackgroundColor("#000000".into()),
        ParameterChange::MaxSizeKb(Some(100)),
        ParameterChange::ResolutionMode(ResolutionMode::Fixed),
        ParameterChange::Dpi(72),
        ParameterChange::Unit(Unit::Mm),
    ];
    for change in cases {
        let next = snapshot_after(std::slice::from_ref(&change));
        assert!(classify(Some(&base), &next).relevant, "{change:?} should be relevant");
    }
}

#[test]
fn switching_to_pdf_keeps_the_jpeg_preview() {
    let base = snapshot_after(&[]);
    let pdf = snapshot_after(&[ParameterChange::Format(OutputFormat::Pdf)]);
    assert_eq!(pdf.format, OutputFormat::Jpeg);
    assert!(!classify(Some(&base), &pdf).relevant);
}

#[test]
fn classifier_records_only_relevant_snapshots() {
    let mut classifier = ChangeClassifier::new();
    assert!(classifier.observe(snapshot_after(&[])).relevant);
    assert!(!classifier.observe(snapshot_after(&[ParameterChange::RotateLeft])).relevant);

    let wider = snapshot_after(&[ParameterChange::Width(Some(800.0))]);
    assert!(classifier.observe(wider.clone()).relevant);
    assert_eq!(classifier.last_applied(), Some(&wider));
    assert!(!classifier.observe(wider).relevant);

    // Going back to an earlier snapshot is still a change.
    assert!(classifier.observe(snapshot_after(&[])).relevant);
}
