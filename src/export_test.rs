use super::*;
use crate::params::{CropRegion, ParameterChange};
use crate::process::test_helpers::{MockProcessor, MockReply, sample_source};

fn source() -> Arc<SourceImage> {
    Arc::new(sample_source(2000, 1000))
}

fn params_with(changes: Vec<ParameterChange>) -> TransformParameters {
    let mut p = TransformParameters::default();
    for change in changes {
        p.apply(change);
    }
    p
}

// =============================================================================
// build_export_request
// =============================================================================

#[test]
fn crop_and_rotation_are_sent() {
    let p = params_with(vec![
        ParameterChange::Crop(Some(CropRegion::new(10.0, 10.0, 50.0, 50.0))),
        ParameterChange::Rotation(90),
    ]);
    let req = build_export_request(&p, &source()).unwrap();

    assert!(!req.is_preview);
    assert_eq!(req.field("isPreview"), None);
    assert_eq!(req.field("rotate").as_deref(), Some("90"));

    let crop: serde_json::Value = serde_json::from_str(&req.field("crop").unwrap()).unwrap();
    assert_eq!(crop, serde_json::json!({"x": 10.0, "y": 10.0, "width": 50.0, "height": 50.0, "unit": "%"}));
}

#[test]
fn degenerate_crop_is_omitted() {
    let p = params_with(vec![ParameterChange::Crop(Some(CropRegion::new(10.0, 10.0, 0.0, 50.0)))]);
    let req = build_export_request(&p, &source()).unwrap();
    assert_eq!(req.field("crop"), None);
}

#[test]
fn full_turn_rotation_is_omitted() {
    let p = params_with(vec![ParameterChange::RotateRight; 4]);
    assert_eq!(p.rotation, 0);
    assert_eq!(build_export_request(&p, &source()).unwrap().field("rotate"), None);

    let p = params_with(vec![ParameterChange::RotateLeft]);
    assert_eq!(build_export_request(&p, &source()).unwrap().field("rotate").as_deref(), Some("270"));
}

#[test]
fn pdf_is_exported_as_pdf() {
    let p = params_with(vec![ParameterChange::Format(OutputFormat::Pdf)]);
    assert_eq!(build_export_request(&p, &source()).unwrap().field("format").as_deref(), Some("pdf"));
}

#[test]
fn non_positive_dimensions_are_rejected() {
    let p = params_with(vec![ParameterChange::Height(Some(0.0))]);
    assert!(matches!(build_export_request(&p, &source()), Err(ExportError::InvalidDimensions)));

    let p = params_with(vec![ParameterChange::Width(None)]);
    assert!(matches!(build_export_request(&p, &source()), Err(ExportError::InvalidDimensions)));
}

#[test]
fn non_finite_dimensions_are_rejected() {
    let p = params_with(vec![ParameterChange::Width(Some(f64::NAN))]);
    assert!(matches!(build_export_request(&p, &source()), Err(ExportError::InvalidDimensions)));

    let p = params_with(vec![ParameterChange::Height(Some(f64::NEG_INFINITY))]);
    assert!(matches!(build_export_request(&p, &source()), Err(ExportError::InvalidDimensions)));
}

// =============================================================================
// export_image
// =============================================================================

#[tokio::test(start_paused = true)]
async fn export_produces_artifact() {
    let mock = MockProcessor::new(Duration::from_millis(200));
    let p = params_with(vec![ParameterChange::Format(OutputFormat::Pdf)]);

    let artifact = export_image(&mock, &p, Some(&source())).await.unwrap();
    assert_eq!(artifact.bytes, Bytes::from("response-1"));
    assert_eq!(artifact.byte_size, "response-1".len());
    assert_eq!(artifact.format, OutputFormat::Pdf);
    assert_eq!(artifact.extension(), "pdf");
    assert_eq!(artifact.file_name(), "processed-image.pdf");
    assert!(artifact.elapsed >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn jpeg_keeps_jpeg_extension() {
    let mock = MockProcessor::new(Duration::ZERO);
    let artifact = export_image(&mock, &TransformParameters::default(), Some(&source())).await.unwrap();
    assert_eq!(artifact.file_name(), "processed-image.jpeg");
}

#[tokio::test(start_paused = true)]
async fn missing_source_makes_no_call() {
    let mock = MockProcessor::new(Duration::ZERO);
    let err = export_image(&mock, &TransformParameters::default(), None).await.unwrap_err();
    assert!(matches!(err, ExportError::NoSource));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_dimensions_make_no_call() {
    let mock = MockProcessor::new(Duration::ZERO);
    let p = params_with(vec![ParameterChange::Width(Some(-1.0))]);
    let err = export_image(&mock, &p, Some(&source())).await.unwrap_err();
    assert!(matches!(err, ExportError::InvalidDimensions));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failure_reports_elapsed_and_upload_size() {
    let mock = MockProcessor::new(Duration::from_millis(300))
        .with_replies(vec![MockReply::Fail { status: 500, message: "disk full" }]);
    let src = source();

    let err = export_image(&mock, &TransformParameters::default(), Some(&src)).await.unwrap_err();
    match err {
        ExportError::Failed { elapsed, attempted_bytes, source } => {
            assert!(elapsed >= Duration::from_millis(300));
            assert_eq!(attempted_bytes, src.byte_size());
            assert_eq!(source.to_string(), "processing failed (status 500): disk full");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn write_to_uses_export_file_name() {
    let dir = std::env::temp_dir().join(format!("pixelpress-export-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let artifact = ExportArtifact {
        bytes: Bytes::from_static(b"png-bytes"),
        format: OutputFormat::Png,
        byte_size: 9,
        elapsed: Duration::from_millis(5),
    };

    let path = artifact.write_to(&dir).await.unwrap();
    assert_eq!(path, dir.join("processed-image.png"));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png-bytes");

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
