mod common;
use common::*;

use cardscan::models::RotatedRect;

#[test]
fn finds_outline_of_clear_card() -> anyhow::Result<()> {
    let card = rect(100, 80, 200, 120);
    let img = upright_card(400, 300, card);

    let contours = CardRectifier::new().find_card_contours(&img)?;
    assert!(!contours.is_empty());

    let best = contours
        .iter()
        .filter_map(|c| c.bounding_rect())
        .map(|bbox| coverage(&bbox, &card))
        .fold(0.0, f64::max);
    assert!(best >= 0.9, "best coverage {}", best);

    Ok(())
}

#[test]
fn uniform_frames_have_no_card() {
    let rectifier = CardRectifier::new();
    for value in [0u8, 128, 255] {
        let err = rectifier.find_card_contours(&uniform_image(200, 150, value)).unwrap_err();
        assert!(matches!(err, RectifyError::NoCardDetected { pass: DetectionPass::Alignment }));
        assert!(err.is_recoverable());
    }
}

#[test]
fn alignment_without_contours_fails() {
    let err = CardRectifier::new()
        .correct_alignment(uniform_image(50, 50, 10), &[])
        .unwrap_err();
    assert!(matches!(err, RectifyError::NoCardDetected { .. }));
}

#[test]
fn upright_card_needs_no_rotation() -> anyhow::Result<()> {
    let rectifier = CardRectifier::new();
    let img = upright_card(400, 300, rect(90, 70, 220, 130));

    let contours = rectifier.find_card_contours(&img)?;
    let first = rectifier.correct_alignment(img, &contours)?;
    assert!(first.angle.abs() < 2.0, "first angle {}", first.angle);
    assert_eq!((first.image.width(), first.image.height()), (400, 300));

    let contours = rectifier.find_card_contours(&first.image)?;
    let second = rectifier.correct_alignment(first.image, &contours)?;
    assert!(second.angle.abs() < 2.0, "second angle {}", second.angle);

    Ok(())
}

fn straighten(angle: f32) -> anyhow::Result<()> {
    let (card_w, card_h) = (300.0, 170.0);
    let rectifier = CardRectifier::new();
    let img = rotated_card_on_wood(520, 400, card_w, card_h, angle);

    let contours = rectifier.find_card_contours(&img)?;
    let aligned = rectifier.correct_alignment(img, &contours)?;
    assert!(
        (aligned.angle - angle).abs() < 2.0,
        "induced {} corrected {} (rect {:?})",
        angle,
        aligned.angle,
        aligned.card_rect
    );

    let crop = rectifier.extract_card(aligned.image)?;
    let expected = card_w / card_h;
    let actual = crop.bbox.aspect_ratio();
    assert!(
        ((actual - expected) / expected).abs() < 0.05,
        "aspect {} vs {} (bbox {:?})",
        actual,
        expected,
        crop.bbox
    );
    assert_eq!((crop.image.width(), crop.image.height()), (crop.bbox.width, crop.bbox.height));

    Ok(())
}

#[test]
fn straightens_clockwise_card_on_wood() -> anyhow::Result<()> {
    straighten(15.0)
}

#[test]
fn straightens_counter_clockwise_card_on_wood() -> anyhow::Result<()> {
    straighten(-15.0)
}

#[test]
fn blurry_frame_gets_sharpened_crop() -> anyhow::Result<()> {
    let img = blurred_card(400, 300, rect(100, 80, 200, 120), 2.5);

    let crop = CardRectifier::new().extract_card(img.clone())?;
    assert!(crop.sharpness < 100.0, "sharpness {}", crop.sharpness);
    assert!(crop.sharpened);

    let plain = img.crop_imm(crop.bbox.x, crop.bbox.y, crop.bbox.width, crop.bbox.height);
    assert_eq!((plain.width(), plain.height()), (crop.image.width(), crop.image.height()));
    assert_ne!(plain.as_bytes(), crop.image.as_bytes());

    Ok(())
}

#[test]
fn sharp_frame_is_cropped_untouched() -> anyhow::Result<()> {
    let img = upright_card(400, 300, rect(100, 80, 200, 120));

    let crop = CardRectifier::new().extract_card(img.clone())?;
    assert!(crop.sharpness >= 100.0, "sharpness {}", crop.sharpness);
    assert!(!crop.sharpened);

    let plain = img.crop_imm(crop.bbox.x, crop.bbox.y, crop.bbox.width, crop.bbox.height);
    assert_eq!(plain.as_bytes(), crop.image.as_bytes());

    Ok(())
}

#[test]
fn blur_threshold_is_configurable() -> anyhow::Result<()> {
    let img = upright_card(400, 300, rect(100, 80, 200, 120));

    let crop = CardRectifier::new().with_blur_threshold(1e9).extract_card(img)?;
    assert!(crop.sharpened);

    Ok(())
}

#[test]
fn crop_pass_reports_missing_card() {
    let err = CardRectifier::new().extract_card(uniform_image(120, 90, 200)).unwrap_err();
    assert!(matches!(err, RectifyError::NoCardDetected { pass: DetectionPass::Crop }));
}

#[test]
fn rectify_runs_full_chain_on_oversized_frame() -> anyhow::Result<()> {
    // 800x640 is scaled once to 640x512 before detection
    let img = rotated_card_on_wood(800, 640, 450.0, 260.0, 10.0);

    let card = CardRectifier::new().rectify(img)?;
    assert!((card.angle - 10.0).abs() < 2.0, "angle {}", card.angle);
    assert!(card.bbox.x + card.bbox.width <= 640 && card.bbox.y + card.bbox.height <= 512);

    let expected = 450.0 / 260.0;
    let ratio = card.image.width() as f32 / card.image.height() as f32;
    assert!(((ratio - expected) / expected).abs() < 0.05, "ratio {}", ratio);

    Ok(())
}

#[test]
fn rectifiers_run_independently_across_threads() -> anyhow::Result<()> {
    let rectifier = CardRectifier::new();
    let frames: Vec<_> = [-12.0f32, 0.0, 12.0]
        .iter()
        .map(|&angle| rotated_card_on_wood(420, 320, 240.0, 140.0, angle))
        .collect();

    let sequential: Vec<_> = frames
        .iter()
        .map(|f| rectifier.rectify(f.clone()).map(|c| c.bbox))
        .collect::<Result<_, _>>()?;

    let shared = &rectifier;
    let parallel: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = frames
            .iter()
            .map(|f| scope.spawn(move || shared.rectify(f.clone()).map(|c| c.bbox)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect::<Result<Vec<_>, _>>()
    })?;

    assert_eq!(sequential, parallel);
    Ok(())
}

#[test]
fn rotated_rect_is_reported_with_alignment() -> anyhow::Result<()> {
    let rectifier = CardRectifier::new();
    let img = rotated_card_on_wood(520, 400, 300.0, 170.0, 20.0);
    let contours = rectifier.find_card_contours(&img)?;
    let aligned = rectifier.correct_alignment(img, &contours)?;

    let RotatedRect { center, angle, .. } = aligned.card_rect;
    assert!(angle > 0.0 && angle <= 90.0);
    assert!((center.0 - 260.0).abs() < 10.0 && (center.1 - 200.0).abs() < 10.0);

    Ok(())
}
