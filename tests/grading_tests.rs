use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

use rice_grader_lib::{
    Category, ChannelOrder, Classifier, ColorBand, GraderError, Pipeline, PipelineSpec, Polarity,
    Settings, Variant,
};

fn paint_rect(image: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            image.put_pixel(x, y, color);
        }
    }
}

fn paint_disc(image: &mut RgbImage, cx: i32, cy: i32, r: i32, color: Rgb<u8>) {
    for y in 0..image.height() as i32 {
        for x in 0..image.width() as i32 {
            if (x - cx) * (x - cx) + (y - cy) * (y - cy) <= r * r {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Dark grains on a light floor: one long grain, one round object, one
/// long discolored grain
fn dark_grain_frame() -> RgbImage {
    let mut image = RgbImage::from_pixel(300, 200, Rgb([220, 220, 220]));
    paint_rect(&mut image, 30, 40, 60, 12, Rgb([60, 60, 60]));
    paint_disc(&mut image, 200, 60, 15, Rgb([60, 60, 60]));
    paint_rect(&mut image, 120, 140, 60, 12, Rgb([160, 130, 30]));
    image
}

#[test]
fn uniform_dark_image_has_no_grains() {
    let image = RgbImage::from_pixel(100, 100, Rgb([20, 20, 20]));

    for variant in [Variant::Accurate, Variant::Realtime, Variant::Tray] {
        let pipeline = Pipeline::for_variant(variant).expect("valid preset");
        let report = pipeline.process(&image, &Settings::default()).expect("pass succeeds");

        assert_eq!(report.total(), 0, "{:?}", variant);
        assert!(report.grains.is_empty());
        assert_eq!(report.annotated, image);

        let expected = pipeline.spec().classifier.categories();
        assert_eq!(report.counts.iter().count(), expected.len());
        for &category in expected {
            assert_eq!(report.counts.get(category), 0);
        }
    }
}

#[test]
fn realtime_pass_fail_counts() {
    let pipeline = Pipeline::for_variant(Variant::Realtime).expect("valid preset");
    let report = pipeline.process(&dark_grain_frame(), &Settings::default()).expect("pass succeeds");

    // Round object fails on elongation, discolored grain on color
    assert_eq!(report.counts.get(Category::Pass), 1);
    assert_eq!(report.counts.get(Category::Fail), 2);
    assert_eq!(report.total(), report.grains.len());

    let pass = report
        .grains
        .iter()
        .find(|grain| grain.category == Category::Pass)
        .expect("one passing grain");
    assert!(pass.bbox.x >= 28 && pass.bbox.x <= 32);
    assert!(pass.features.elongation > 4.0);
}

#[test]
fn four_categories_on_bright_grains() {
    let mut spec = PipelineSpec::for_variant(Variant::Realtime);
    spec.polarity = Polarity::Bright;
    spec.classifier = Classifier::four_category();
    spec.default_color_band = ColorBand::SPOILAGE;
    let pipeline = Pipeline::new(spec).expect("valid spec");

    let mut image = RgbImage::from_pixel(300, 200, Rgb([30, 30, 30]));
    paint_rect(&mut image, 20, 20, 60, 12, Rgb([200, 200, 200]));
    paint_rect(&mut image, 120, 20, 20, 10, Rgb([200, 200, 200]));
    paint_rect(&mut image, 20, 120, 60, 12, Rgb([220, 200, 60]));
    paint_disc(&mut image, 200, 140, 15, Rgb([200, 200, 200]));

    let report = pipeline.process(&image, &Settings::default()).expect("pass succeeds");
    for category in [Category::Good, Category::Broken, Category::Spoiled, Category::Foreign] {
        assert_eq!(report.counts.get(category), 1, "{}", category);
    }
    assert_eq!(report.total(), 4);

    let spoiled = report
        .grains
        .iter()
        .find(|grain| grain.category == Category::Spoiled)
        .expect("one spoiled grain");
    assert!(spoiled.features.color_ratio > 0.9);
}

#[test]
fn raising_color_sensitivity_turns_spoiled_into_good() {
    let mut spec = PipelineSpec::for_variant(Variant::Realtime);
    spec.polarity = Polarity::Bright;
    spec.classifier = Classifier::four_category();
    spec.default_color_band = ColorBand::SPOILAGE;
    let pipeline = Pipeline::new(spec).expect("valid spec");

    // Grain with a discolored tip covering a quarter of its box
    let mut image = RgbImage::from_pixel(200, 100, Rgb([30, 30, 30]));
    paint_rect(&mut image, 40, 40, 60, 12, Rgb([200, 200, 200]));
    paint_rect(&mut image, 40, 40, 15, 12, Rgb([220, 200, 60]));

    let strict = pipeline.process(&image, &Settings::default()).expect("pass succeeds");
    assert_eq!(strict.counts.get(Category::Spoiled), 1);

    let lenient = Settings { color_sensitivity: 0.5, ..Settings::default() };
    let relaxed = pipeline.process(&image, &lenient).expect("pass succeeds");
    assert_eq!(relaxed.counts.get(Category::Good), 1);
}

#[test]
fn tray_variant_counts_white_grains_inside_the_tray() {
    let mut image = RgbImage::from_pixel(400, 300, Rgb([200, 20, 20]));
    paint_rect(&mut image, 30, 30, 340, 240, Rgb([40, 40, 40]));
    paint_rect(&mut image, 80, 80, 40, 12, Rgb([230, 230, 230]));
    paint_rect(&mut image, 220, 180, 40, 12, Rgb([230, 230, 230]));

    let pipeline = Pipeline::for_variant(Variant::Tray).expect("valid preset");
    let (report, trace) = pipeline
        .process_traced(&image, &Settings::default())
        .expect("pass succeeds");

    assert!(trace.tray.is_some());
    assert_eq!(trace.prepared.width(), 800);
    assert_eq!(report.counts.get(Category::Good), 2);
    assert_eq!(report.total(), 2);
    assert_eq!(report.annotated.dimensions(), (400, 300));

    // Boxes are reported in input coordinates
    let first = report.grains.iter().map(|grain| grain.bbox).min_by_key(|bbox| bbox.x).expect("two grains");
    assert!(first.x >= 78 && first.x <= 82);
    assert!(first.width >= 38 && first.width <= 42);
}

#[test]
fn accurate_preset_splits_touching_discs() {
    let mut image = RgbImage::from_pixel(120, 80, Rgb([220, 220, 220]));
    paint_disc(&mut image, 40, 40, 20, Rgb([60, 60, 60]));
    paint_disc(&mut image, 78, 40, 20, Rgb([60, 60, 60]));

    let accurate = Pipeline::for_variant(Variant::Accurate).expect("valid preset");
    let report = accurate.process(&image, &Settings::default()).expect("pass succeeds");

    // Round objects classify as foreign matter
    assert_eq!(report.grains.len(), 2);
    assert_eq!(report.counts.get(Category::Foreign), 2);
    assert_eq!(report.counts.total(), 2);
    assert_eq!(report.counts.total(), report.grains.len());
    let left = report.grains.iter().map(|grain| grain.bbox.x).min().expect("two grains");
    assert!(left >= 18 && left <= 22, "left edge {}", left);

    let realtime = Pipeline::for_variant(Variant::Realtime).expect("valid preset");
    let merged = realtime.process(&image, &Settings::default()).expect("pass succeeds");
    assert_eq!(merged.grains.len(), 1);
    assert_eq!(merged.counts.total(), 1);
}

#[test]
fn accurate_preset_seeds_only_the_thickest_objects() {
    // The seed cutoff is relative to the thickest object in the frame, so the
    // 12 px wide gray grain gets no seed next to the 30 px disc
    let report = Pipeline::for_variant(Variant::Accurate)
        .expect("valid preset")
        .process(&dark_grain_frame(), &Settings::default())
        .expect("pass succeeds");

    assert_eq!(report.counts.get(Category::Foreign), 1);
    assert_eq!(report.counts.get(Category::Good), 0);
    assert_eq!(report.total(), report.grains.len());
    assert!(report.total() < 3);
}

#[test]
fn repeated_passes_are_identical() {
    let image = dark_grain_frame();
    for variant in [Variant::Accurate, Variant::Realtime] {
        let pipeline = Pipeline::for_variant(variant).expect("valid preset");
        let first = pipeline.process(&image, &Settings::default()).expect("pass succeeds");
        let second = pipeline.process(&image, &Settings::default()).expect("pass succeeds");

        assert_eq!(first.counts, second.counts);
        assert_eq!(first.annotated, second.annotated);
        let boxes = |report: &rice_grader_lib::GradingReport| {
            report.grains.iter().map(|grain| grain.bbox).collect::<Vec<_>>()
        };
        assert_eq!(boxes(&first), boxes(&second));
        assert_eq!(first.total(), first.grains.len());
    }
}

#[test]
fn raw_frames_match_decoded_images() {
    let image = dark_grain_frame();
    let pipeline = Pipeline::for_variant(Variant::Realtime).expect("valid preset");
    let settings = Settings::default();
    let expected = pipeline.process(&image, &settings).expect("pass succeeds");

    let mut bgr = image.clone().into_raw();
    for pixel in bgr.chunks_exact_mut(3) {
        pixel.swap(0, 2);
    }
    let from_bgr = pipeline
        .process_frame(300, 200, 3, &bgr, ChannelOrder::Bgr, &settings)
        .expect("valid frame");
    assert_eq!(from_bgr.counts, expected.counts);

    let from_dynamic = pipeline
        .process_dynamic(&DynamicImage::ImageRgb8(image), &settings)
        .expect("three channels");
    assert_eq!(from_dynamic.counts, expected.counts);
}

#[test]
fn malformed_input_is_rejected() {
    let pipeline = Pipeline::for_variant(Variant::Realtime).expect("valid preset");
    let settings = Settings::default();

    let short = vec![0u8; 10];
    assert!(matches!(
        pipeline.process_frame(4, 4, 3, &short, ChannelOrder::Rgb, &settings),
        Err(GraderError::InvalidInput(_))
    ));

    let rgba = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));
    assert!(matches!(
        pipeline.process_dynamic(&rgba, &settings),
        Err(GraderError::InvalidInput(_))
    ));
}
