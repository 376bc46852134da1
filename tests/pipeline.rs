use flat_icon_renderer::{
    BackgroundColor, Bitmap, Configurable, FlatIconError, IconParameters, IconPipeline,
    IconProfile, ImageSource, LoadOutcome, PipelineStatus, Shape,
};
use image::Rgba;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn red_square_png(side: u32) -> Vec<u8> {
    Bitmap::filled(side, side, RED).unwrap().encode_png().unwrap()
}

fn blue_circle(opacity: f64) -> IconParameters {
    IconParameters {
        background_color: BackgroundColor::new(0, 0, 255),
        shape: Shape::Circle,
        padding: 0.0,
        shadow_opacity: opacity,
        ..IconParameters::default()
    }
}

#[test]
fn red_square_on_blue_circle_without_shadow() {
    let mut pipeline = IconPipeline::with_parameters(&blue_circle(0.0)).unwrap();
    let icon = pipeline
        .load(ImageSource::Encoded(red_square_png(100)))
        .unwrap()
        .clone();

    // ceil(sqrt(100² + 100²))
    assert_eq!((icon.width(), icon.height()), (142, 142));

    // Foreground is centered and untouched
    assert_eq!(icon.pixel(71, 71), RED);
    assert_eq!(icon.pixel(21, 71), RED);
    assert_eq!(icon.pixel(120, 71), RED);

    // Backing circle shows around it, transparent outside
    assert_eq!(icon.pixel(1, 71), BLUE);
    assert_eq!(icon.pixel(71, 140), BLUE);
    assert_eq!(icon.pixel(0, 0)[3], 0);
    assert_eq!(icon.pixel(141, 141)[3], 0);

    // No trail anywhere below-right of the square
    assert_eq!(icon.pixel(100, 125), BLUE);
}

#[test]
fn default_shadow_darkens_down_right_only() {
    let mut pipeline = IconPipeline::with_parameters(&blue_circle(0.3)).unwrap();
    let icon = pipeline
        .load(ImageSource::Encoded(red_square_png(100)))
        .unwrap()
        .clone();

    // 30% black trail over blue
    assert_eq!(icon.pixel(100, 125), Rgba([0, 0, 178, 255]));
    assert_eq!(icon.pixel(125, 100), Rgba([0, 0, 178, 255]));

    // Nothing above or left of the square
    assert_eq!(icon.pixel(71, 10), BLUE);
    assert_eq!(icon.pixel(10, 71), BLUE);

    // The foreground is never dimmed by its own shadow
    assert_eq!(icon.pixel(71, 71), RED);
}

#[test]
fn data_uri_and_bytes_render_identically() {
    let png = red_square_png(20);
    let uri = Bitmap::decode(&png).unwrap().to_data_uri().unwrap();

    let mut from_bytes = IconPipeline::new();
    let mut from_uri = IconPipeline::new();
    let a = from_bytes.load(ImageSource::Encoded(png)).unwrap().clone();
    let b = from_uri.load(ImageSource::DataUri(uri)).unwrap().clone();

    assert_eq!(a, b);
}

#[test]
fn transparent_margins_are_cropped_before_sizing() {
    let mut canvas = Bitmap::transparent(60, 40).unwrap().into_image();
    for y in 10..20 {
        for x in 30..40 {
            canvas.put_pixel(x, y, RED);
        }
    }
    let png = Bitmap::from_image(canvas).unwrap().encode_png().unwrap();

    let mut pipeline = IconPipeline::new();
    let icon = pipeline.load(ImageSource::Encoded(png)).unwrap();

    // Sized from the 10x10 artwork, not the 60x40 canvas
    assert_eq!(icon.width(), 15);
}

#[test]
fn last_load_wins() {
    let mut pipeline = IconPipeline::new();
    let slow = pipeline.begin_load(ImageSource::Encoded(red_square_png(50)));
    let fast = pipeline.begin_load(ImageSource::Encoded(red_square_png(10)));

    let fast = std::thread::spawn(move || fast.decode()).join().unwrap();
    let slow = std::thread::spawn(move || slow.decode()).join().unwrap();

    assert_eq!(pipeline.finish_load(fast).unwrap(), LoadOutcome::Applied);
    assert_eq!(pipeline.finish_load(slow).unwrap(), LoadOutcome::Superseded);
    assert_eq!(pipeline.render().unwrap().width(), 15);
}

#[test]
fn empty_image_keeps_previous_render() {
    let mut pipeline = IconPipeline::new();
    let good = pipeline
        .load(ImageSource::Encoded(red_square_png(10)))
        .unwrap()
        .clone();

    let blank = Bitmap::transparent(10, 10).unwrap().encode_png().unwrap();
    assert!(matches!(
        pipeline.load(ImageSource::Encoded(blank)),
        Err(FlatIconError::EmptyImage)
    ));

    assert_eq!(pipeline.status(), PipelineStatus::Rendered);
    assert_eq!(pipeline.output(), Some(&good));
}

#[test]
fn profile_drives_rendering() {
    let profile = IconProfile::from_json(
        r#"{"backgroundColor": "blue", "shape": "square", "shadowOpacity": 0}"#,
    )
    .unwrap();

    let mut pipeline = IconPipeline::new();
    pipeline.apply_profile(&profile).unwrap();
    let icon = pipeline
        .load(ImageSource::Encoded(red_square_png(10)))
        .unwrap();

    // Square backing fills the corners
    assert_eq!(icon.pixel(0, 0), BLUE);
    assert_eq!(pipeline.export_profile(), profile);
}

#[test]
fn png_export_round_trips() {
    let mut pipeline = IconPipeline::new();
    let icon = pipeline
        .load(ImageSource::Encoded(red_square_png(16)))
        .unwrap()
        .clone();

    let decoded = Bitmap::decode(&icon.encode_png().unwrap()).unwrap();
    assert_eq!(decoded, icon);

    let preview = icon.preview(64).unwrap();
    assert_eq!((preview.width(), preview.height()), (64, 64));
}
