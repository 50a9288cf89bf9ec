// Minimal smoke run of the filter and compositing path

use chrono::Utc;
use photobooth::{
    composition::{CaptureMode, ComposedPhoto, FrameCompositor},
    config::LayoutConfig,
    export::{encode_buffer, ExportFormat},
    filters::FilterRegistry,
    frame::{FrameSize, FrameSource, PixelBuffer, TestPatternSource},
    transform,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing Photobooth core functionality");

    // 1. Frame source
    println!("\n1. Reading a test pattern frame...");
    let source = TestPatternSource::new(FrameSize::new(320, 240)).with_noise(0.1);
    let frame = source.current_frame()?;
    println!("   Frame: {}", frame.size());

    // 2. Every filter on a mirrored copy
    println!("\n2. Applying filters...");
    let registry = FilterRegistry::new();
    for filter in registry.available_filters() {
        let mut preview = PixelBuffer::new_transparent(frame.size());
        let region = preview.full_region();
        transform::draw_frame(&mut preview, &frame, region, true)?;
        registry.apply(filter, &mut preview, region)?;

        let path = format!("minimal_{}.png", filter);
        preview.save(&path)?;
        println!("   {:<10} -> {}", filter, path);
    }

    // 3. Bordered single photo
    println!("\n3. Compositing a single photo...");
    let compositor = FrameCompositor::new(LayoutConfig::default());
    let composed = compositor.compose(CaptureMode::Single, &frame, frame.size())?;
    let photo = ComposedPhoto::new(composed, CaptureMode::Single, Utc::now());
    println!("   Output: {}", photo.buffer().size());

    let filename = photo.filename(ExportFormat::Png.extension());
    let bytes = encode_buffer(photo.buffer(), ExportFormat::Png, 90)?;
    std::fs::write(&filename, &bytes)?;
    println!("   Saved {} ({} bytes)", filename, bytes.len());

    println!("\nAll checks passed");
    Ok(())
}
