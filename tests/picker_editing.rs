//! Terminal picker with the crop step, feeding the encoder.

use image::{ImageBuffer, Rgb};
use nutrisnap::encoder::{DataUriEncoder, PayloadEncoder};
use nutrisnap::source::{
    CaptureMode, ImagePicker, ImageRef, PickerOptions, PickerOutcome, Prompt, TerminalPicker,
};
use tokio::io::BufReader;

fn scripted(input: String) -> Prompt {
    Prompt::new(
        BufReader::new(std::io::Cursor::new(input.into_bytes())),
        tokio::io::sink(),
    )
}

fn write_png(dir: &std::path::Path, width: u32, height: u32) -> std::path::PathBuf {
    let path = dir.join("meal.png");
    let img = ImageBuffer::from_fn(width, height, |x, _| Rgb([(x % 256) as u8, 120, 40]));
    img.save(&path).unwrap();
    path
}

#[tokio::test]
async fn test_edited_photo_is_cropped_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), 800, 450);

    let picker = TerminalPicker::new(scripted(format!("{}\n", path.display())));
    let outcome = picker
        .launch(CaptureMode::Gallery, &PickerOptions::default())
        .await
        .unwrap();
    let PickerOutcome::Selected(image) = outcome else {
        panic!("expected a photo");
    };
    assert_eq!(image.known_mime(), Some("image/jpeg"));

    let ImageRef::Memory { bytes, .. } = &image else {
        panic!("edited photos live in memory");
    };
    let decoded = image::load_from_memory(bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (600, 450));

    let payload = DataUriEncoder::new().encode(&image).await.unwrap();
    assert!(payload.as_str().starts_with("data:image/jpeg;base64,/9j/"));
    assert_eq!(payload.byte_len(), bytes.len());
}

#[tokio::test]
async fn test_unedited_photo_keeps_its_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), 64, 64);

    let picker = TerminalPicker::new(scripted(format!("{}\n", path.display())));
    let options = PickerOptions {
        allows_editing: false,
        ..PickerOptions::default()
    };
    let PickerOutcome::Selected(image) = picker.launch(CaptureMode::Camera, &options).await.unwrap()
    else {
        panic!("expected a photo");
    };
    assert_eq!(image, ImageRef::file(&path));

    let payload = DataUriEncoder::new().encode(&image).await.unwrap();
    assert_eq!(payload.mime(), "image/png");
}

#[tokio::test]
async fn test_not_an_image_is_an_acquisition_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "grocery list").unwrap();

    let picker = TerminalPicker::new(scripted(format!("{}\n", path.display())));
    let err = picker
        .launch(CaptureMode::Gallery, &PickerOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.category(), "acquisition");
}
