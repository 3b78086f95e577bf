/// Full-size image loading for the main view
/// Decodes the current image on tokio's blocking pool so the UI stays responsive
use iced::widget::image as image_widget;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A decoded image plus its pixel size, needed for fit and pan math
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub handle: image_widget::Handle,
    pub width: u32,
    pub height: u32,
}

impl PreviewImage {
    pub fn size(&self) -> iced::Size {
        iced::Size::new(self.width as f32, self.height as f32)
    }
}

/// Decode an image for display
/// Errors are returned as the text shown in the canvas
pub async fn load_preview(path: PathBuf) -> Result<PreviewImage, String> {
    // Spawn blocking task for CPU-bound work
    tokio::task::spawn_blocking(move || load_preview_blocking(&path))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
}

/// Blocking version of preview loading
fn load_preview_blocking(path: &Path) -> Result<PreviewImage, String> {
    let img = image::open(path).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    debug!("Decoded {} ({}x{})", path.display(), width, height);

    Ok(PreviewImage {
        handle: image_widget::Handle::from_rgba(width, height, rgba.into_raw()),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_load_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        image::RgbaImage::new(30, 12).save(&path).unwrap();

        let preview = load_preview_blocking(&path).unwrap();
        assert_eq!((preview.width, preview.height), (30, 12));
        assert_eq!(preview.size(), iced::Size::new(30.0, 12.0));
    }

    #[test]
    fn test_bad_file_error_is_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, b"nope").unwrap();

        let err = load_preview_blocking(&path).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_async_load_on_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        image::RgbaImage::new(4, 4).save(&path).unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let preview = runtime.block_on(load_preview(path)).unwrap();
        assert_eq!(preview.width, 4);
    }
}
