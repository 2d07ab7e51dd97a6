//! PNG icon preparation.
//!
//! Both Linux formats need a PNG icon. The configured icon (usually an
//! `.ico`) is converted, a simple one is drawn when none is configured, and
//! a 1×1 placeholder is written if image handling fails altogether.

use crate::bundler::error::{Error, ErrorExt, Result};
use image::{ImageBuffer, ImageFormat, Rgba, imageops::FilterType};
use std::path::{Path, PathBuf};

/// Edge length of generated and converted icons.
pub const ICON_SIZE: u32 = 256;

/// Valid 1×1 transparent PNG.
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x60,
    0x00, 0x02, 0x00, 0x00, 0x05, 0x00, 0x01, 0x7a, 0x5e, 0xab, 0x3f, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// How the icon was obtained.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IconSource {
    /// Converted from the configured icon.
    Converted,
    /// Drawn because no icon is configured.
    Generated,
    /// The embedded placeholder.
    Placeholder,
}

/// Writes a PNG icon to `dest`.
pub async fn write_png_icon(source: Option<&Path>, dest: &Path) -> Result<IconSource> {
    let (source, dest_buf) = (source.map(Path::to_path_buf), dest.to_path_buf());
    let attempt = tokio::task::spawn_blocking(move || render(source.as_deref(), &dest_buf))
        .await
        .map_err(|e| Error::GenericError(format!("icon task panicked: {}", e)))?;

    match attempt {
        Ok(kind) => Ok(kind),
        Err(e) => {
            log::warn!("Icon conversion failed, using placeholder: {}", e);
            tokio::fs::write(dest, PLACEHOLDER_PNG)
                .await
                .fs_context("writing placeholder icon", dest)?;
            Ok(IconSource::Placeholder)
        }
    }
}

fn render(source: Option<&Path>, dest: &Path) -> Result<IconSource> {
    match source {
        Some(source) => {
            let img = image::open(source)?;
            img.resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Lanczos3)
                .save_with_format(dest, ImageFormat::Png)?;
            Ok(IconSource::Converted)
        }
        None => {
            generated_icon().save_with_format(dest, ImageFormat::Png)?;
            Ok(IconSource::Generated)
        }
    }
}

/// A disc on a transparent background.
fn generated_icon() -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let center = ICON_SIZE as f32 / 2.0;
    let radius = center - 8.0;
    ImageBuffer::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let (dx, dy) = (x as f32 - center, y as f32 - center);
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > radius {
            Rgba([0, 0, 0, 0])
        } else if distance < radius * 0.2 {
            Rgba([230, 230, 235, 255])
        } else {
            let shade = (120.0 + 100.0 * (distance / radius)) as u8;
            Rgba([40, 70, shade, 255])
        }
    })
}

/// File name `<stem>.png` inside `dir`.
pub fn png_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_valid_png() {
        let img = image::load_from_memory(PLACEHOLDER_PNG).unwrap();
        assert_eq!((img.width(), img.height()), (1, 1));
    }

    #[tokio::test]
    async fn generates_icon_without_source() {
        let dir = tempfile::tempdir().unwrap();
        let dest = png_path(dir.path(), "ROM_Converter");
        assert_eq!(write_png_icon(None, &dest).await.unwrap(), IconSource::Generated);

        let img = image::open(&dest).unwrap();
        assert_eq!((img.width(), img.height()), (ICON_SIZE, ICON_SIZE));
    }

    #[tokio::test]
    async fn converts_configured_icon() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("icon.png");
        ImageBuffer::from_pixel(32, 32, Rgba([255u8, 0, 0, 255]))
            .save(&source)
            .unwrap();

        let dest = png_path(dir.path(), "out");
        assert_eq!(
            write_png_icon(Some(&source), &dest).await.unwrap(),
            IconSource::Converted
        );
        assert_eq!(image::open(&dest).unwrap().width(), ICON_SIZE);
    }

    #[tokio::test]
    async fn unreadable_icon_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("icon.ico");
        std::fs::write(&source, b"not an icon").unwrap();

        let dest = png_path(dir.path(), "out");
        assert_eq!(
            write_png_icon(Some(&source), &dest).await.unwrap(),
            IconSource::Placeholder
        );
        assert_eq!(std::fs::read(&dest).unwrap(), PLACEHOLDER_PNG);
    }
}
