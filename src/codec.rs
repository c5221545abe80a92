//! Image file helpers: supported extensions, decoding, and format-specific
//! encoding.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageError, ImageFormat, RgbImage};

use crate::error::{Error, Result};

/// File extensions considered by the batch driver (matched case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "gif"];

/// JPEG quality used for output files.
pub const JPEG_QUALITY: u8 = 95;

/// Output subdirectory name in normal mode.
pub const OUTPUT_DIR: &str = "processed";

/// Output subdirectory name in debug mode.
pub const DEBUG_OUTPUT_DIR: &str = "processed_debug";

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
}

/// Output directory for a batch over `input_dir`.
#[must_use]
pub fn output_dir_for(input_dir: &Path, debug: bool) -> PathBuf {
    input_dir.join(if debug { DEBUG_OUTPUT_DIR } else { OUTPUT_DIR })
}

/// Open and decode an image file as 8-bit RGB.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the file cannot be read or decoded.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    image::open(path)
        .map(DynamicImage::into_rgb8)
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Save an RGB image with format-specific settings.
///
/// JPEG is written at quality 95 with full-resolution chroma, PNG with fast
/// compression; every other format uses its default encoder.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if the extension is not a known image
/// format, or [`Error::Encode`] if encoding or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    let encode_err = |source| Error::Encode {
        path: path.to_path_buf(),
        source,
    };

    match format {
        ImageFormat::Jpeg => {
            let mut writer = create_writer(path).map_err(encode_err)?;
            JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
                .encode_image(img)
                .map_err(encode_err)?;
            writer
                .flush()
                .map_err(|e| encode_err(ImageError::IoError(e)))?;
        }
        ImageFormat::Png => {
            let mut writer = create_writer(path).map_err(encode_err)?;
            let encoder = PngEncoder::new_with_quality(
                &mut writer,
                CompressionType::Fast,
                FilterType::Adaptive,
            );
            img.write_with_encoder(encoder).map_err(encode_err)?;
            writer
                .flush()
                .map_err(|e| encode_err(ImageError::IoError(e)))?;
        }
        _ => img.save_with_format(path, format).map_err(encode_err)?,
    }

    Ok(())
}

fn create_writer(path: &Path) -> std::result::Result<BufWriter<File>, ImageError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(ImageError::IoError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn is_supported_image_accepts_allow_list() {
        for name in [
            "a.jpg", "a.JPEG", "a.png", "a.bmp", "a.tiff", "a.TIF", "a.webp", "a.gif",
        ] {
            assert!(is_supported_image(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn is_supported_image_rejects_other_files() {
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("raw.cr2")));
        assert!(!is_supported_image(Path::new("jpg")));
    }

    #[test]
    fn output_dir_depends_on_mode() {
        let base = Path::new("/photos");
        assert_eq!(output_dir_for(base, false), PathBuf::from("/photos/processed"));
        assert_eq!(
            output_dir_for(base, true),
            PathBuf::from("/photos/processed_debug")
        );
    }

    #[test]
    fn save_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::new(4, 4);
        let err = save_image(&img, &dir.path().join("out.xyz")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn save_into_missing_directory_is_encode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::new(4, 4);
        let err = save_image(&img, &dir.path().join("missing").join("out.png")).unwrap_err();
        assert!(matches!(err, Error::Encode { .. }));
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = RgbImage::from_fn(31, 17, |x, y| Rgb([x as u8, y as u8, 200]));
        save_image(&img, &path).unwrap();
        assert_eq!(load_image(&path).unwrap(), img);
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let img = RgbImage::from_pixel(45, 23, Rgb([120, 60, 30]));
        save_image(&img, &path).unwrap();
        assert_eq!(load_image(&path).unwrap().dimensions(), (45, 23));
    }

    #[test]
    fn load_reports_decode_failure_for_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(matches!(load_image(&path), Err(Error::Decode { .. })));
    }
}
