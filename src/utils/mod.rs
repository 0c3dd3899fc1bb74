// reframe/src/utils/mod.rs
use std::path::{Path, PathBuf};

/// Pick an output path: the explicit one if given, otherwise the input's
/// stem with a suffix and, when re-encoding to another format, the new
/// extension. Never overwrites an existing file.
pub fn generate_output_path(
    input_path: &Path,
    output: Option<&Path>,
    suffix: &str,
    extension: Option<&str>,
) -> PathBuf {
    if let Some(path) = output {
        return path.to_path_buf();
    }

    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let extension = extension
        .map(str::to_string)
        .or_else(|| {
            input_path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "jpg".to_string());

    let mut candidate = input_path.with_file_name(format!("{}_{}.{}", stem, suffix, extension));
    let mut counter = 1;

    while candidate.exists() {
        candidate =
            input_path.with_file_name(format!("{}_{}_{}.{}", stem, suffix, counter, extension));
        counter += 1;
    }

    candidate
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = (bytes_f64.log10() / base.log10()).floor() as i32;
    let size = bytes_f64 / base.powi(exponent);

    format!("{:.2} {}", size, UNITS[exponent as usize])
}

pub fn calculate_aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        0.0
    } else {
        width as f32 / height as f32
    }
}

/// Parse a `WIDTHxHEIGHT` bound like `800x600`.
pub fn parse_dimensions(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let width = w.trim().parse().ok()?;
    let height = h.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_uses_suffix_and_format_extension() {
        let path = generate_output_path(Path::new("/tmp/photo.jpg"), None, "resized", Some("png"));
        assert_eq!(path, Path::new("/tmp/photo_resized.png"));
    }

    #[test]
    fn explicit_output_wins() {
        let out = Path::new("/tmp/custom.gif");
        let path = generate_output_path(Path::new("/tmp/photo.jpg"), Some(out), "resized", None);
        assert_eq!(path, out);
    }

    #[test]
    fn file_sizes_are_humanized() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1536), "1.50 KB");
    }

    #[test]
    fn aspect_ratio_handles_zero_height() {
        assert_eq!(calculate_aspect_ratio(1920, 1080), 1920.0 / 1080.0);
        assert_eq!(calculate_aspect_ratio(100, 0), 0.0);
    }

    #[test]
    fn dimension_strings_parse() {
        assert_eq!(parse_dimensions("800x600"), Some((800, 600)));
        assert_eq!(parse_dimensions("800X600"), Some((800, 600)));
        assert_eq!(parse_dimensions("0x600"), None);
        assert_eq!(parse_dimensions("800"), None);
    }
}
