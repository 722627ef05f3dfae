use std::path::PathBuf;

use crate::device::{FilterMode, SamplerPolicy, WrapMode};

/// Where a texture's pixels come from.
///
/// `Pixels` carries pre-decoded RGBA8 data and is the path procedural
/// content and tests use; the other two decode on a worker thread.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Encoded(Vec<u8>),
    Pixels(PixelImage),
}

impl ImageSource {
    /// Human-readable name used when a load failure reports its source.
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Encoded(_) => "<encoded image>".to_owned(),
            Self::Pixels(_) => "<pixel data>".to_owned(),
        }
    }
}

/// Decoded RGBA8 image.
#[derive(Debug, Clone)]
pub struct PixelImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PixelImage {
    /// A zero-filled (transparent black) image.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; (width * height * 4) as usize],
        }
    }
}

/// Requested sampling behavior; unset fields take the defaults below.
///
/// Defaults: repeat wrapping on both axes, linear magnification, mipmaps
/// enabled with a linear-mipmap-nearest minification filter.
#[derive(Debug, Clone, Default)]
pub struct SamplingConfig {
    pub wrap_s: Option<WrapMode>,
    pub wrap_t: Option<WrapMode>,
    pub min_filter: Option<FilterMode>,
    pub mag_filter: Option<FilterMode>,
    pub mipmaps: Option<bool>,
}

impl SamplingConfig {
    /// Resolves the request into a concrete policy.
    ///
    /// When `mipmaps` is unset, an explicit minification filter decides it;
    /// otherwise mipmaps default on.
    pub(crate) fn resolve(&self) -> SamplerPolicy {
        let mipmaps = self
            .mipmaps
            .unwrap_or_else(|| self.min_filter.map_or(true, FilterMode::uses_mipmaps));
        SamplerPolicy {
            wrap_s: self.wrap_s.unwrap_or(WrapMode::Repeat),
            wrap_t: self.wrap_t.unwrap_or(WrapMode::Repeat),
            min_filter: self.min_filter.unwrap_or(if mipmaps {
                FilterMode::LinearMipmapNearest
            } else {
                FilterMode::Linear
            }),
            mag_filter: self.mag_filter.unwrap_or(FilterMode::Linear),
            mipmaps,
        }
    }
}

/// A 2D texture load request.
#[derive(Debug, Clone, Default)]
pub struct Texture2dConfig {
    pub src: Option<ImageSource>,
    pub sampling: SamplingConfig,
}

/// A cube map load request; all six faces are required.
#[derive(Debug, Clone, Default)]
pub struct TextureCubeConfig {
    pub pos_x: Option<ImageSource>,
    pub neg_x: Option<ImageSource>,
    pub pos_y: Option<ImageSource>,
    pub neg_y: Option<ImageSource>,
    pub pos_z: Option<ImageSource>,
    pub neg_z: Option<ImageSource>,
    pub sampling: SamplingConfig,
}

/// A caller-drawn texture of fixed size, usable immediately.
#[derive(Debug, Clone)]
pub struct CanvasTextureConfig {
    pub width: u32,
    pub height: u32,
    pub sampling: SamplingConfig,
}

pub(crate) fn is_power_of_two(x: u32) -> bool {
    x != 0 && x & (x - 1) == 0
}

/// Applies the non-power-of-two restriction at load completion.
///
/// Checked independently per axis; a failing texture keeps clamp-to-edge
/// wrapping, plain linear filters, and no mipmaps. The policy only ever
/// downgrades here, never upgrades.
pub(crate) fn apply_npot_rule(policy: &mut SamplerPolicy, width: u32, height: u32) {
    if !is_power_of_two(width) || !is_power_of_two(height) {
        policy.wrap_s = WrapMode::ClampToEdge;
        policy.wrap_t = WrapMode::ClampToEdge;
        policy.min_filter = FilterMode::Linear;
        policy.mag_filter = FilterMode::Linear;
        policy.mipmaps = false;
    }
}

/// Resolves an [`ImageSource`] to pixels. Runs on a worker thread for
/// asynchronous loads; the error string names the failing source.
pub(crate) fn decode(source: &ImageSource) -> Result<PixelImage, String> {
    match source {
        ImageSource::Path(path) => {
            let bytes = std::fs::read(path)
                .map_err(|e| format!("failed to read image {}: {e}", path.display()))?;
            decode_bytes(&bytes).map_err(|e| format!("failed to decode image {}: {e}", path.display()))
        }
        ImageSource::Encoded(bytes) => {
            decode_bytes(bytes).map_err(|e| format!("failed to decode image {}: {e}", source.label()))
        }
        ImageSource::Pixels(image) => {
            let expected = (image.width * image.height * 4) as usize;
            if image.rgba.len() != expected {
                return Err(format!(
                    "pixel data is {} bytes, expected {expected} for {}x{}",
                    image.rgba.len(),
                    image.width,
                    image.height
                ));
            }
            Ok(image.clone())
        }
    }
}

fn decode_bytes(bytes: &[u8]) -> Result<PixelImage, String> {
    let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = decoded.to_rgba8();
    Ok(PixelImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── power of two ──────────────────────────────────────────────────────

    #[test]
    fn power_of_two_test() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(128));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(100));
        assert!(!is_power_of_two(96));
    }

    #[test]
    fn npot_rule_checks_each_axis() {
        let base = SamplingConfig::default().resolve();

        let mut p = base;
        apply_npot_rule(&mut p, 128, 64);
        assert_eq!(p, base); // both powers of two: untouched

        for (w, h) in [(100, 64), (128, 50), (100, 50)] {
            let mut p = base;
            apply_npot_rule(&mut p, w, h);
            assert_eq!(p.wrap_s, WrapMode::ClampToEdge);
            assert_eq!(p.wrap_t, WrapMode::ClampToEdge);
            assert_eq!(p.min_filter, FilterMode::Linear);
            assert_eq!(p.mag_filter, FilterMode::Linear);
            assert!(!p.mipmaps);
        }
    }

    // ── sampling defaults ─────────────────────────────────────────────────

    #[test]
    fn default_sampling_enables_mipmaps() {
        let policy = SamplingConfig::default().resolve();
        assert_eq!(policy.wrap_s, WrapMode::Repeat);
        assert_eq!(policy.min_filter, FilterMode::LinearMipmapNearest);
        assert_eq!(policy.mag_filter, FilterMode::Linear);
        assert!(policy.mipmaps);
    }

    #[test]
    fn explicit_plain_min_filter_implies_no_mipmaps() {
        let policy = SamplingConfig {
            min_filter: Some(FilterMode::Nearest),
            ..SamplingConfig::default()
        }
        .resolve();
        assert_eq!(policy.min_filter, FilterMode::Nearest);
        assert!(!policy.mipmaps);
    }

    #[test]
    fn disabling_mipmaps_changes_min_filter_default() {
        let policy = SamplingConfig {
            mipmaps: Some(false),
            ..SamplingConfig::default()
        }
        .resolve();
        assert_eq!(policy.min_filter, FilterMode::Linear);
        assert!(!policy.mipmaps);
    }

    // ── decode ────────────────────────────────────────────────────────────

    #[test]
    fn pixel_source_validates_length() {
        let bad = ImageSource::Pixels(PixelImage {
            width: 2,
            height: 2,
            rgba: vec![0; 3],
        });
        assert!(decode(&bad).is_err());

        let good = ImageSource::Pixels(PixelImage::blank(2, 2));
        assert_eq!(decode(&good).unwrap().rgba.len(), 16);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode(&ImageSource::Encoded(vec![1, 2, 3, 4])).unwrap_err();
        assert!(err.contains("failed to decode"));
    }
}
