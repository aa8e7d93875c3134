//! Crop specification model
//!
//! A crop is an optional width, an optional height and an ordered list of
//! options applied to a source image. `SourceRef` names the original,
//! `EncodedPath` names the derived artifact.

use crate::error::CropError;
use std::fmt;

/// Output image format, taken from `format(...)` or the source extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "gif" => Some(OutputFormat::Gif),
            "webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::WebP => "webp",
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        content_type_for_extension(self.extension())
    }
}

/// Content type served for a local artifact, keyed on its extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "gif" => "image/gif",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Gravity used by `crop` when trimming the excess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quadrant {
    Top,
    Bottom,
    Left,
    Right,
    #[default]
    Center,
}

impl Quadrant {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "T" | "t" => Some(Quadrant::Top),
            "B" | "b" => Some(Quadrant::Bottom),
            "L" | "l" => Some(Quadrant::Left),
            "R" | "r" => Some(Quadrant::Right),
            "C" | "c" => Some(Quadrant::Center),
            _ => None,
        }
    }

    fn code(self) -> &'static str {
        match self {
            Quadrant::Top => "T",
            Quadrant::Bottom => "B",
            Quadrant::Left => "L",
            Quadrant::Right => "R",
            Quadrant::Center => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Gray,
    Negative,
    Blur,
}

impl Filter {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "gray" => Some(Filter::Gray),
            "negative" => Some(Filter::Negative),
            "blur" => Some(Filter::Blur),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Filter::Gray => "gray",
            Filter::Negative => "negative",
            Filter::Blur => "blur",
        }
    }
}

/// How the source is fitted into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Fit within the box, keeping the aspect ratio.
    Fit,
    /// Fill the box, cutting the excess at the given gravity.
    Fill(Quadrant),
    /// Fit within the box, then letterbox to its exact size.
    Pad([u8; 3]),
}

/// A single named crop option, as it appears in the path grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CropOption {
    Resize,
    Crop,
    Pad([u8; 3]),
    Quadrant(Quadrant),
    Quality(u8),
    Trim,
    Interlace,
    Format(OutputFormat),
    Upscale,
    Filters(Vec<Filter>),
    /// Serve the source unmodified.
    Original,
}

impl CropOption {
    pub fn name(&self) -> &'static str {
        match self {
            CropOption::Resize => "resize",
            CropOption::Crop => "crop",
            CropOption::Pad(_) => "pad",
            CropOption::Quadrant(_) => "quadrant",
            CropOption::Quality(_) => "quality",
            CropOption::Trim => "trim",
            CropOption::Interlace => "interlace",
            CropOption::Format(_) => "format",
            CropOption::Upscale => "upscale",
            CropOption::Filters(_) => "filters",
            CropOption::Original => "original",
        }
    }

    pub fn args(&self) -> Option<String> {
        match self {
            CropOption::Pad([r, g, b]) => Some(format!("{},{},{}", r, g, b)),
            CropOption::Quadrant(q) => Some(q.code().to_string()),
            CropOption::Quality(q) => Some(q.to_string()),
            CropOption::Format(f) => Some(f.extension().to_string()),
            CropOption::Filters(filters) => Some(
                filters
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            _ => None,
        }
    }

    /// Parse an option from its grammar form.
    ///
    /// Returns `Ok(None)` for keys this version does not know about, so the
    /// caller can decide whether unknown keys are fatal.
    pub fn parse(name: &str, args: Option<&str>) -> Result<Option<Self>, String> {
        let require_args = || {
            args.filter(|a| !a.is_empty())
                .ok_or_else(|| format!("{} requires arguments", name))
        };
        let reject_args = |option: CropOption| match args {
            None => Ok(Some(option)),
            Some(_) => Err(format!("{} takes no arguments", name)),
        };

        match name {
            "resize" => reject_args(CropOption::Resize),
            "crop" => reject_args(CropOption::Crop),
            "trim" => reject_args(CropOption::Trim),
            "interlace" => reject_args(CropOption::Interlace),
            "upscale" => reject_args(CropOption::Upscale),
            "original" => reject_args(CropOption::Original),
            "quality" => {
                let value: u8 = require_args()?
                    .parse()
                    .map_err(|_| "quality must be an integer".to_string())?;
                if value > 100 {
                    return Err(format!("quality {} out of range 0-100", value));
                }
                Ok(Some(CropOption::Quality(value)))
            }
            "format" => {
                let ext = require_args()?;
                OutputFormat::from_extension(ext)
                    .map(|f| Some(CropOption::Format(f)))
                    .ok_or_else(|| format!("unsupported format: {}", ext))
            }
            "quadrant" => {
                let code = require_args()?;
                Quadrant::parse(code)
                    .map(|q| Some(CropOption::Quadrant(q)))
                    .ok_or_else(|| format!("unknown quadrant: {}", code))
            }
            "pad" => {
                let parts: Vec<&str> = require_args()?.split(',').collect();
                if parts.len() != 3 {
                    return Err("pad expects r,g,b".to_string());
                }
                let mut rgb = [0u8; 3];
                for (slot, part) in rgb.iter_mut().zip(parts) {
                    *slot = part
                        .parse()
                        .map_err(|_| format!("invalid pad channel: {}", part))?;
                }
                Ok(Some(CropOption::Pad(rgb)))
            }
            "filters" => {
                let filters = require_args()?
                    .split(',')
                    .map(|f| Filter::parse(f).ok_or_else(|| format!("unknown filter: {}", f)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(CropOption::Filters(filters)))
            }
            _ => Ok(None),
        }
    }
}

impl fmt::Display for CropOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.args() {
            Some(args) => write!(f, "{}({})", self.name(), args),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Width, height and options describing a derived image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CropSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub options: Vec<CropOption>,
}

impl CropSpec {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        CropSpec {
            width,
            height,
            options: Vec::new(),
        }
    }

    /// Add an option, replacing any option of the same name in place.
    pub fn with_option(mut self, option: CropOption) -> Self {
        match self.options.iter().position(|o| o.name() == option.name()) {
            Some(idx) => self.options[idx] = option,
            None => self.options.push(option),
        }
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name() == name)
    }

    /// No dimensions and no options.
    pub fn is_trivial(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.options.is_empty()
    }

    /// Whether rendering must hand back the source bytes untouched.
    pub fn is_passthrough(&self) -> bool {
        self.is_trivial() || self.has("original")
    }

    pub fn quality(&self) -> Option<u8> {
        self.options.iter().find_map(|o| match o {
            CropOption::Quality(q) => Some(*q),
            _ => None,
        })
    }

    pub fn filters(&self) -> &[Filter] {
        self.options
            .iter()
            .find_map(|o| match o {
                CropOption::Filters(f) => Some(f.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Resize mode requested by the options, if any.
    ///
    /// `resize`, `crop` and `pad` are mutually exclusive. Without any of them,
    /// a box with both sides set is filled (`crop`).
    pub fn resize_mode(&self) -> Result<ResizeMode, CropError> {
        let quadrant = self
            .options
            .iter()
            .find_map(|o| match o {
                CropOption::Quadrant(q) => Some(*q),
                _ => None,
            })
            .unwrap_or_default();

        let modes: Vec<ResizeMode> = self
            .options
            .iter()
            .filter_map(|o| match o {
                CropOption::Resize => Some(ResizeMode::Fit),
                CropOption::Crop => Some(ResizeMode::Fill(quadrant)),
                CropOption::Pad(rgb) => Some(ResizeMode::Pad(*rgb)),
                _ => None,
            })
            .collect();

        match modes.as_slice() {
            [] if self.width.is_some() && self.height.is_some() => Ok(ResizeMode::Fill(quadrant)),
            [] => Ok(ResizeMode::Fit),
            [mode] => Ok(*mode),
            _ => Err(CropError::InvalidSpec(
                "resize, crop and pad cannot be combined".to_string(),
            )),
        }
    }

    /// Format the artifact is encoded in, given the source extension.
    pub fn output_format(&self, source_extension: &str) -> OutputFormat {
        self.options
            .iter()
            .find_map(|o| match o {
                CropOption::Format(f) => Some(*f),
                _ => None,
            })
            .or_else(|| OutputFormat::from_extension(source_extension))
            .unwrap_or(OutputFormat::Jpeg)
    }

    /// Extension of the rendered artifact, used for its content type.
    pub fn output_extension<'a>(&self, source_extension: &'a str) -> &'a str {
        if self.is_passthrough() {
            return source_extension;
        }
        match self.options.iter().find_map(|o| match o {
            CropOption::Format(f) => Some(*f),
            _ => None,
        }) {
            Some(format) => format.extension(),
            None => source_extension,
        }
    }
}

/// Path of an original image, relative to the source disk root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef(String);

impl SourceRef {
    /// Validate and normalise a source path (leading slashes are dropped).
    pub fn parse(path: &str) -> Result<Self, CropError> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(CropError::InvalidPath("empty source path".to_string()));
        }
        if path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(CropError::InvalidPath(format!(
                "source path has an invalid segment: {}",
                path
            )));
        }
        if path.contains(['\\', '?', '#']) || path.chars().any(char::is_control) {
            return Err(CropError::InvalidPath(format!(
                "source path contains reserved characters: {}",
                path
            )));
        }

        let source = SourceRef(path.to_string());
        let ext = source.extension();
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CropError::InvalidPath(format!(
                "source path needs an image extension: {}",
                path
            )));
        }
        if source.file_stem().is_empty() {
            return Err(CropError::InvalidPath(format!(
                "source path has no file name: {}",
                path
            )));
        }
        Ok(source)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension without the dot (`jpg` for `photos/a.jpg`).
    pub fn extension(&self) -> &str {
        match self.file_name().rsplit_once('.') {
            Some((_, ext)) => ext,
            None => "",
        }
    }

    /// Path without the extension (`photos/a` for `photos/a.jpg`).
    pub fn stem(&self) -> &str {
        match self.0.rsplit_once('.') {
            Some((stem, _)) if !self.extension().is_empty() => stem,
            _ => &self.0,
        }
    }

    /// Directory part, without the trailing slash (empty at the root).
    pub fn directory(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        }
    }

    fn file_name(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.0,
        }
    }

    fn file_stem(&self) -> &str {
        match self.file_name().rsplit_once('.') {
            Some((stem, _)) => stem,
            None => self.file_name(),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relative path of a crop artifact; doubles as its storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedPath(String);

impl EncodedPath {
    pub(crate) fn new(path: String) -> Self {
        EncodedPath(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn extension(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
    }
}

impl fmt::Display for EncodedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
