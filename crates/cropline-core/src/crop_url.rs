//! Crop path codec
//!
//! Grammar of an encoded crop path (relative to the URL prefix):
//!
//! ```text
//! <source-stem>-<width>x<height>[-<option>[(<args>)]]*.<source-ext>
//! ```
//!
//! `width` and `height` are positive decimal integers, or `_` (blank is also
//! accepted when decoding) for "auto". The source stem is matched greedily, so
//! stems that themselves contain `-NxM` still decode to the right source.
//! Encoding is a pure function of its inputs; decoding is its left inverse.

use crate::config::CroplineConfig;
use crate::crop_spec::{CropOption, CropSpec, EncodedPath, SourceRef};
use crate::error::CropError;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CROP_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<source>.+)-(?P<width>\d+|_)?x(?P<height>\d+|_)?(?P<options>(?:-[a-z][a-z_]*(?:\([A-Za-z0-9,]*\))?)*)\.(?P<ext>[A-Za-z0-9]+)$",
    )
    .expect("crop path pattern is valid")
});

static CROP_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-(?P<name>[a-z][a-z_]*)(?:\((?P<args>[A-Za-z0-9,]*)\))?")
        .expect("crop option pattern is valid")
});

/// Characters escaped when a path is embedded in a URL; `/` stays literal.
pub const URL_PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Encodes crop specs into paths and back. Holds no secrets and performs no I/O.
#[derive(Debug, Clone)]
pub struct PathCodec {
    strict: bool,
    url_prefix: String,
    url_host: Option<String>,
}

impl Default for PathCodec {
    fn default() -> Self {
        PathCodec {
            strict: false,
            url_prefix: "/".to_string(),
            url_host: None,
        }
    }
}

impl PathCodec {
    pub fn new(config: &CroplineConfig) -> Self {
        PathCodec {
            strict: config.strict,
            url_prefix: config.url_prefix.clone(),
            url_host: config.url_host.clone(),
        }
    }

    /// Reject unknown option keys instead of ignoring them.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn with_url_host(mut self, host: Option<String>) -> Self {
        self.url_host = host;
        self
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Serialize a source and crop spec into an encoded path.
    pub fn encode(&self, source: &SourceRef, spec: &CropSpec) -> Result<EncodedPath, CropError> {
        if spec.width == Some(0) || spec.height == Some(0) {
            return Err(CropError::InvalidSpec(
                "width and height must be positive".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut options = String::new();
        for option in &spec.options {
            if !seen.insert(option.name()) {
                return Err(CropError::InvalidSpec(format!(
                    "option {} given more than once",
                    option.name()
                )));
            }
            if let CropOption::Filters(filters) = option {
                if filters.is_empty() {
                    return Err(CropError::InvalidSpec("filters needs at least one filter".to_string()));
                }
            }
            options.push('-');
            options.push_str(&option.to_string());
        }

        Ok(EncodedPath::new(format!(
            "{}-{}x{}{}.{}",
            source.stem(),
            dimension(spec.width),
            dimension(spec.height),
            options,
            source.extension()
        )))
    }

    /// Parse an encoded path back into its source and crop spec.
    pub fn decode(&self, path: &str) -> Result<(SourceRef, CropSpec), CropError> {
        decode_with(path, self.strict)
    }

    /// Decode leniently and report whether `path` derives from `source`.
    ///
    /// Used to find every crop of a source by listing its directory.
    pub fn is_crop_of(&self, path: &str, source: &SourceRef) -> bool {
        let Some(file_name) = path.rsplit('/').next() else {
            return false;
        };
        let source_stem = source.stem().rsplit('/').next().unwrap_or_default();
        if !file_name.starts_with(&format!("{}-", source_stem)) {
            return false;
        }
        matches!(decode_with(path, false), Ok((decoded, _)) if &decoded == source)
    }

    /// Turn a raw request path into the encoded path it addresses.
    ///
    /// Strips the leading slash and the configured URL prefix; a request
    /// outside the prefix is an invalid path.
    pub fn request_path(&self, raw: &str) -> Result<String, CropError> {
        let raw = raw.trim_start_matches('/');
        let prefix = self.url_prefix.trim_matches('/');
        if prefix.is_empty() {
            return Ok(raw.to_string());
        }
        raw.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string)
            .ok_or_else(|| CropError::InvalidPath("request outside url prefix".to_string()))
    }

    /// Reduce a URL or path previously handed out to its path relative to the prefix.
    ///
    /// Accepts `https://host/prefix/photos/a.jpg?x`, `/prefix/photos/a.jpg`
    /// or plain `photos/a.jpg`.
    pub fn relative_path(&self, url: &str) -> String {
        let without_scheme = match url.split_once("://") {
            Some((_, rest)) => rest.find('/').map(|idx| &rest[idx..]).unwrap_or(""),
            None => url,
        };
        let path = without_scheme
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        let trimmed = decoded.trim_start_matches('/');

        let prefix = self.url_prefix.trim_matches('/');
        let relative = if prefix.is_empty() {
            trimmed
        } else {
            trimmed
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(trimmed)
        };
        relative.to_string()
    }

    /// Public URL for an encoded path, with the token appended when given.
    pub fn url_for(&self, path: &EncodedPath, token: Option<&str>) -> String {
        let mut url = String::new();
        if let Some(host) = &self.url_host {
            url.push_str(host.trim_end_matches('/'));
        }
        url.push('/');
        let prefix = self.url_prefix.trim_matches('/');
        if !prefix.is_empty() {
            url.push_str(prefix);
            url.push('/');
        }
        url.extend(utf8_percent_encode(path.as_str(), URL_PATH_ENCODE_SET));
        if let Some(token) = token {
            url.push_str("?token=");
            url.push_str(token);
        }
        url
    }
}

fn dimension(value: Option<u32>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "_".to_string(),
    }
}

fn parse_dimension(raw: Option<&str>) -> Result<Option<u32>, CropError> {
    match raw {
        None | Some("_") | Some("") => Ok(None),
        Some(digits) => match digits.parse::<u32>() {
            Ok(0) => Err(CropError::InvalidPath("dimension must be positive".to_string())),
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(CropError::InvalidPath(format!(
                "dimension out of range: {}",
                digits
            ))),
        },
    }
}

fn decode_with(path: &str, strict: bool) -> Result<(SourceRef, CropSpec), CropError> {
    let path = path.trim_start_matches('/');
    let caps = CROP_PATH
        .captures(path)
        .ok_or_else(|| CropError::InvalidPath("path does not match crop grammar".to_string()))?;

    let width = parse_dimension(caps.name("width").map(|m| m.as_str()))?;
    let height = parse_dimension(caps.name("height").map(|m| m.as_str()))?;

    let mut spec = CropSpec::new(width, height);
    let mut seen = HashSet::new();
    let options = caps.name("options").map(|m| m.as_str()).unwrap_or_default();
    for option in CROP_OPTION.captures_iter(options) {
        let name = option.name("name").map(|m| m.as_str()).unwrap_or_default();
        let args = option.name("args").map(|m| m.as_str());

        if !seen.insert(name.to_string()) {
            return Err(CropError::InvalidPath(format!("duplicate option {}", name)));
        }

        match CropOption::parse(name, args) {
            Ok(Some(parsed)) => spec.options.push(parsed),
            Ok(None) if strict => {
                return Err(CropError::InvalidPath(format!("unknown option {}", name)));
            }
            Ok(None) => {
                tracing::debug!(option = %name, "Ignoring unknown crop option");
            }
            Err(reason) => return Err(CropError::InvalidPath(reason)),
        }
    }

    let source = format!(
        "{}.{}",
        caps.name("source").map(|m| m.as_str()).unwrap_or_default(),
        caps.name("ext").map(|m| m.as_str()).unwrap_or_default()
    );
    let source = SourceRef::parse(&source)?;

    Ok((source, spec))
}
