//! Deterministic mapping from remote URLs to local filesystem paths
//!
//! Pages land at their URL-path-derived location under the domain root;
//! sub-resources are routed into class-named subdirectories beneath a
//! shared `static/` directory. The same URL always resolves to the same
//! path within a run, which is what makes re-fetches and racing writers
//! safe (last write wins with identical bytes).

use std::io;
use std::path::{Path, PathBuf};

use url::Url;

/// Characters that are illegal in filesystem path segments on at least one
/// supported platform. They get substituted with `_`.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// The category of a sub-resource request, used to route it to a mirror
/// subdirectory and to decide whether the interceptor captures it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// A top-level or framed HTML document (never captured by the interceptor)
    Document,
    Stylesheet,
    Script,
    Image,
    Font,
    /// Audio/video and other media payloads
    Media,
    Xhr,
    Fetch,
    Other,
}

impl ResourceClass {
    /// Maps a renderer-declared resource type label to a class.
    ///
    /// Unknown labels fall back to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "document" => Self::Document,
            "stylesheet" => Self::Stylesheet,
            "script" => Self::Script,
            "image" => Self::Image,
            "font" => Self::Font,
            "media" => Self::Media,
            "xhr" => Self::Xhr,
            "fetch" => Self::Fetch,
            _ => Self::Other,
        }
    }

    /// Classifies by file extension, for URLs whose extension is more
    /// trustworthy than the declared type (e.g. a stylesheet loaded via
    /// fetch).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(Self::Stylesheet),
            "js" | "mjs" => Some(Self::Script),
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" | "ico" => Some(Self::Image),
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Some(Self::Font),
            "mp4" | "webm" | "ogg" | "mp3" | "wav" => Some(Self::Media),
            _ => None,
        }
    }

    /// Resolves the effective class for a resource URL: file extension
    /// first, then the class the renderer declared.
    pub fn classify(url: &Url, declared: ResourceClass) -> ResourceClass {
        extension_of(url)
            .and_then(|ext| Self::from_extension(&ext))
            .unwrap_or(declared)
    }

    /// The `static/` subdirectory this class is mirrored into
    pub fn subdir(&self) -> &'static str {
        match self {
            Self::Stylesheet => "css",
            Self::Script => "js",
            Self::Image | Self::Font | Self::Media => "media",
            Self::Document | Self::Xhr | Self::Fetch | Self::Other => "other",
        }
    }
}

/// Maps remote URLs to paths under `<output-root>/<domain>`
///
/// The mapping is a pure function of the URL and resource class; the only
/// side effect is idempotent creation of missing parent directories before
/// a path is returned.
#[derive(Debug, Clone)]
pub struct PathMapper {
    root: PathBuf,
}

impl PathMapper {
    /// Creates a mapper rooted at `<output_root>/<domain>`
    pub fn new(output_root: &Path, domain: &str) -> Self {
        Self {
            root: output_root.join(sanitize_segment(domain)),
        }
    }

    /// The domain root directory of the mirror
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the local path for a rendered HTML page
    ///
    /// - An empty or `/`-terminated URL path gets `index.html` appended
    /// - A final segment with a file extension is used verbatim
    /// - A final segment without an extension is a client-side route and
    ///   gets an `.html` suffix
    /// - The query string is dropped: routes differing only in query
    ///   collide to the same file, last rendered wins
    pub fn page_path(&self, url: &Url) -> io::Result<PathBuf> {
        let path = url.path();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut rel = PathBuf::new();
        if segments.is_empty() || path.ends_with('/') {
            for seg in &segments {
                rel.push(sanitize_segment(seg));
            }
            rel.push("index.html");
        } else {
            let (last, parents) = segments
                .split_last()
                .expect("segments checked non-empty above");
            for seg in parents {
                rel.push(sanitize_segment(seg));
            }
            let name = sanitize_segment(last);
            if has_extension(last) {
                rel.push(name);
            } else {
                rel.push(format!("{name}.html"));
            }
        }

        let full = self.root.join(rel);
        ensure_parent(&full)?;
        Ok(full)
    }

    /// Resolves the local path for a captured sub-resource
    ///
    /// Resources live at `<domain-root>/static/<class-subdir>/<filename>`,
    /// where the filename is the sanitized final segment of the resource's
    /// URL path. Distinct URLs sharing a basename within one class collide
    /// by design (last write wins); see the crate docs for the collision
    /// policy.
    pub fn resource_path(&self, url: &Url, class: ResourceClass) -> io::Result<PathBuf> {
        let filename = url
            .path()
            .rsplit('/')
            .find(|s| !s.is_empty())
            .map(sanitize_segment)
            .unwrap_or_else(|| "resource".to_string());

        let full = self
            .root
            .join("static")
            .join(class.subdir())
            .join(filename);
        ensure_parent(&full)?;
        Ok(full)
    }
}

/// Creates the parent directory chain for a path. Already-existing
/// directories are not an error.
fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Substitutes filesystem-illegal characters within a path segment
fn sanitize_segment<S: AsRef<str>>(segment: S) -> String {
    segment
        .as_ref()
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// True if a URL path segment names a file with an extension
fn has_extension(segment: &str) -> bool {
    match segment.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && !ext.is_empty(),
        None => false,
    }
}

/// Extracts the file extension from a URL's path, if any
fn extension_of(url: &Url) -> Option<String> {
    let last = url.path().rsplit('/').next()?;
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_string()),
        _ => None,
    }
}
