//! Content source: random lines from the newline-delimited files in the
//! data directory (`quotes.txt`, `images.txt`, `gifs.txt`, `videos.txt`).

use rand::Rng;
use std::path::PathBuf;

/// Categories of stored content, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Quotes,
    Images,
    Gifs,
    Videos,
}

impl ContentCategory {
    pub fn file_name(self) -> &'static str {
        match self {
            ContentCategory::Quotes => "quotes.txt",
            ContentCategory::Images => "images.txt",
            ContentCategory::Gifs => "gifs.txt",
            ContentCategory::Videos => "videos.txt",
        }
    }
}

/// Media categories the responder can attach. Images and gifs ride in an
/// image attachment; videos need a preview and their own attachment shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Images,
    Gifs,
    Videos,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 3] =
        [MediaCategory::Images, MediaCategory::Gifs, MediaCategory::Videos];

    pub fn content_category(self) -> ContentCategory {
        match self {
            MediaCategory::Images => ContentCategory::Images,
            MediaCategory::Gifs => ContentCategory::Gifs,
            MediaCategory::Videos => ContentCategory::Videos,
        }
    }
}

/// Supplies one random entry from a category, or `None` when the category
/// is empty or unavailable.
pub trait ContentSource: Send + Sync {
    fn random_line(&self, category: ContentCategory) -> Option<String>;
}

/// File-backed content source rooted at the data directory.
#[derive(Debug, Clone)]
pub struct FileContentSource {
    data_dir: PathBuf,
}

impl FileContentSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl ContentSource for FileContentSource {
    fn random_line(&self, category: ContentCategory) -> Option<String> {
        let path = self.data_dir.join(category.file_name());
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                log::debug!("no content for {}: {}", path.display(), e);
                return None;
            }
        };
        let lines: Vec<&str> = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return None;
        }
        let pick = rand::rng().random_range(0..lines.len());
        Some(lines[pick].to_string())
    }
}
