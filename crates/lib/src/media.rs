//! Media utilities: bulk-download the media lists to local files, and
//! upload images to the GroupMe image service.

use crate::content::MediaCategory;
use crate::groupme::GroupmeClient;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Per-category outcome of a bulk download.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl MediaCategory {
    fn folder_name(self) -> &'static str {
        match self {
            MediaCategory::Images => "Images",
            MediaCategory::Gifs => "GIFs",
            MediaCategory::Videos => "Videos",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            MediaCategory::Images => "jpg",
            MediaCategory::Gifs => "gif",
            MediaCategory::Videos => "mp4",
        }
    }
}

fn read_url_list(path: &Path) -> Vec<String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("no media list at {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Download every listed media URL into `out_dir/<Folder>/<nnnn>.<ext>`,
/// skipping files that already exist. Failures are logged per file.
pub async fn download_all(
    data_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<(MediaCategory, DownloadSummary)>> {
    let client = reqwest::Client::new();
    let mut summaries = Vec::new();

    for category in MediaCategory::ALL {
        let list_path = data_dir.join(category.content_category().file_name());
        let urls = read_url_list(&list_path);
        log::info!(
            "{}: {} urls listed in {}",
            category.folder_name(),
            urls.len(),
            list_path.display()
        );

        let folder = out_dir.join(category.folder_name());
        tokio::fs::create_dir_all(&folder)
            .await
            .with_context(|| format!("creating {}", folder.display()))?;

        let mut summary = DownloadSummary::default();
        for (i, url) in urls.iter().enumerate() {
            let file_path = folder.join(format!("{:04}.{}", i + 1, category.extension()));
            if file_path.exists() {
                summary.skipped += 1;
                continue;
            }
            match download_one(&client, url, &file_path).await {
                Ok(()) => summary.downloaded += 1,
                Err(e) => {
                    log::warn!("downloading {} failed: {}", url, e);
                    summary.failed += 1;
                }
            }
        }
        log::info!(
            "{}: {} downloaded, {} skipped, {} failed",
            category.folder_name(),
            summary.downloaded,
            summary.skipped,
            summary.failed
        );
        summaries.push((category, summary));
    }

    Ok(summaries)
}

async fn download_one(client: &reqwest::Client, url: &str, path: &Path) -> Result<()> {
    let res = client.get(url).send().await?.error_for_status()?;
    let bytes = res.bytes().await?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Upload a single image file (or every file in a directory) to the image
/// service and append the hosted URLs to `list_file`. Returns the uploaded
/// URLs in order.
pub async fn upload_images(
    client: &GroupmeClient,
    path: &Path,
    list_file: &Path,
) -> Result<Vec<String>> {
    let files: Vec<PathBuf> = if path.is_dir() {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
            .with_context(|| format!("reading {}", path.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        entries.sort();
        entries
    } else {
        vec![path.to_path_buf()]
    };

    let mut urls = Vec::new();
    for file in &files {
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        match client.upload_image(bytes).await {
            Ok(url) => {
                log::info!("uploaded {} -> {}", file.display(), url);
                urls.push(url);
            }
            Err(e) => log::warn!("uploading {} failed: {}", file.display(), e),
        }
    }

    if !urls.is_empty() {
        let mut appended = urls.join("\n");
        appended.push('\n');
        let existing = tokio::fs::read_to_string(list_file).await.unwrap_or_default();
        let combined = if existing.is_empty() || existing.ends_with('\n') {
            format!("{}{}", existing, appended)
        } else {
            format!("{}\n{}", existing, appended)
        };
        tokio::fs::write(list_file, combined)
            .await
            .with_context(|| format!("updating {}", list_file.display()))?;
    }

    Ok(urls)
}
