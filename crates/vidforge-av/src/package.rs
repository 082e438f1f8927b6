//! Output layout and packaging of the engine's result.
//!
//! A job produces either one file, or an HLS playlist plus segments that are
//! zipped into a single archive before delivery.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use vidforge_common::{Error, Result};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Playlist file name inside the segment directory.
pub const PLAYLIST_NAME: &str = "index.m3u8";

/// Segment naming pattern handed to the engine.
pub const SEGMENT_PATTERN: &str = "seg_%04d.ts";

/// Where the engine writes its output for one job.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLayout {
    /// A single file with a collision-free name.
    Single { path: PathBuf, container: String },
    /// A playlist and numbered segments in a dedicated directory.
    Segmented {
        dir: PathBuf,
        playlist: PathBuf,
        segment_template: PathBuf,
        archive: PathBuf,
    },
}

impl OutputLayout {
    /// `<work_dir>/out-<uuid>.<container>`.
    pub fn single(work_dir: &Path, container: &str) -> Self {
        let name = format!("out-{}.{container}", Uuid::new_v4().simple());
        OutputLayout::Single {
            path: work_dir.join(name),
            container: container.to_string(),
        }
    }

    /// `<work_dir>/hls-<id>/index.m3u8`, archived to `<work_dir>/hls_<id>.zip`.
    pub fn segmented(work_dir: &Path) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        let id = &id[..8];
        let dir = work_dir.join(format!("hls-{id}"));
        OutputLayout::Segmented {
            playlist: dir.join(PLAYLIST_NAME),
            segment_template: dir.join(SEGMENT_PATTERN),
            archive: work_dir.join(format!("hls_{id}.zip")),
            dir,
        }
    }

    pub fn is_segmented(&self) -> bool {
        matches!(self, OutputLayout::Segmented { .. })
    }

    /// The path given to the engine as its output.
    pub fn target(&self) -> &Path {
        match self {
            OutputLayout::Single { path, .. } => path,
            OutputLayout::Segmented { playlist, .. } => playlist,
        }
    }

    /// Create any directory the engine expects to exist.
    pub fn prepare(&self) -> Result<()> {
        if let OutputLayout::Segmented { dir, .. } = self {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Verify the engine output and turn it into a deliverable.
    ///
    /// Segmented output is archived on the blocking pool.
    pub async fn finish(self) -> Result<Deliverable> {
        match self {
            OutputLayout::Single { path, container } => {
                if !path.is_file() {
                    return Err(Error::package(format!(
                        "engine produced no output at {}",
                        path.display()
                    )));
                }
                let file_name = file_name_of(&path);
                Ok(Deliverable {
                    media_type: media_type(&container),
                    file_name,
                    path,
                })
            }
            OutputLayout::Segmented {
                dir,
                playlist,
                archive,
                ..
            } => {
                if !playlist.is_file() {
                    return Err(Error::package(format!(
                        "missing playlist {}",
                        playlist.display()
                    )));
                }
                let dest = archive.clone();
                let entries = tokio::task::spawn_blocking(move || archive_dir(&dir, &dest))
                    .await
                    .map_err(|e| Error::Internal(format!("archive task failed: {e}")))??;
                // Playlist plus at least one segment.
                if entries < 2 {
                    return Err(Error::package("engine produced no segments"));
                }
                tracing::debug!("Archived {entries} HLS files to {}", archive.display());

                let file_name = file_name_of(&archive);
                Ok(Deliverable {
                    media_type: media_type("zip"),
                    file_name,
                    path: archive,
                })
            }
        }
    }
}

/// A finished artifact ready to hand back to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Deliverable {
    pub path: PathBuf,
    pub media_type: &'static str,
    /// Suggested download name.
    pub file_name: String,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Zip every regular file under `src` into `dest`.
///
/// Entry names are relative to `src` with `/` separators. Returns the number
/// of files written.
pub fn archive_dir(src: &Path, dest: &Path) -> Result<usize> {
    let file = File::create(dest)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::package(format!("walking {}: {e}", src.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::package(e.to_string()))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name, options)
            .map_err(|e| Error::package(format!("zip entry: {e}")))?;
        let mut f = File::open(entry.path())?;
        io::copy(&mut f, &mut zip)?;
        count += 1;
    }

    zip.finish()
        .map_err(|e| Error::package(format!("finalizing {}: {e}", dest.display())))?;
    Ok(count)
}

/// MIME type for a container extension.
pub fn media_type(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "gif" => "image/gif",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "m3u8" => "application/vnd.apple.mpegurl",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
