use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;

/// Scratch directory for unpacked artifacts, removed on drop so a failed run
/// leaves nothing behind next to the downloaded archives.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create(parent: &Path) -> Result<Self> {
        crate::util::ensure_dir(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(".extract-")
            .tempdir_in(parent)
            .with_context(|| format!("create scratch dir in {}", parent.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

pub fn unpack_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut zip =
        zip::ZipArchive::new(file).with_context(|| format!("read zip {}", archive.display()))?;
    zip.extract(dest)
        .with_context(|| format!("extract {} to {}", archive.display(), dest.display()))
}

pub fn unpack_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
    tar.unpack(dest)
        .with_context(|| format!("extract {} to {}", archive.display(), dest.display()))
}
