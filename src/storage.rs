//! # Upload and Artifact Storage
//!
//! Files live in two flat directories on local disk. Nothing is ever
//! cleaned up, and concurrent requests that upload the same filename
//! overwrite each other's files.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    config::StorageConfig,
    error::{Result, StorageError},
    imaging::ALLOWED_EXTENSIONS,
};

/// URL prefix the upload directory is served under
pub const UPLOADS_ROUTE: &str = "/static/uploads";

/// URL prefix the generated directory is served under
pub const GENERATED_ROUTE: &str = "/static/generated";

/// Check whether a client filename carries an accepted image extension
pub fn is_allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, extension)) => {
            let extension = extension.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&extension.as_str())
        }
        None => false,
    }
}

/// Reduce a client-supplied filename to a safe, flat ASCII name
///
/// Non-ASCII characters are dropped, path separators become whitespace,
/// whitespace runs collapse to `_`, anything outside `[A-Za-z0-9_.-]` is
/// removed and leading/trailing dots and underscores are stripped. The
/// result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Filename for a generated artifact, `generated_<style>_<filename>`
///
/// `filename` must already be sanitized; the style segment is sanitized here
/// because custom style names come straight from the request.
pub fn generated_name(style: &str, filename: &str) -> String {
    format!("generated_{}_{}", secure_filename(style), filename)
}

/// Join a public base URL with a route prefix and file name
pub fn public_url(base_url: &str, route: &str, name: &str) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), route, name)
}

/// Flat on-disk store for uploads and generated images
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    upload_dir: PathBuf,
    generated_dir: PathBuf,
}

impl ArtifactStore {
    /// Point a store at two directories without touching the filesystem
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(upload_dir: P, generated_dir: Q) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            generated_dir: generated_dir.into(),
        }
    }

    /// Create the store, making sure both directories exist
    pub fn open<P: Into<PathBuf>, Q: Into<PathBuf>>(upload_dir: P, generated_dir: Q) -> Result<Self> {
        let store = Self::new(upload_dir, generated_dir);
        create_dir(&store.upload_dir)?;
        create_dir(&store.generated_dir)?;
        Ok(store)
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::open(&config.upload_dir, &config.generated_dir)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn generated_dir(&self) -> &Path {
        &self.generated_dir
    }

    /// Write the raw upload under its sanitized name
    pub async fn save_upload(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        write_file(self.upload_dir.join(filename), bytes).await
    }

    /// Write an encoded artifact into the generated directory
    pub async fn save_generated(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        write_file(self.generated_dir.join(name), bytes).await
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| {
        StorageError::CreateDirFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

async fn write_file(path: PathBuf, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| StorageError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_allowed_extensions() {
        assert!(is_allowed_file("portrait.png"));
        assert!(is_allowed_file("portrait.JPG"));
        assert!(is_allowed_file("portrait.final.jpeg"));
        assert!(!is_allowed_file("portrait.gif"));
        assert!(!is_allowed_file("portrait.png.exe"));
        assert!(!is_allowed_file("png"));
        assert!(!is_allowed_file(""));
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("i contain cool \u{fc}ml\u{e4}uts.txt"), "i_contain_cool_mluts.txt");
        assert_eq!(secure_filename("..\\windows\\me.png"), "windows_me.png");
        assert_eq!(secure_filename("  __.hidden.png"), "hidden.png");
        assert_eq!(secure_filename("\u{65e5}\u{672c}"), "");
    }

    #[test]
    fn test_generated_name_sanitizes_style() {
        assert_eq!(generated_name("anime", "me.png"), "generated_anime_me.png");
        assert_eq!(generated_name("../evil", "me.png"), "generated_evil_me.png");
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("http://localhost:5000/", GENERATED_ROUTE, "generated_anime_me.png"),
            "http://localhost:5000/static/generated/generated_anime_me.png"
        );
    }

    #[test]
    fn test_new_does_not_create_directories() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("up"), dir.path().join("gen"));
        assert_eq!(store.upload_dir(), dir.path().join("up"));
        assert!(!store.upload_dir().exists());
        assert!(!store.generated_dir().exists());
    }

    #[tokio::test]
    async fn test_store_writes_files() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("up"), dir.path().join("gen")).unwrap();
        assert!(store.upload_dir().is_dir());
        assert!(store.generated_dir().is_dir());

        let upload = store.save_upload("me.png", b"raw").await.unwrap();
        assert_eq!(std::fs::read(upload).unwrap(), b"raw");

        let generated = store
            .save_generated("generated_real_me.png", b"out")
            .await
            .unwrap();
        assert_eq!(generated, dir.path().join("gen").join("generated_real_me.png"));
        assert_eq!(std::fs::read(generated).unwrap(), b"out");
    }
}
