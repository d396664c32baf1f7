//! Document ingestion: an uploaded file or the default data folder.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use tracing::{debug, info};

use crate::{
    config::RagConfig,
    errors::RagError,
    loader::{DocumentLoader, LoadSource},
    record::Document,
};

/// A file received from the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Loads documents from `upload`, or from `cfg.data_dir` when there is none.
///
/// An upload is written into a fresh scratch directory that is removed when
/// this call returns, whether loading succeeded or not.
///
/// # Errors
/// `RagError::Ingest` / `RagError::Io` for write or parse failures and for a
/// missing or empty data folder.
pub async fn load_data_from_upload(
    upload: Option<Upload>,
    cfg: &RagConfig,
    loader: Arc<dyn DocumentLoader>,
) -> Result<Vec<Document>, RagError> {
    let started = Instant::now();
    let from_upload = upload.is_some();

    let docs = match upload {
        Some(upload) => {
            let scratch_root = cfg.scratch_root.clone();
            tokio::task::spawn_blocking(move || {
                load_from_scratch(upload, scratch_root.as_deref(), loader.as_ref())
            })
            .await??
        }
        None => {
            let dir = cfg.data_dir.clone();
            debug!(dir = %dir.display(), "no upload, loading default folder");
            tokio::task::spawn_blocking(move || loader.load(&LoadSource::Dir(dir))).await??
        }
    };

    info!(
        from_upload,
        documents = docs.len(),
        chars = docs.iter().map(|d| d.text.len()).sum::<usize>(),
        elapsed_ms = started.elapsed().as_millis(),
        "documents loaded"
    );
    Ok(docs)
}

fn load_from_scratch(
    upload: Upload,
    scratch_root: Option<&Path>,
    loader: &dyn DocumentLoader,
) -> Result<Vec<Document>, RagError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("doc-qa-upload-");
    let tmpdir = match scratch_root {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };

    let path: PathBuf = tmpdir.path().join(sanitize_file_name(&upload.file_name));
    std::fs::write(&path, &upload.bytes).map_err(|e| RagError::ingest(&path, e.to_string()))?;
    debug!(path = %path.display(), bytes = upload.bytes.len(), "upload materialized");

    loader.load(&LoadSource::Files(vec![path]))
    // `tmpdir` drops here and removes the scratch directory.
}

/// Keeps only the final path component of a client-supplied name.
fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => "upload".to_string(),
        b => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FileLoader;
    use std::sync::Mutex;

    /// Delegates to [`FileLoader`] and remembers what it was asked to read.
    #[derive(Default)]
    struct RecordingLoader {
        seen: Mutex<Vec<LoadSource>>,
    }

    impl DocumentLoader for RecordingLoader {
        fn load(&self, source: &LoadSource) -> Result<Vec<Document>, RagError> {
            self.seen.lock().unwrap().push(source.clone());
            FileLoader.load(source)
        }
    }

    fn seen_file(loader: &RecordingLoader) -> PathBuf {
        match &loader.seen.lock().unwrap()[0] {
            LoadSource::Files(files) => files[0].clone(),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\sky.txt"), "sky.txt");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn upload_is_loaded_and_scratch_removed() {
        let scratch = tempfile::tempdir().unwrap();
        let cfg = RagConfig {
            scratch_root: Some(scratch.path().to_path_buf()),
            ..RagConfig::default()
        };
        let loader = Arc::new(RecordingLoader::default());
        let upload = Upload {
            file_name: "sky.txt".into(),
            bytes: b"The sky is blue.".to_vec(),
        };

        let docs = load_data_from_upload(Some(upload), &cfg, loader.clone())
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "The sky is blue.");
        assert_eq!(docs[0].metadata.file_name, "sky.txt");

        let written = seen_file(&loader);
        assert!(!written.exists());
        assert!(!written.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn scratch_removed_when_loading_fails() {
        let scratch = tempfile::tempdir().unwrap();
        let cfg = RagConfig {
            scratch_root: Some(scratch.path().to_path_buf()),
            ..RagConfig::default()
        };
        let loader = Arc::new(RecordingLoader::default());
        let upload = Upload {
            file_name: "broken.pdf".into(),
            bytes: b"not a pdf at all".to_vec(),
        };

        let err = load_data_from_upload(Some(upload), &cfg, loader.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Ingest { .. }));
        assert!(!seen_file(&loader).parent().unwrap().exists());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn no_upload_reads_default_folder() {
        let data = tempfile::tempdir().unwrap();
        std::fs::write(data.path().join("one.txt"), "first").unwrap();
        std::fs::write(data.path().join("two.txt"), "second").unwrap();
        let cfg = RagConfig {
            data_dir: data.path().to_path_buf(),
            ..RagConfig::default()
        };
        let loader = Arc::new(RecordingLoader::default());

        let docs = load_data_from_upload(None, &cfg, loader.clone()).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(
            loader.seen.lock().unwrap()[0],
            LoadSource::Dir(data.path().to_path_buf())
        );
    }
}
