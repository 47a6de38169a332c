use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;

use super::{move_file, UploadError, UploadErrorCode, UploadedFile};

/// What the receiving server reports about one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadDescriptor {
    /// Client file name.
    pub name: String,
    /// Client media type.
    #[serde(default, alias = "type")]
    pub media_type: String,
    /// Size in bytes, if the server reported one.
    #[serde(default)]
    pub size: Option<u64>,
    /// Where the server stored the file.
    pub tmp_name: PathBuf,
    #[serde(default)]
    pub error: UploadErrorCode,
}

/// An upload described by an [`UploadDescriptor`], read straight from disk.
///
/// # Examples
///
/// ```
/// use snapshot_http::upload::{TempFileUpload, UploadDescriptor, UploadErrorCode, UploadError};
///
/// let missing = UploadDescriptor {
///     name: "photo.jpg".into(),
///     media_type: "image/jpeg".into(),
///     size: Some(1024),
///     tmp_name: "/nonexistent/php1234".into(),
///     error: UploadErrorCode::Ok,
/// };
/// assert!(matches!(TempFileUpload::new(missing), Err(UploadError::NotFound(_))));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempFileUpload {
    descriptor: UploadDescriptor,
}

impl TempFileUpload {
    /// # Errors
    ///
    /// [`UploadError::NotFound`] if the upload succeeded but its temporary
    /// file does not exist.
    pub fn new(descriptor: UploadDescriptor) -> Result<Self, UploadError> {
        if descriptor.error.is_ok() && !descriptor.tmp_name.exists() {
            return Err(UploadError::NotFound(descriptor.name));
        }
        Ok(Self { descriptor })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn media_type(&self) -> &str {
        &self.descriptor.media_type
    }

    pub fn location(&self) -> &Path {
        &self.descriptor.tmp_name
    }

    pub fn descriptor(&self) -> &UploadDescriptor {
        &self.descriptor
    }
}

impl UploadedFile for TempFileUpload {
    fn size(&self) -> Option<u64> {
        self.descriptor.size
    }

    fn error(&self) -> UploadErrorCode {
        self.descriptor.error
    }

    fn client_filename(&self) -> Option<&str> {
        Some(&self.descriptor.name)
    }

    fn client_media_type(&self) -> Option<&str> {
        Some(&self.descriptor.media_type)
    }

    fn content(&self) -> Result<Bytes, UploadError> {
        Ok(fs::read(self.location())?.into())
    }

    fn move_to(&self, dir: &Path, name: &str) -> Result<Arc<dyn UploadedFile>, UploadError> {
        let target = dir.join(name);
        move_file(self.location(), &target)?;

        Ok(Arc::new(TempFileUpload {
            descriptor: UploadDescriptor {
                name: name.to_owned(),
                media_type: self.descriptor.media_type.clone(),
                size: self.descriptor.size,
                tmp_name: target,
                error: UploadErrorCode::Ok,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(tmp_name: PathBuf, error: UploadErrorCode) -> UploadDescriptor {
        UploadDescriptor {
            name: "report.pdf".into(),
            media_type: "application/pdf".into(),
            size: Some(7),
            tmp_name,
            error,
        }
    }

    #[test]
    fn missing_temp_file_is_rejected_only_for_successful_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");

        let err =
            TempFileUpload::new(descriptor(missing.clone(), UploadErrorCode::Ok)).unwrap_err();
        assert!(matches!(err, UploadError::NotFound(name) if name == "report.pdf"));

        let failed = TempFileUpload::new(descriptor(missing, UploadErrorCode::Partial)).unwrap();
        assert_eq!(failed.error(), UploadErrorCode::Partial);
    }

    #[test]
    fn reads_content_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("php123");
        fs::write(&tmp, b"%PDF-1.").unwrap();

        let upload = TempFileUpload::new(descriptor(tmp.clone(), UploadErrorCode::Ok)).unwrap();
        assert_eq!(upload.name(), "report.pdf");
        assert_eq!(upload.media_type(), "application/pdf");
        assert_eq!(upload.location(), tmp.as_path());
        assert_eq!(upload.size(), Some(7));
        assert_eq!(upload.client_filename(), Some("report.pdf"));
        assert_eq!(&upload.content().unwrap()[..], b"%PDF-1.");
    }

    #[test]
    fn move_returns_handle_at_destination() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("php456");
        fs::write(&tmp, b"content").unwrap();
        let dest = tempfile::tempdir().unwrap();

        let upload = TempFileUpload::new(descriptor(tmp.clone(), UploadErrorCode::Ok)).unwrap();
        let moved = upload.move_to(dest.path(), "final.pdf").unwrap();

        assert!(!tmp.exists());
        assert_eq!(moved.client_filename(), Some("final.pdf"));
        assert_eq!(moved.client_media_type(), Some("application/pdf"));
        assert_eq!(&moved.content().unwrap()[..], b"content");

        let again = upload.move_to(dest.path(), "twice.pdf").unwrap_err();
        assert!(matches!(again, UploadError::NotFound(_)));
    }

    #[test]
    fn deserialize_descriptor() {
        let json = r#"{
            "name": "a.txt", "type": "text/plain", "size": 3, "tmp_name": "/tmp/x", "error": 4
        }"#;
        let descriptor: UploadDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.media_type, "text/plain");
        assert_eq!(descriptor.error, UploadErrorCode::NoFile);
        assert_eq!(descriptor.tmp_name, PathBuf::from("/tmp/x"));
        assert_eq!(descriptor.size, Some(3));
    }

    #[test]
    fn null_or_missing_size_is_unknown() {
        let json = r#"{"name": "a.txt", "type": "text/plain", "size": null, "tmp_name": "/tmp/x"}"#;
        let descriptor: UploadDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.size, None);
        assert_eq!(descriptor.error, UploadErrorCode::Ok);

        let json = r#"{"name": "b.txt", "tmp_name": "/tmp/y", "error": 4}"#;
        let descriptor: UploadDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.size, None);

        let upload = TempFileUpload::new(descriptor).unwrap();
        assert_eq!(upload.size(), None);
    }
}
