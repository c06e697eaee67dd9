use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Transformation segment that asks the CDN for a PNG of the first page.
const PREVIEW_TRANSFORMATION: &str = "/upload/pg_1,f_png/";

/// Placeholder for the object key in a preview URL template.
pub const KEY_PLACEHOLDER: &str = "{key}";

/// How the first-page preview image URL is derived for an uploaded resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewRule {
    /// The public URL is served by an image CDN with an `/upload/` segment;
    /// see [`derive_preview_url`].
    CdnTransform,
    /// `{key}` in the template is replaced by the object key, for buckets
    /// fronted by a separate image-rendering service.
    Template(String),
}

impl PreviewRule {
    pub fn preview_url(&self, key: &str, resume_url: &str) -> String {
        match self {
            PreviewRule::CdnTransform => derive_preview_url(resume_url),
            PreviewRule::Template(template) => template.replace(KEY_PLACEHOLDER, key),
        }
    }
}

/// Object storage for the original resume files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores the object and returns its public URL.
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, AppError>;

    /// URL of the first-page preview image for an object stored under `key`.
    fn preview_url(&self, key: &str, resume_url: &str) -> String;
}

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
    preview: PreviewRule,
}

impl S3Storage {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: String,
        public_base_url: String,
        preview: PreviewRule,
    ) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
            preview,
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl FileStorage for S3Storage {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload failed: {e}")))?;

        info!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(self.public_url(key))
    }

    fn preview_url(&self, key: &str, resume_url: &str) -> String {
        self.preview.preview_url(key, resume_url)
    }
}

/// Object key for a new upload: `resumes/<uuid>_<file name>`.
pub fn resume_object_key(file_name: &str) -> String {
    format!("resumes/{}_{}", Uuid::new_v4(), sanitize_file_name(file_name))
}

fn sanitize_file_name(name: &str) -> String {
    // browsers may send a full client-side path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "resume".to_string()
    } else {
        cleaned
    }
}

/// Preview image URL for an uploaded resume, by inserting the first-page
/// PNG transformation after `/upload/`. URLs without that segment are returned unchanged.
pub fn derive_preview_url(resume_url: &str) -> String {
    resume_url.replace("/upload/", PREVIEW_TRANSFORMATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_preview_url_inserts_transformation() {
        let url = "https://res.cdn.test/demo/upload/resumes/abc_cv.pdf";
        assert_eq!(
            derive_preview_url(url),
            "https://res.cdn.test/demo/upload/pg_1,f_png/resumes/abc_cv.pdf"
        );
    }

    #[test]
    fn test_derive_preview_url_without_upload_segment_is_unchanged() {
        let url = "https://bucket.s3.amazonaws.com/resumes/abc_cv.pdf";
        assert_eq!(derive_preview_url(url), url);
    }

    #[test]
    fn test_template_rule_substitutes_object_key() {
        let key = resume_object_key("cv.pdf");
        let resume = format!("https://bucket.s3.us-east-1.amazonaws.com/{key}");
        let rule = PreviewRule::Template("https://img.example.com/pg_1,f_png/{key}".to_string());

        let preview = rule.preview_url(&key, &resume);

        assert_ne!(preview, resume);
        assert_eq!(preview, format!("https://img.example.com/pg_1,f_png/{key}"));
    }

    #[test]
    fn test_cdn_rule_rewrites_upload_segment() {
        let key = "resumes/abc_cv.pdf";
        let resume = format!("https://res.cdn.test/demo/upload/{key}");
        assert_eq!(
            PreviewRule::CdnTransform.preview_url(key, &resume),
            derive_preview_url(&resume)
        );
    }

    #[test]
    fn test_resume_object_key_shape() {
        let key = resume_object_key("My CV (final).pdf");
        assert!(key.starts_with("resumes/"));
        assert!(key.ends_with("_My_CV__final_.pdf"));
    }

    #[test]
    fn test_sanitize_strips_client_path() {
        assert_eq!(sanitize_file_name("C:\\Users\\me\\cv.pdf"), "cv.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(""), "resume");
        assert_eq!(sanitize_file_name(".."), "resume");
    }
}
