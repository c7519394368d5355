use chrono::{DateTime, Utc};

use regex::Regex;

use uuid::Uuid;

/// Largest decoded avatar accepted for upload
pub const MAX_AVATAR_BYTES: usize = 1024 * 1024;

const DEFAULT_FILE_NAME: &str = "avatar.jpg";

/// A decoded guest photo, ready to be written to object storage
#[derive(Debug)]
pub struct AvatarImage {
    bytes: Vec<u8>,
    object_path: String,
}

impl AvatarImage {
    /// Decode a base64 image and derive its storage path under the owning profile.
    /// Avatars are cropped and re-encoded as JPEG on the device before upload.
    pub fn decode(
        file_base64: &str,
        filename: &str,
        profile_id: Uuid,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        use base64::Engine;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(file_base64.trim())
            .map_err(|_| "Image is not valid base64".to_string())?;

        if bytes.is_empty() {
            return Err("Image cannot be empty".into());
        }
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err("Image too large after compression".into());
        }

        let object_path = format!(
            "profiles/{}/{}-{}",
            profile_id,
            uploaded_at.timestamp_millis(),
            safe_file_name(filename)
        );

        Ok(Self { bytes, object_path })
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    pub fn content_type(&self) -> &'static str {
        "image/jpeg"
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Lowercase, drop anything outside `[a-z0-9_.-]` and force a `.jpg` suffix
fn safe_file_name(filename: &str) -> String {
    lazy_static::lazy_static! {
        static ref UNSAFE_CHARS: Regex = Regex::new(r"[^a-z0-9_.-]").unwrap();
    }

    let name = UNSAFE_CHARS
        .replace_all(&filename.to_lowercase(), "")
        .into_owned();

    if name.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else if name.ends_with(".jpg") {
        name
    } else {
        format!("{}.jpg", name)
    }
}
