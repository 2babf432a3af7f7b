use serde::{Deserialize, Serialize};

/// Metadata describing a processed, stored image.
///
/// Embedded into posts (cover image) and users (profile image). The file it
/// points at is owned by whichever document embeds the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub filename: String,
    pub original_name: String,
    /// Fully qualified public URL.
    pub url: String,
    /// Storage path on disk, relative to the working directory.
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    /// Size in bytes of the stored (re-encoded) file.
    pub size: u64,
    pub mime_type: String,
}

/// Which permanent directory an upload is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImagePurpose {
    PostImage,
    ProfilePicture,
}

impl ImagePurpose {
    pub const ALL: [ImagePurpose; 2] = [ImagePurpose::PostImage, ImagePurpose::ProfilePicture];

    /// Directory name under the upload root.
    pub fn dir_name(self) -> &'static str {
        match self {
            ImagePurpose::PostImage => "post-images",
            ImagePurpose::ProfilePicture => "profile-pictures",
        }
    }
}
