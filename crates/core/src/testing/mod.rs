//! Testing utilities and mock implementations.
//!
//! The mock converter stands in for the external encoder so the whole
//! upload-to-result path can be exercised without ffmpeg.

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion, MOCK_OUTPUT};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;
    use std::path::Path;

    use crate::policy::MIB;
    use crate::worker::UploadDescriptor;

    /// Writes `content` to `dir/filename` and returns a descriptor claiming
    /// `size` bytes.
    ///
    /// The claimed size drives policy selection; the file itself can stay
    /// small.
    pub fn stored_upload(
        dir: &Path,
        filename: &str,
        content: &[u8],
        size: u64,
        mime_type: &str,
    ) -> std::io::Result<UploadDescriptor> {
        let path = dir.join(filename);
        std::fs::write(&path, content)?;
        Ok(UploadDescriptor {
            path,
            filename: filename.to_string(),
            size,
            mime_type: mime_type.to_string(),
            submitted_at: Utc::now(),
        })
    }

    /// A stored video upload of `mib` claimed MiB.
    pub fn video_upload(dir: &Path, filename: &str, mib: u64) -> std::io::Result<UploadDescriptor> {
        stored_upload(dir, filename, b"original video bytes", mib * MIB, "video/mp4")
    }
}
