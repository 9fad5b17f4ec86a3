//! Positional decoding of artifact paths.

use std::path::{Component, Path};

use super::ArtifactError;

/// The named segments of an artifact path.
///
/// Below the root, the first three segments are the object (run folder),
/// shard and device; the file name is always the last segment. Construction
/// validates the depth, so the accessors never fail.
///
/// ```
/// use gridreport::artifact::ArtifactPath;
///
/// let path = ArtifactPath::parse("2024-05-01_10-00-00/shard_0/NexusLowRes-28-en-portrait/test_result_1.xml")?;
/// assert_eq!(path.object_name(), "2024-05-01_10-00-00");
/// assert_eq!(path.shard_name(), "shard_0");
/// assert_eq!(path.device_name(), "NexusLowRes-28-en-portrait");
/// assert_eq!(path.file_name(), "test_result_1.xml");
/// # Ok::<(), gridreport::artifact::ArtifactError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPath {
    file_name: String,
    object_name: String,
    shard_name: String,
    device_name: String,
}

impl ArtifactPath {
    /// Decodes `path` relative to `root`.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::MalformedPath`] if `path` is not below `root` or has
    /// fewer than three segments below it.
    pub fn decode(root: &Path, path: &Path) -> Result<Self, ArtifactError> {
        let malformed = || ArtifactError::MalformedPath {
            path: path.to_path_buf(),
        };

        let relative = path.strip_prefix(root).map_err(|_| malformed())?;
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Self::from_segments(segments).ok_or_else(malformed)
    }

    /// Decodes a slash-separated object path such as a storage key.
    pub fn parse(path: &str) -> Result<Self, ArtifactError> {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self::from_segments(segments).ok_or_else(|| ArtifactError::MalformedPath {
            path: path.into(),
        })
    }

    fn from_segments(mut segments: Vec<String>) -> Option<Self> {
        if segments.len() < 3 {
            return None;
        }
        let file_name = segments.last()?.clone();
        let mut leading = segments.drain(..3);
        Some(Self {
            object_name: leading.next()?,
            shard_name: leading.next()?,
            device_name: leading.next()?,
            file_name,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn shard_name(&self) -> &str {
        &self.shard_name
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// `<object>/<shard>`, the suffix stored matrix paths end with.
    pub fn matrix_path(&self) -> String {
        format!("{}/{}", self.object_name, self.shard_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_decode_relative_to_root() {
        let root = Path::new("/tmp/results");
        let path = root.join("2024-05-01_10-00-00/shard_3/Pixel2-30-en-portrait/test_result_0.xml");

        let decoded = ArtifactPath::decode(root, &path).unwrap();
        assert_eq!(decoded.object_name(), "2024-05-01_10-00-00");
        assert_eq!(decoded.shard_name(), "shard_3");
        assert_eq!(decoded.device_name(), "Pixel2-30-en-portrait");
        assert_eq!(decoded.file_name(), "test_result_0.xml");
        assert_eq!(decoded.matrix_path(), "2024-05-01_10-00-00/shard_3");
    }

    #[test]
    fn test_decode_reencodes_segments() {
        let root = PathBuf::from("results");
        let segments = ["run", "shard_1", "device", "nested", "test_result_7.xml"];
        let path = segments.iter().fold(root.clone(), |p, s| p.join(s));

        let decoded = ArtifactPath::decode(&root, &path).unwrap();
        assert_eq!(
            [
                decoded.object_name(),
                decoded.shard_name(),
                decoded.device_name(),
                decoded.file_name()
            ],
            ["run", "shard_1", "device", "test_result_7.xml"]
        );
        assert_eq!(decoded, ArtifactPath::decode(&root, &path).unwrap());
    }

    #[test]
    fn test_decode_three_segments_uses_file_as_device() {
        let decoded = ArtifactPath::parse("run/shard_0/test_result_0.xml").unwrap();
        assert_eq!(decoded.device_name(), "test_result_0.xml");
        assert_eq!(decoded.file_name(), "test_result_0.xml");
    }

    #[test]
    fn test_decode_too_short_is_malformed() {
        let root = Path::new("/tmp/results");
        let err = ArtifactPath::decode(root, &root.join("run/test_result_0.xml")).unwrap_err();
        assert!(matches!(err, ArtifactError::MalformedPath { .. }));

        assert!(ArtifactPath::parse("run/test_result_0.xml").is_err());
        assert!(ArtifactPath::parse("").is_err());
    }

    #[test]
    fn test_decode_outside_root_is_malformed() {
        let err = ArtifactPath::decode(
            Path::new("/tmp/results"),
            Path::new("/var/other/run/shard_0/device/test_result_0.xml"),
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::MalformedPath { .. }));
    }

    #[test]
    fn test_parse_ignores_redundant_slashes() {
        let decoded = ArtifactPath::parse("/run//shard_0/device/test_result_0.xml").unwrap();
        assert_eq!(decoded.object_name(), "run");
        assert_eq!(decoded.shard_name(), "shard_0");
    }
}
