//! Grouping of rerun artifacts by logical shard.
//!
//! A shard that was rerun leaves its results in a sibling directory with a
//! `-rerun` suffix:
//!
//! ```text
//! run/shard_2/device/test_result_0.xml
//! run/shard_2-rerun_1/device/test_result_0.xml
//! ```
//!
//! Both belong to the logical shard `shard_2`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

const SHARD_PREFIX: &str = "shard";
const RERUN_MARKER: &str = "-rerun";

/// Classification of one artifact path by its shard directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardToken {
    /// The original execution of a shard.
    Base(String),
    /// A repeated execution; holds the base shard's key.
    Rerun(String),
}

impl ShardToken {
    /// The normalized group key, shared by a shard and its reruns.
    pub fn key(&self) -> &str {
        match self {
            ShardToken::Base(key) | ShardToken::Rerun(key) => key,
        }
    }

    pub fn is_rerun(&self) -> bool {
        matches!(self, ShardToken::Rerun(_))
    }
}

/// Artifacts sharing one logical shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerunGroup {
    pub shard_key: String,
    pub paths: Vec<PathBuf>,
}

/// Classifies an artifact path.
///
/// Returns `None` for files without an `.xml` suffix and for paths with no
/// directory starting with `shard`. Directories are searched from the file
/// upwards, so an unrelated ancestor such as `/home/shardik` never wins over
/// the shard directory itself. When a device directory sits between the
/// shard directory and the file, it is part of the key, so each device of a
/// shard forms its own group.
///
/// ```
/// use gridreport::rerun::{classify, ShardToken};
/// use std::path::Path;
///
/// assert_eq!(
///     classify(Path::new("run/shard-2-rerun/x.xml")),
///     Some(ShardToken::Rerun("shard-2".into()))
/// );
/// assert_eq!(
///     classify(Path::new("run/shard-2/y.xml")),
///     Some(ShardToken::Base("shard-2".into()))
/// );
/// assert_eq!(
///     classify(Path::new("run/shard_0-rerun_1/Pixel2-30/test_result_0.xml")),
///     Some(ShardToken::Rerun("shard_0/Pixel2-30".into()))
/// );
/// assert_eq!(classify(Path::new("run/shard-2/logcat")), None);
/// ```
pub fn classify(path: &Path) -> Option<ShardToken> {
    if !path.to_string_lossy().ends_with(".xml") {
        return None;
    }

    let segments: Vec<_> = path
        .parent()?
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    let position = segments
        .iter()
        .rposition(|s| s.starts_with(SHARD_PREFIX))?;
    let segment = &segments[position];

    let (shard, rerun) = match segment.find(RERUN_MARKER) {
        Some(idx) => (&segment[..idx], true),
        None => (&segment[..], false),
    };
    let key = match segments.get(position + 1) {
        Some(device) => format!("{}/{}", shard, device),
        None => shard.to_string(),
    };

    Some(if rerun {
        ShardToken::Rerun(key)
    } else {
        ShardToken::Base(key)
    })
}

/// Groups artifact paths by logical shard.
///
/// Disabled grouping returns no groups. Group order follows the first
/// appearance of each key and paths keep their input order within a group.
/// Paths that do not classify are dropped.
pub fn group_reruns<P: AsRef<Path>>(paths: &[P], enabled: bool) -> Vec<RerunGroup> {
    if !enabled {
        return Vec::new();
    }

    let mut groups: Vec<RerunGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for path in paths {
        let path = path.as_ref();
        let Some(token) = classify(path) else {
            tracing::debug!("No shard directory in {}, skipping", path.display());
            continue;
        };

        match index.get(token.key()) {
            Some(&i) => groups[i].paths.push(path.to_path_buf()),
            None => {
                index.insert(token.key().to_string(), groups.len());
                groups.push(RerunGroup {
                    shard_key: token.key().to_string(),
                    paths: vec![path.to_path_buf()],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rerun_and_base_share_a_key() {
        let rerun = classify(Path::new("/tmp/run/shard-2-rerun/x.xml")).unwrap();
        let base = classify(Path::new("/tmp/run/shard-2/y.xml")).unwrap();
        let other = classify(Path::new("/tmp/run/shard-3/z.xml")).unwrap();

        assert!(rerun.is_rerun());
        assert!(!base.is_rerun());
        assert_eq!(rerun.key(), base.key());
        assert_ne!(base.key(), other.key());
    }

    #[test]
    fn test_numbered_rerun_directories() {
        let token = classify(Path::new("run/shard_0-rerun_3/Pixel2-30/test_result_0.xml")).unwrap();
        assert_eq!(token, ShardToken::Rerun("shard_0/Pixel2-30".into()));
    }

    #[test]
    fn test_classify_uses_nearest_shard_directory() {
        let token = classify(Path::new("/home/shardik/run/shard_5/device/test_result_0.xml")).unwrap();
        assert_eq!(token.key(), "shard_5/device");
    }

    #[test]
    fn test_classify_skips_non_xml_and_unsharded() {
        assert_eq!(classify(Path::new("run/shard_1/device/logcat")), None);
        assert_eq!(classify(Path::new("run/shard_1/device/result.xml.gz")), None);
        assert_eq!(classify(Path::new("run/device/test_result_0.xml")), None);
    }

    #[test]
    fn test_group_reruns_preserves_order() {
        let paths = [
            "run/shard-2/y.xml",
            "run/shard-3/z.xml",
            "run/shard-2-rerun/x.xml",
            "run/shard-2/notes.txt",
        ];

        let groups = group_reruns(&paths, true);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].shard_key, "shard-2");
        assert_eq!(
            groups[0].paths,
            vec![
                PathBuf::from("run/shard-2/y.xml"),
                PathBuf::from("run/shard-2-rerun/x.xml")
            ]
        );
        assert_eq!(groups[1].shard_key, "shard-3");
        assert!(
            groups
                .iter()
                .all(|g| g.paths.iter().all(|p| p.extension().is_some_and(|e| e == "xml")))
        );
    }

    #[test]
    fn test_devices_of_one_shard_group_separately() {
        let paths = [
            "run-1/shard_0/Pixel2-30/test_result_0.xml",
            "run-1/shard_0/Nexus-28/test_result_0.xml",
            "run-1/shard_0-rerun_1/Pixel2-30/test_result_0.xml",
        ];

        let groups = group_reruns(&paths, true);
        let keys: Vec<_> = groups.iter().map(|g| g.shard_key.as_str()).collect();
        assert_eq!(keys, vec!["shard_0/Pixel2-30", "shard_0/Nexus-28"]);
        assert_eq!(groups[0].paths.len(), 2);
        assert_eq!(groups[1].paths.len(), 1);
    }

    #[test]
    fn test_group_reruns_disabled_is_noop() {
        let paths = ["run/shard-2/y.xml", "run/shard-2-rerun/x.xml"];
        assert!(group_reruns(&paths, false).is_empty());
    }
}
