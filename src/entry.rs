use serde::Serialize;

/// A single matched filesystem entry, produced in object mode.
///
/// `path` is the finalized form chosen by the orchestrator: absolute or
/// relative per the `absolute` option, with a trailing directory mark when
/// `mark_directories` asked for one. `name` is the final path component.
///
/// Serialization flattens the dirent flags into the entry and omits `stats`
/// when it was not requested; timestamps are Unix seconds.
#[derive(Debug, Clone, Serialize)]
pub struct GlobEntry {
    /// Finalized path of the entry.
    pub path: String,

    /// The entry's basename.
    pub name: String,

    /// Kind flags, populated from a single type lookup.
    #[serde(flatten)]
    pub dirent: Option<Dirent>,

    /// Stat record, present only when the `stats` option is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<EntryStats>,
}

/// Kind flags for a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dirent {
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

impl Dirent {
    pub fn file() -> Self {
        Self {
            is_file: true,
            is_directory: false,
            is_symlink: false,
        }
    }

    pub fn directory() -> Self {
        Self {
            is_file: false,
            is_directory: true,
            is_symlink: false,
        }
    }

    pub fn symlink() -> Self {
        Self {
            is_file: false,
            is_directory: false,
            is_symlink: true,
        }
    }
}

/// Frozen result of a single stat call.
///
/// The owner-related fields are zero on platforms that do not expose them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryStats {
    pub size: u64,
    /// Last access time, Unix seconds.
    pub atime: u64,
    /// Last modification time, Unix seconds.
    pub mtime: u64,
    /// Metadata change time, Unix seconds.
    pub ctime: u64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub inode: u64,
    pub nlink: u64,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

impl EntryStats {
    /// Build a stats record from host metadata.
    pub(crate) fn from_metadata(meta: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        let (mode, uid, gid, inode, nlink, ctime) = {
            use std::os::unix::fs::MetadataExt;
            (
                meta.mode(),
                meta.uid(),
                meta.gid(),
                meta.ino(),
                meta.nlink(),
                meta.ctime().max(0) as u64,
            )
        };
        #[cfg(not(unix))]
        let (mode, uid, gid, inode, nlink, ctime) = (0u32, 0u32, 0u32, 0u64, 0u64, 0u64);

        Self {
            size: meta.len(),
            atime: unix_seconds(meta.accessed().ok()),
            mtime: unix_seconds(meta.modified().ok()),
            ctime,
            mode,
            uid,
            gid,
            inode,
            nlink,
            is_file: meta.is_file(),
            is_directory: meta.is_dir(),
            is_symlink: meta.file_type().is_symlink(),
        }
    }
}

fn unix_seconds(time: Option<std::time::SystemTime>) -> u64 {
    time.and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
