use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path};

/// Reports which filesystem device a path lives on.
///
/// Hardlinks only work within one device, so the [`Linker`](crate::Linker)
/// asks a probe before deciding between linking and copying.
pub trait DeviceProbe: Send + Sync {
    fn device_id(&self, path: &Path) -> io::Result<u64>;

    /// Create `link` as a hard link to `original`. Fails with
    /// [`io::ErrorKind::CrossesDevices`] when the filesystem refuses to link
    /// across devices.
    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::fs::hard_link(original, link)
    }
}

/// Probes the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDeviceProbe;

impl DeviceProbe for FsDeviceProbe {
    #[cfg(unix)]
    fn device_id(&self, path: &Path) -> io::Result<u64> {
        use std::os::unix::fs::MetadataExt;
        Ok(std::fs::metadata(path)?.dev())
    }

    #[cfg(not(unix))]
    fn device_id(&self, path: &Path) -> io::Result<u64> {
        std::fs::metadata(path).map(|_| 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnraidShare {
    /// The FUSE union of all disks: `/mnt/user`, `/mnt/user0`.
    User,
    /// A single array or pool disk: `/mnt/disk1`, `/mnt/cache`.
    Disk,
}

fn unraid_share(path: &Path) -> Option<UnraidShare> {
    let mut components = path.components();
    if components.next() != Some(Component::RootDir) {
        return None;
    }
    if components.next() != Some(Component::Normal(OsStr::new("mnt"))) {
        return None;
    }
    let share = components.next()?.as_os_str().to_str()?;
    match share {
        "user" | "user0" => Some(UnraidShare::User),
        s if s.starts_with("disk") || s.starts_with("cache") => Some(UnraidShare::Disk),
        _ => None,
    }
}

/// Whether one path is on the Unraid user share and the other on a disk
/// share. Both report the same device id through FUSE but cannot be linked.
pub fn is_unraid_share_mix(a: &Path, b: &Path) -> bool {
    matches!(
        (unraid_share(a), unraid_share(b)),
        (Some(UnraidShare::User), Some(UnraidShare::Disk)) | (Some(UnraidShare::Disk), Some(UnraidShare::User))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/mnt/user/media/a.m4b", "/mnt/disk1/torrents/a.m4b", true)]
    #[case("/mnt/disk2/media/a.m4b", "/mnt/user0/torrents", true)]
    #[case("/mnt/cache/media/a.m4b", "/mnt/user/torrents", true)]
    #[case("/mnt/user/media/a.m4b", "/mnt/user/torrents/a.m4b", false)]
    #[case("/mnt/disk1/media/a.m4b", "/mnt/disk1/torrents/a.m4b", false)]
    #[case("/data/media/a.m4b", "/mnt/user/torrents/a.m4b", false)]
    #[case("mnt/user/a", "/mnt/disk1/a", false)]
    fn test_is_unraid_share_mix(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(is_unraid_share_mix(Path::new(a), Path::new(b)), expected);
    }

    #[test]
    fn test_fs_probe_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a");
        std::fs::write(&file, b"x").unwrap();
        let probe = FsDeviceProbe;
        assert_eq!(probe.device_id(dir.path()).unwrap(), probe.device_id(&file).unwrap());
        assert!(probe.device_id(&dir.path().join("missing")).is_err());
    }
}
