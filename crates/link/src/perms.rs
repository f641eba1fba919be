use std::io;
use std::path::{Path, PathBuf};

/// Mode and ownership applied to newly materialized files and directories.
///
/// Application is best-effort: failures are logged and never abort a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub file_mode: Option<u32>,
    pub dir_mode: Option<u32>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}
impl Permissions {
    pub fn is_empty(&self) -> bool {
        self.file_mode.is_none() && self.dir_mode.is_none() && self.uid.is_none() && self.gid.is_none()
    }

    pub(crate) fn apply_to_file(&self, path: &Path) {
        self.apply(path, self.file_mode);
    }

    pub(crate) fn apply_to_dir(&self, path: &Path) {
        self.apply(path, self.dir_mode);
    }

    /// Create `dir` and any missing ancestors, applying the directory mode and
    /// ownership to each directory that did not exist before.
    pub(crate) fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        let missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !ancestor.exists())
            .map(Path::to_path_buf)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(dir)?;
        tracing::debug!(path = %dir.display(), created = missing.len(), "Created destination directories");
        for created in missing.iter().rev() {
            self.apply_to_dir(created);
        }
        Ok(())
    }

    #[cfg(unix)]
    fn apply(&self, path: &Path, mode: Option<u32>) {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode
            && let Err(err) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        {
            tracing::warn!(path = %path.display(), mode = %format!("{mode:o}"), error = %err, "Could not set mode");
        }
        if (self.uid.is_some() || self.gid.is_some())
            && let Err(err) = std::os::unix::fs::chown(path, self.uid, self.gid)
        {
            tracing::warn!(path = %path.display(), uid = ?self.uid, gid = ?self.gid, error = %err, "Could not set ownership");
        }
    }

    #[cfg(not(unix))]
    fn apply(&self, path: &Path, mode: Option<u32>) {
        if mode.is_some() || self.uid.is_some() || self.gid.is_some() {
            tracing::warn!(path = %path.display(), "Mode and ownership are only supported on unix; skipping");
        }
    }
}
