//! Hardlink (or copy) materialization with preflight checks and atomic
//! finalization.
//!
//! Every destination is first staged under a hidden sibling name and then
//! renamed into place, so a reader of the destination directory never sees a
//! half-written file.

use crate::device::{DeviceProbe, FsDeviceProbe, is_unraid_share_mix};
use crate::error::{ErrorKind, Result};
use crate::models::{LinkAction, Method};
use crate::perms::Permissions;
use exn::{OptionExt, ResultExt};
use std::fs::{self, File, Metadata};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::instrument;

static STAGING_COUNTER: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Copy instead of failing when source and destination are on different
    /// devices.
    pub copy_fallback: bool,
    /// Replace a different file already at the destination.
    pub overwrite: bool,
    pub permissions: Permissions,
}
impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            copy_fallback: true,
            overwrite: false,
            permissions: Permissions::default(),
        }
    }
}

/// Materializes destinations from a read-only source tree.
#[derive(Debug, Clone)]
pub struct Linker<P = FsDeviceProbe> {
    options: LinkOptions,
    probe: P,
}
impl Linker<FsDeviceProbe> {
    pub fn new(options: LinkOptions) -> Self {
        Self::with_probe(options, FsDeviceProbe)
    }
}
impl<P: DeviceProbe> Linker<P> {
    pub fn with_probe(options: LinkOptions, probe: P) -> Self {
        Self { options, probe }
    }

    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    /// Link (or copy) `source` to `destination`.
    ///
    /// - A destination that already is the source's inode is a no-op
    ///   ([`LinkAction::AlreadyLinked`]).
    /// - A different existing file fails with
    ///   [`ErrorKind::DestinationConflict`] unless
    ///   [`overwrite`](LinkOptions::overwrite) is set.
    /// - Across devices the file is copied when
    ///   [`copy_fallback`](LinkOptions::copy_fallback) allows it, otherwise
    ///   this fails with [`ErrorKind::CrossDevice`].
    #[instrument(skip_all, fields(source = %source.display(), destination = %destination.display()))]
    pub fn materialize(&self, source: &Path, destination: &Path) -> Result<LinkAction> {
        let source_metadata = preflight_source(source)?;
        let parent = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_raise(|| ErrorKind::Filesystem(destination.to_path_buf()))?;

        let replace = match fs::symlink_metadata(destination) {
            Ok(existing) if same_inode(&source_metadata, &existing) => {
                tracing::info!("Destination is already linked to source");
                return Ok(LinkAction::AlreadyLinked(destination.to_path_buf()));
            },
            Ok(_) if !self.options.overwrite => {
                exn::bail!(ErrorKind::DestinationConflict(destination.to_path_buf()));
            },
            Ok(_) => true,
            Err(err) if err.kind() == IoErrorKind::NotFound => false,
            Err(err) => return Err(err).or_raise(|| ErrorKind::Filesystem(destination.to_path_buf())),
        };
        let method = self.choose_method(source, destination, parent)?;

        // Nothing is created or removed until every check above has passed.
        self.prepare_parent(parent)?;
        if replace {
            tracing::info!("Removing existing destination before replacing it");
            fs::remove_file(destination).or_raise(|| ErrorKind::Filesystem(destination.to_path_buf()))?;
        }

        let staging = staging_path(destination);
        let method = match self.stage(source, &staging, destination, method) {
            Ok(method) => method,
            Err(err) => {
                discard(&staging);
                return Err(err);
            },
        };
        if let Err(err) = fs::rename(&staging, destination) {
            discard(&staging);
            return Err(err).or_raise(|| ErrorKind::Filesystem(destination.to_path_buf()));
        }
        self.options.permissions.apply_to_file(destination);
        tracing::info!(%method, "Materialized destination");

        let path = destination.to_path_buf();
        Ok(match replace {
            true => LinkAction::Replaced { path, method },
            false => LinkAction::Created { path, method },
        })
    }

    fn prepare_parent(&self, parent: &Path) -> Result<()> {
        self.options
            .permissions
            .create_dir_all(parent)
            .or_raise(|| ErrorKind::Filesystem(parent.to_path_buf()))?;
        let metadata = fs::metadata(parent).or_raise(|| ErrorKind::Filesystem(parent.to_path_buf()))?;
        if !metadata.is_dir() || metadata.permissions().readonly() {
            tracing::error!(parent = %parent.display(), "Destination directory is not writable");
            exn::bail!(ErrorKind::Filesystem(parent.to_path_buf()));
        }
        Ok(())
    }

    fn choose_method(&self, source: &Path, destination: &Path, parent: &Path) -> Result<Method> {
        let cross_device = match is_unraid_share_mix(source, destination) {
            true => true,
            false => {
                let source_device =
                    self.probe.device_id(source).or_raise(|| ErrorKind::SourceUnavailable(source.to_path_buf()))?;
                // The destination folder may not exist yet; its nearest existing
                // ancestor is on the same device.
                let probed = existing_ancestor(parent);
                let destination_device =
                    self.probe.device_id(probed).or_raise(|| ErrorKind::Filesystem(parent.to_path_buf()))?;
                source_device != destination_device
            },
        };
        match (cross_device, self.options.copy_fallback) {
            (false, _) => Ok(Method::Hardlink),
            (true, true) => {
                tracing::warn!("Source and destination are on different devices; falling back to copy");
                Ok(Method::Copy)
            },
            (true, false) => exn::bail!(self.cross_device(source, destination)),
        }
    }

    /// Put the source at `staging`, returning the method actually used.
    fn stage(&self, source: &Path, staging: &Path, destination: &Path, method: Method) -> Result<Method> {
        if method == Method::Copy {
            return self.copy(source, staging, destination).map(|_| Method::Copy);
        }
        match self.probe.hard_link(source, staging) {
            Ok(()) => Ok(Method::Hardlink),
            Err(err) if err.kind() == IoErrorKind::CrossesDevices && self.options.copy_fallback => {
                tracing::warn!(error = %err, "Hardlink crossed devices; falling back to copy");
                self.copy(source, staging, destination).map(|_| Method::Copy)
            },
            Err(err) if err.kind() == IoErrorKind::CrossesDevices => Err(err)
                .or_raise(|| ErrorKind::Filesystem(staging.to_path_buf()))
                .or_raise(|| self.cross_device(source, destination)),
            Err(err) => Err(err).or_raise(|| ErrorKind::Filesystem(destination.to_path_buf())),
        }
    }

    fn copy(&self, source: &Path, staging: &Path, destination: &Path) -> Result<u64> {
        fs::copy(source, staging)
            .or_raise(|| ErrorKind::Filesystem(staging.to_path_buf()))
            .or_raise(|| self.cross_device(source, destination))
    }

    fn cross_device(&self, source: &Path, destination: &Path) -> ErrorKind {
        ErrorKind::CrossDevice {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
        }
    }
}

/// The source must exist, be a regular file and be readable.
fn preflight_source(source: &Path) -> Result<Metadata> {
    let metadata = fs::metadata(source).or_raise(|| ErrorKind::SourceUnavailable(source.to_path_buf()))?;
    if !metadata.is_file() {
        exn::bail!(ErrorKind::SourceUnavailable(source.to_path_buf()));
    }
    File::open(source).or_raise(|| ErrorKind::SourceUnavailable(source.to_path_buf()))?;
    Ok(metadata)
}

fn existing_ancestor(path: &Path) -> &Path {
    path.ancestors().find(|ancestor| ancestor.exists()).unwrap_or(path)
}

/// `.hardbound-<pid>-<seq>.<file>.part`, next to the destination.
fn staging_path(destination: &Path) -> PathBuf {
    let seq = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = destination.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    destination.with_file_name(format!(".hardbound-{}-{seq}.{file_name}.part", std::process::id()))
}

fn discard(staging: &Path) {
    match fs::remove_file(staging) {
        Ok(()) => tracing::debug!(path = %staging.display(), "Removed staging file"),
        Err(err) if err.kind() == IoErrorKind::NotFound => {},
        Err(err) => tracing::warn!(path = %staging.display(), error = %err, "Could not remove staging file"),
    }
}

#[cfg(unix)]
fn same_inode(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_inode(_: &Metadata, _: &Metadata) -> bool {
    false
}
