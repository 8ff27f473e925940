//! In-memory user state for the current session.
//!
//! Holds the fetched profile, permissions, and avatar. Independent of
//! the session state: populated by a separate fetch after login and
//! cleared on logout, never persisted as-is.
//!
//! The avatar blob is materialized to a file in the data directory.
//! `AvatarHandle` owns that file and removes it on drop, so replacing
//! the avatar leaves exactly one live file behind.

// Allow dead code: accessor methods exercised by tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::UserProfile;

/// Subdirectory of the data directory holding materialized avatars
const AVATAR_DIR: &str = "avatars";

static AVATAR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Owning handle to a materialized avatar file.
#[derive(Debug)]
pub struct AvatarHandle {
    path: PathBuf,
    len: usize,
}

impl AvatarHandle {
    /// Write the blob to a fresh file under `data_dir/avatars`.
    pub fn materialize(data_dir: &Path, bytes: &[u8]) -> Result<Self> {
        let dir = data_dir.join(AVATAR_DIR);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create avatar directory {:?}", dir))?;

        let seq = AVATAR_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("avatar-{}-{}.bin", std::process::id(), seq));
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write avatar file {:?}", path))?;
        debug!(?path, len = bytes.len(), "Avatar materialized");

        Ok(Self {
            path,
            len: bytes.len(),
        })
    }

    /// Take ownership of an avatar file left behind by an unclean
    /// shutdown. Errors when the file no longer exists.
    pub fn adopt(path: PathBuf) -> Result<Self> {
        let meta = std::fs::metadata(&path)
            .with_context(|| format!("Avatar file {:?} is gone", path))?;
        debug!(?path, len = meta.len(), "Avatar adopted");
        Ok(Self {
            path,
            len: meta.len() as usize,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for AvatarHandle {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            // Already gone is fine; anything else is worth a log line
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, path = ?self.path, "Failed to release avatar file");
            }
        }
    }
}

#[derive(Default)]
pub struct UserState {
    profile: Option<UserProfile>,
    permissions: Vec<String>,
    avatar: Option<AvatarHandle>,
}

impl UserState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn avatar(&self) -> Option<&AvatarHandle> {
        self.avatar.as_ref()
    }

    /// Replace the profile and permissions after a `/users/me` fetch.
    pub fn update_user_info(&mut self, profile: UserProfile, permissions: Vec<String>) {
        self.profile = Some(profile);
        self.permissions = permissions;
    }

    /// Replace the avatar. The previous handle is dropped here, which
    /// releases its backing file.
    pub fn set_avatar(&mut self, handle: AvatarHandle) {
        self.avatar = Some(handle);
    }

    /// Drop everything on logout.
    pub fn clear(&mut self) {
        self.profile = None;
        self.permissions.clear();
        self.avatar = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::tests::scratch_dir;

    fn avatar_count(data_dir: &Path) -> usize {
        let dir = data_dir.join(AVATAR_DIR);
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn test_replacing_avatar_leaves_one_live_file() {
        let dir = scratch_dir("avatar-replace");
        let mut user = UserState::new();

        let first = AvatarHandle::materialize(&dir, b"blob-one").unwrap();
        let first_path = first.path().to_path_buf();
        user.set_avatar(first);
        assert_eq!(avatar_count(&dir), 1);

        let second = AvatarHandle::materialize(&dir, b"blob-two").unwrap();
        user.set_avatar(second);

        // Exactly one live file: the replacement released the first
        assert_eq!(avatar_count(&dir), 1);
        assert!(!first_path.exists());
        assert!(user.avatar().unwrap().path().exists());
        assert_eq!(user.avatar().unwrap().len(), b"blob-two".len());
    }

    #[test]
    fn test_adopt_takes_ownership_of_surviving_file() {
        let dir = scratch_dir("avatar-adopt");
        let orphan = AvatarHandle::materialize(&dir, b"blob").unwrap();
        let path = orphan.path().to_path_buf();
        // Leak the handle so the file outlives it, as after a crash
        std::mem::forget(orphan);
        assert!(path.exists());

        let adopted = AvatarHandle::adopt(path.clone()).unwrap();
        assert_eq!(adopted.len(), b"blob".len());
        drop(adopted);
        assert!(!path.exists());
    }

    #[test]
    fn test_adopt_missing_file_errors() {
        let dir = scratch_dir("avatar-adopt-missing");
        assert!(AvatarHandle::adopt(dir.join("gone.bin")).is_err());
    }

    #[test]
    fn test_clear_releases_avatar_and_profile() {
        let dir = scratch_dir("avatar-clear");
        let mut user = UserState::new();
        user.update_user_info(
            UserProfile {
                id: 1,
                username: "mrossi".into(),
                ..Default::default()
            },
            vec!["reports:read".into()],
        );
        user.set_avatar(AvatarHandle::materialize(&dir, b"blob").unwrap());

        user.clear();
        assert!(user.profile().is_none());
        assert!(user.permissions().is_empty());
        assert!(user.avatar().is_none());
        assert_eq!(avatar_count(&dir), 0);
    }
}
