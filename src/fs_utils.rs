use crate::error::SupakeyError;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Create a new file holding secret material.
/// - Fails if the file already exists.
/// - Creates the file with 0o600 permissions on Unix.
/// - The parent may be reached through a symlink; it must resolve to a directory.
pub fn write_secret_file_secure(path: &Path, contents: &str) -> Result<(), SupakeyError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let meta = fs::metadata(parent)?;
        if !meta.is_dir() {
            return Err(SupakeyError::Io(io::Error::other(format!(
                "Parent is not a directory: {}",
                parent.display()
            ))));
        }
    }

    let mut options = OpenOptions::new();
    options.create_new(true).write(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    // On Windows the file gets default ACLs
    let mut file = options.open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            SupakeyError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Refusing to overwrite existing file: {}", path.display()),
            ))
        } else {
            SupakeyError::Io(e)
        }
    })?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Replace `path` with `contents` via a sibling temp file and a rename, so a
/// crash leaves either the old or the new file, never a truncated one.
/// The existing file's permissions are carried over. A symlinked `path` is
/// followed: its target is replaced and the link is left in place.
pub fn replace_file_atomic(path: &Path, contents: &str) -> Result<(), SupakeyError> {
    let path = resolve_symlink(path)?;
    let path = path.as_path();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;

    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| SupakeyError::Io(e.error))?;
    Ok(())
}

fn resolve_symlink(path: &Path) -> Result<PathBuf, SupakeyError> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Ok(fs::canonicalize(path)?),
        _ => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_secure_write_refuses_existing_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("secret");

        write_secret_file_secure(&path, "first").expect("first write");
        let err = write_secret_file_secure(&path, "second").unwrap_err();

        assert!(matches!(err, SupakeyError::Io(ref e) if e.kind() == io::ErrorKind::AlreadyExists));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_write_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("secret");
        write_secret_file_secure(&path, "value").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_atomic_replace_overwrites_and_leaves_no_temp_files() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join(".env.local");
        fs::write(&path, "OLD=1\n").unwrap();

        replace_file_atomic(&path, "NEW=2\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "NEW=2\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_replace_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join(".env.local");
        fs::write(&path, "A=1\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        replace_file_atomic(&path, "A=2\n").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_write_through_symlinked_directory() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_secret_file_secure(&link.join("secret"), "value").unwrap();

        assert_eq!(fs::read_to_string(real.join("secret")).unwrap(), "value");
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_replace_follows_symlinked_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let shared = dir.path().join("shared");
        fs::create_dir(&shared).unwrap();
        let target = shared.join("env.shared");
        fs::write(&target, "OLD=1\n").unwrap();
        let link = dir.path().join(".env.local");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        replace_file_atomic(&link, "NEW=2\n").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target).unwrap(), "NEW=2\n");
        assert_eq!(fs::read_to_string(&link).unwrap(), "NEW=2\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
        assert_eq!(fs::read_dir(&shared).unwrap().count(), 1);
    }
}
