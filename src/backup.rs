use crate::display::print_info;
use crate::error::SupakeyError;
use crate::fs_utils::write_secret_file_secure;
use chrono::Utc;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Copy the env file to `<name>.backup.<unix seconds>` beside it.
///
/// Nothing is written when the env file is missing. An existing backup with
/// the same timestamp is never overwritten; the run fails instead.
pub fn create_backup(env_file: &Path) -> Result<PathBuf, SupakeyError> {
    let content = fs::read_to_string(env_file).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            SupakeyError::EnvFileNotFound(env_file.to_path_buf())
        } else {
            SupakeyError::Io(e)
        }
    })?;

    let backup = backup_path(env_file, Utc::now().timestamp());
    write_secret_file_secure(&backup, &content)?;

    print_info(&format!("💾 Created backup: {}", backup.display()));
    Ok(backup)
}

pub fn backup_path(env_file: &Path, timestamp: i64) -> PathBuf {
    let mut name = env_file
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(".env.local"));
    name.push(format!(".backup.{}", timestamp));
    env_file.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_appends_timestamp() {
        let path = backup_path(Path::new("/work/app/.env.local"), 1_700_000_000);
        assert_eq!(path, PathBuf::from("/work/app/.env.local.backup.1700000000"));
    }

    #[test]
    fn test_backup_copies_content_verbatim() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let env_file = dir.path().join(".env.local");
        let original = "A=1\r\nNEXT_PUBLIC_SUPABASE_ANON_KEY=old\n\n# trailing comment   ";
        fs::write(&env_file, original).unwrap();

        let backup = create_backup(&env_file).expect("backup");

        assert_eq!(backup.parent(), Some(dir.path()));
        assert!(
            backup
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(".env.local.backup."))
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
        assert_eq!(fs::read_to_string(&env_file).unwrap(), original);
    }

    #[test]
    fn test_missing_env_file_creates_nothing() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let env_file = dir.path().join(".env.local");

        let err = create_backup(&env_file).unwrap_err();

        assert!(matches!(err, SupakeyError::EnvFileNotFound(ref p) if p == &env_file));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_in_symlinked_project_dir() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join(".env.local"), "A=1\n").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let backup = create_backup(&link.join(".env.local")).expect("backup");

        assert_eq!(backup.parent(), Some(link.as_path()));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "A=1\n");
        assert_eq!(fs::read_dir(&real).unwrap().count(), 2);
    }
}
