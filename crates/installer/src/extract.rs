//! Zip extraction and plugin root lookup.

use std::{
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use {
    tracing::warn,
    zip::{ZipArchive, result::ZipResult},
};

/// macOS resource-fork folder some archivers add next to the real content.
const MACOS_METADATA_DIR: &str = "__MACOSX";

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Extract every entry of `archive` below `dest` and return how many
/// entries were written.
///
/// Entries whose path would escape `dest` and symlink entries are skipped.
pub fn extract_archive(archive: &Path, dest: &Path) -> ZipResult<usize> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;
    fs::create_dir_all(dest)?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "skipping archive entry with unsafe path");
            continue;
        };
        if entry
            .unix_mode()
            .is_some_and(|mode| mode & S_IFMT == S_IFLNK)
        {
            warn!(entry = entry.name(), "skipping symlink archive entry");
            continue;
        }

        let out = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&out)?;
            io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode().filter(|mode| mode & 0o777 != 0) {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&out, fs::Permissions::from_mode(mode & 0o777))?;
            }
        }
        written += 1;
    }

    Ok(written)
}

/// First directory (by name) directly under `dir`, ignoring `__MACOSX`.
///
/// `None` means the archive had no top-level folder.
pub fn locate_plugin_root(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == MACOS_METADATA_DIR {
            continue;
        }
        if entry.file_type()?.is_dir() {
            candidates.push(entry.path());
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Delete the `__MACOSX` folder directly under `dir`, if any.
pub fn remove_resource_forks(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir.join(MACOS_METADATA_DIR)) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod tests {
    use {
        super::*,
        std::io::Write,
        zip::{ZipWriter, write::SimpleFileOptions},
    };

    /// Write a zip at `path`. Names ending in `/` become directory entries.
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, body) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_nested_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("foo.zip");
        write_zip(
            &archive,
            &[
                ("foo-1.2.3/", ""),
                ("foo-1.2.3/__init__.py", "def classFactory(iface): pass\n"),
                ("foo-1.2.3/metadata.txt", "[general]\nname=Foo\n"),
                ("foo-1.2.3/ui/dialog.ui", "<ui/>"),
            ],
        );

        let dest = tmp.path().join("out");
        let count = extract_archive(&archive, &dest).unwrap();
        assert_eq!(count, 4);
        assert!(dest.join("foo-1.2.3/ui/dialog.ui").is_file());
        assert_eq!(
            fs::read_to_string(dest.join("foo-1.2.3/metadata.txt")).unwrap(),
            "[general]\nname=Foo\n"
        );
    }

    #[test]
    fn skips_entries_escaping_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", "x"), ("ok/file.txt", "y")]);

        let dest = tmp.path().join("out");
        let count = extract_archive(&archive, &dest).unwrap();
        assert_eq!(count, 1);
        assert!(!tmp.path().join("escape.txt").exists());
        assert!(dest.join("ok/file.txt").is_file());
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();
        assert!(extract_archive(&archive, &tmp.path().join("out")).is_err());
    }

    #[test]
    fn locate_picks_first_directory_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("zeta")).unwrap();
        fs::create_dir_all(tmp.path().join("alpha_core")).unwrap();
        fs::create_dir_all(tmp.path().join(MACOS_METADATA_DIR)).unwrap();
        fs::write(tmp.path().join("README.txt"), "readme").unwrap();

        let root = locate_plugin_root(tmp.path()).unwrap();
        assert_eq!(root, Some(tmp.path().join("alpha_core")));
    }

    #[test]
    fn resource_forks_are_removed() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(MACOS_METADATA_DIR)).unwrap();
        fs::write(tmp.path().join(MACOS_METADATA_DIR).join("._init.py"), "").unwrap();
        fs::write(tmp.path().join("__init__.py"), "").unwrap();

        remove_resource_forks(tmp.path()).unwrap();
        assert!(!tmp.path().join(MACOS_METADATA_DIR).exists());
        assert!(tmp.path().join("__init__.py").is_file());
        remove_resource_forks(tmp.path()).unwrap();
    }

    #[test]
    fn locate_returns_none_for_loose_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("__init__.py"), "").unwrap();
        fs::write(tmp.path().join("metadata.txt"), "").unwrap();
        assert_eq!(locate_plugin_root(tmp.path()).unwrap(), None);
    }
}
