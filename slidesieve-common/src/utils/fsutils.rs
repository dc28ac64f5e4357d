use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

/// Checks whether the path is simply a filename, i.e., a normal part of a path.
pub fn is_basename(path: impl AsRef<Path>) -> bool {
    let mut components = path.as_ref().components();
    let Some(Component::Normal(_)) = components.next() else {
        return false;
    };
    components.next().is_none()
}

/// Clears the directory at path, or creates it
pub fn clear_dir(dir: impl AsRef<Path>) -> io::Result<()> {
    let dir = dir.as_ref();
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(dir)?;
            fs::create_dir(dir)
        }
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "dir is not a dir",
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir(dir),
        Err(e) => Err(e),
    }
}

/// Collects all regular files directly in the given directory, sorted by
/// filename. Subdirectories are skipped, not walked.
pub fn sorted_files(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Try to read the file, return None if it doesn't exist
pub fn read_optional_file(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
        Ok(s) => Ok(Some(s)),
    }
}

/// Remove the file if it exists, do nothing if it doesn't
pub fn remove_optional_file(path: impl AsRef<Path>) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basenames() {
        assert!(is_basename("file.png"));
        assert!(!is_basename("dir/file.png"));
        assert!(!is_basename("/file.png"));
        assert!(!is_basename(".."));
        assert!(!is_basename(""));
    }

    #[test]
    fn clear_dir_creates_and_empties() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        let dir = tmp.path().join("out");

        clear_dir(&dir)?;
        assert!(dir.is_dir());

        fs::write(dir.join("leftover"), "x")?;
        clear_dir(&dir)?;
        assert!(dir.is_dir());
        assert!(fs::read_dir(&dir)?.next().is_none());

        Ok(())
    }

    #[test]
    fn sorted_files_is_sorted_and_skips_dirs() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::write(tmp.path().join("b.png"), "")?;
        fs::write(tmp.path().join("a.png"), "")?;
        fs::create_dir(tmp.path().join("sub"))?;

        let files = sorted_files(tmp.path())?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(vec!["a.png", "b.png"], names);

        Ok(())
    }

    #[test]
    fn optional_files() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        let missing = tmp.path().join("nope");

        assert_eq!(None, read_optional_file(&missing)?);
        remove_optional_file(&missing)?;

        let there = tmp.path().join("there");
        fs::write(&there, "hello")?;
        assert_eq!(Some("hello".to_string()), read_optional_file(&there)?);
        remove_optional_file(&there)?;
        assert!(!there.exists());

        Ok(())
    }
}
