//! Locating and relocating compiler side artifacts.
//!
//! A dump flag makes the compiler write an extra file named after the
//! *source* (not the object), and the exact suffix and directory differ
//! between compiler releases. The candidates are evaluated as an explicit
//! priority list: every directory for the first suffix, then every directory
//! for the next suffix, and so on. The first existing file wins.
//!
//! Probing is not synchronized. Two tasks running at the same time in the
//! same directory whose sources share a file name will race on the same
//! candidate paths. Callers must keep base names unique among concurrently
//! running tasks, or run such tasks one at a time.

use std::path::{Path, PathBuf};

use crate::builder::errors::{display_dir, ExtError};
use crate::util::fs::{move_file, same_file};

/// One place a compiler release might put the side artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub dir: PathBuf,
    pub suffix: String,
}

impl ArtifactCandidate {
    /// Path of this candidate for a given base name.
    pub fn path(&self, base: &str) -> PathBuf {
        self.dir.join(format!("{}{}", base, self.suffix))
    }
}

/// Result of probing the candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found(PathBuf),
    NotFound,
}

/// What [`relocate`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// The artifact was already at the target path; nothing was moved.
    AlreadyInPlace,
    /// The artifact was moved from this path to the target.
    Moved { from: PathBuf },
}

/// Candidate list in priority order: suffix-major, then directory.
pub fn candidates(dirs: &[PathBuf], suffixes: &[String]) -> Vec<ArtifactCandidate> {
    suffixes
        .iter()
        .flat_map(|suffix| {
            dirs.iter().map(move |dir| ArtifactCandidate {
                dir: dir.clone(),
                suffix: suffix.clone(),
            })
        })
        .collect()
}

/// Return the first candidate for which `exists` holds.
pub fn probe<F>(base: &str, candidates: &[ArtifactCandidate], exists: F) -> Probe
where
    F: Fn(&Path) -> bool,
{
    for candidate in candidates {
        let path = candidate.path(base);
        tracing::debug!("probing {}", path.display());
        if exists(&path) {
            return Probe::Found(path);
        }
    }
    Probe::NotFound
}

/// Directories a side artifact may land in: the working directory, then the
/// directory of the primary output.
pub fn candidate_dirs(cwd: &Path, primary_output: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![cwd.to_path_buf()];

    let output_dir = match primary_output.parent() {
        Some(parent) if parent.as_os_str().is_empty() => cwd.to_path_buf(),
        Some(parent) if parent.is_absolute() => parent.to_path_buf(),
        Some(parent) => cwd.join(parent),
        None => cwd.to_path_buf(),
    };
    if !dirs.contains(&output_dir) {
        dirs.push(output_dir);
    }

    dirs
}

/// Find the side artifact of `source` and move it to `target`.
///
/// If the first existing candidate is the target itself this is a no-op.
/// When no candidate exists the filesystem is left untouched and
/// [`ExtError::ArtifactNotFound`] lists what was tried.
pub fn relocate(
    source: &Path,
    target: &Path,
    dirs: &[PathBuf],
    suffixes: &[String],
) -> Result<Relocation, ExtError> {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());

    let not_found = || ExtError::ArtifactNotFound {
        base: base.clone(),
        dirs: dirs.to_vec(),
        suffixes: suffixes.to_vec(),
    };

    if source.file_name().is_none() {
        return Err(not_found());
    }

    let found = match probe(&base, &candidates(dirs, suffixes), |p| p.is_file()) {
        Probe::Found(path) => path,
        Probe::NotFound => {
            let tried: Vec<String> = dirs.iter().map(|d| display_dir(d)).collect();
            tracing::debug!(
                "no side artifact for `{}` in {} with suffixes {}",
                base,
                tried.join(", "),
                suffixes.join(", ")
            );
            return Err(not_found());
        }
    };

    if found == target || same_file(&found, target) {
        tracing::debug!("{} already in place", target.display());
        return Ok(Relocation::AlreadyInPlace);
    }

    move_file(&found, target).map_err(|source| ExtError::Relocate {
        from: found.clone(),
        to: target.to_path_buf(),
        source,
    })?;
    tracing::debug!("moved {} -> {}", found.display(), target.display());

    Ok(Relocation::Moved { from: found })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn suffixes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn listing(dir: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        entries.sort();
        entries
    }

    #[test]
    fn test_candidate_order_is_suffix_major() {
        let dirs = vec![PathBuf::from("."), PathBuf::from("build")];
        let list = candidates(&dirs, &suffixes(&[".tu", ".t00.tu"]));

        let paths: Vec<PathBuf> = list.iter().map(|c| c.path("foo.c")).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("./foo.c.tu"),
                PathBuf::from("build/foo.c.tu"),
                PathBuf::from("./foo.c.t00.tu"),
                PathBuf::from("build/foo.c.t00.tu"),
            ]
        );
    }

    #[test]
    fn test_probe_without_filesystem() {
        let dirs = vec![PathBuf::from("."), PathBuf::from("build")];
        let list = candidates(&dirs, &suffixes(&[".tu", ".t00.tu", ".001t.tu"]));

        let hit = probe("foo.c", &list, |p| {
            p == Path::new("build/foo.c.t00.tu") || p == Path::new("./foo.c.001t.tu")
        });
        // Suffix priority beats directory priority
        assert_eq!(hit, Probe::Found(PathBuf::from("build/foo.c.t00.tu")));

        assert_eq!(probe("foo.c", &list, |_| false), Probe::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_candidate_dirs() {
        let cwd = PathBuf::from("/work");
        assert_eq!(
            candidate_dirs(&cwd, Path::new("build/foo.o")),
            vec![PathBuf::from("/work"), PathBuf::from("/work/build")]
        );
        assert_eq!(
            candidate_dirs(&cwd, Path::new("foo.o")),
            vec![PathBuf::from("/work")]
        );
    }

    #[test]
    fn test_moves_artifact_from_working_dir() {
        let tmp = TempDir::new().unwrap();
        let cwd = tmp.path();
        fs::write(cwd.join("foo.c.tu"), "@1 translation_unit_decl").unwrap();

        let target = cwd.join("build").join("foo.tu");
        let dirs = vec![cwd.to_path_buf(), cwd.join("build")];
        let result = relocate(Path::new("src/foo.c"), &target, &dirs, &suffixes(&[".tu"])).unwrap();

        assert_eq!(
            result,
            Relocation::Moved {
                from: cwd.join("foo.c.tu")
            }
        );
        assert!(!cwd.join("foo.c.tu").exists());
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "@1 translation_unit_decl"
        );
    }

    #[test]
    fn test_newer_suffix_in_output_dir() {
        let tmp = TempDir::new().unwrap();
        let cwd = tmp.path();
        let build = cwd.join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("foo.c.001t.tu"), "dump").unwrap();

        let target = build.join("foo.c.tu");
        let dirs = candidate_dirs(cwd, Path::new("build/foo.o"));
        let result = relocate(
            Path::new("foo.c"),
            &target,
            &dirs,
            &suffixes(&[".tu", ".t00.tu", ".001t.tu"]),
        )
        .unwrap();

        assert_eq!(
            result,
            Relocation::Moved {
                from: build.join("foo.c.001t.tu")
            }
        );
        assert!(target.exists());
    }

    #[test]
    fn test_already_in_place_is_noop() {
        let tmp = TempDir::new().unwrap();
        let cwd = tmp.path();
        let build = cwd.join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("foo.c.tu"), "dump").unwrap();

        let target = build.join("foo.c.tu");
        let before = listing(&build);
        let result = relocate(
            Path::new("foo.c"),
            &target,
            &[build.clone()],
            &suffixes(&[".tu"]),
        )
        .unwrap();

        assert_eq!(result, Relocation::AlreadyInPlace);
        assert_eq!(listing(&build), before);
        assert_eq!(fs::read_to_string(&target).unwrap(), "dump");
    }

    #[test]
    fn test_not_found_leaves_filesystem_unchanged() {
        let tmp = TempDir::new().unwrap();
        let cwd = tmp.path();
        fs::write(cwd.join("foo.c"), "int x;").unwrap();
        fs::write(cwd.join("bar.c.tu"), "someone else's dump").unwrap();
        let before = listing(cwd);

        let dirs = vec![cwd.to_path_buf(), cwd.join("build")];
        let err = relocate(
            Path::new("foo.c"),
            &cwd.join("build/foo.tu"),
            &dirs,
            &suffixes(&[".tu", ".t00.tu"]),
        )
        .unwrap_err();

        match err {
            ExtError::ArtifactNotFound {
                base,
                dirs: tried,
                suffixes: tried_suffixes,
            } => {
                assert_eq!(base, "foo.c");
                assert_eq!(tried, dirs);
                assert_eq!(tried_suffixes, suffixes(&[".tu", ".t00.tu"]));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(listing(cwd), before);
    }

    #[test]
    fn test_directories_are_not_artifacts() {
        let tmp = TempDir::new().unwrap();
        let cwd = tmp.path();
        fs::create_dir_all(cwd.join("foo.c.tu")).unwrap();

        let err = relocate(
            Path::new("foo.c"),
            &cwd.join("out.tu"),
            &[cwd.to_path_buf()],
            &suffixes(&[".tu"]),
        );
        assert!(matches!(err, Err(ExtError::ArtifactNotFound { .. })));
    }
}
