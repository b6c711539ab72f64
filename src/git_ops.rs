use anyhow::{Context, Result, bail};
use git2::{ErrorCode, Repository, Tree};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Access to the Git index: which files to process and re-staging them
pub struct GitOps {
    repo: Repository,
    workdir: PathBuf,
}

impl GitOps {
    /// Find the repository containing `root`
    ///
    /// Fails when `root` is not inside a repository or the repository is bare.
    pub fn discover(root: &Path) -> Result<Self> {
        let repo = Repository::discover(root)
            .with_context(|| format!("Not inside a Git repository: {}", root.display()))?;
        let workdir = match repo.workdir() {
            Some(dir) => dir.to_path_buf(),
            None => bail!("Repository has no working directory"),
        };
        debug!("Discovered repository at {}", workdir.display());
        Ok(Self { repo, workdir })
    }

    /// Root of the working tree; all listed paths are relative to it
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// All paths in the index, in index order (like `git ls-files`)
    pub fn tracked_files(&self) -> Result<Vec<PathBuf>> {
        let index = self.repo.index().context("Failed to read the index")?;
        let mut paths: Vec<PathBuf> = index
            .iter()
            .map(|entry| path_from_bytes(&entry.path))
            .collect();
        // Conflicted paths appear once per stage
        paths.dedup();
        debug!("{} tracked files", paths.len());
        Ok(paths)
    }

    /// Paths whose index entry differs from HEAD (like `git diff --cached --name-only`)
    pub fn staged_files(&self) -> Result<Vec<PathBuf>> {
        let head_tree = self.head_tree()?;
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), None, None)
            .context("Failed to diff HEAD against the index")?;

        let paths: Vec<PathBuf> = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(Path::to_path_buf)
            })
            .collect();
        debug!("{} staged files", paths.len());
        Ok(paths)
    }

    /// Add the current working-tree content of `relative_path` to the index
    pub fn restage(&self, relative_path: &Path) -> Result<()> {
        let mut index = self.repo.index().context("Failed to read the index")?;
        index
            .add_path(relative_path)
            .with_context(|| format!("Failed to stage {}", relative_path.display()))?;
        index.write().context("Failed to write the index")?;
        Ok(())
    }

    /// Tree of the HEAD commit, or `None` on an unborn branch
    fn head_tree(&self) -> Result<Option<Tree<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_tree().context("HEAD does not point to a tree")?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to get HEAD"),
        }
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
