//! Ownership of a bundle directory

use crate::configuration::CONFIGURATION_FILE;
use crate::error::{BundleError, BundleResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An ephemeral configuration directory
///
/// The tree is removed when the bundle is dropped, unless [`retain`] was
/// called. This also covers early returns and cancelled runs.
///
/// [`retain`]: ConfigBundle::retain
#[derive(Debug)]
pub struct ConfigBundle {
    root: PathBuf,
    /// Files written, relative to `root`, in write order
    files: Vec<PathBuf>,
    blueprint_file: PathBuf,
    armed: bool,
}

impl ConfigBundle {
    /// Take ownership of a freshly created, empty root
    pub(crate) fn claim(root: PathBuf) -> Self {
        Self {
            root,
            files: Vec::new(),
            blueprint_file: PathBuf::new(),
            armed: true,
        }
    }

    /// Write a bundle-relative file, creating parent directories
    pub(crate) fn write(&mut self, relative: &Path, contents: &str) -> BundleResult<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BundleError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&path, contents).map_err(|e| BundleError::Write {
            path: path.clone(),
            source: e,
        })?;
        debug!("Wrote {:?} ({} bytes)", path, contents.len());
        self.files.push(relative.to_path_buf());
        Ok(())
    }

    pub(crate) fn set_blueprint_file(&mut self, relative: PathBuf) {
        self.blueprint_file = relative;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the generated `configuration.yaml`
    pub fn configuration_path(&self) -> PathBuf {
        self.root.join(CONFIGURATION_FILE)
    }

    /// Absolute path of the blueprint copy
    pub fn blueprint_path(&self) -> PathBuf {
        self.root.join(&self.blueprint_file)
    }

    /// Files written, relative to the root
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Read a generated file back
    pub fn read(&self, relative: impl AsRef<Path>) -> std::io::Result<String> {
        fs::read_to_string(self.root.join(relative))
    }

    /// Keep the tree on disk and hand back its root
    pub fn retain(mut self) -> PathBuf {
        self.armed = false;
        debug!("Retaining bundle {:?}", self.root);
        self.root.clone()
    }

    /// Remove the tree now, reporting failures instead of logging them
    pub fn cleanup(mut self) -> BundleResult<()> {
        self.armed = false;
        remove_tree(&self.root)
    }
}

impl Drop for ConfigBundle {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = remove_tree(&self.root) {
                warn!("{}", e);
            }
        }
    }
}

fn remove_tree(root: &Path) -> BundleResult<()> {
    match fs::remove_dir_all(root) {
        Ok(()) => {
            debug!("Removed bundle {:?}", root);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BundleError::Cleanup {
            path: root.to_path_buf(),
            source: e,
        }),
    }
}
