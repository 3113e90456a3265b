//! Vignette generation service
//!
//! Loads treatment trees from JSON files and runs the draw/assemble
//! pipeline on them. The domain layer never touches a file; everything
//! on-disk goes through the injected [`FileSystem`].

use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::application::error_ext::IoResultExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    assemble, reduce_to_results, DomainError, DrawOptions, OutputStyle, TreatmentNode,
    VignetteObject,
};
use crate::infrastructure::traits::FileSystem;

/// Shape summary for a loaded treatment tree.
#[derive(Debug, Clone)]
pub struct TreeReport {
    /// Number of branch orders below the root
    pub depth: usize,
    /// Branch nodes in the whole tree
    pub branches: usize,
    /// Settled text entries, constant texts included
    pub leaves: usize,
    /// Keys selectable at the first order, in author order
    pub root_candidates: Vec<String>,
}

/// Service for loading treatment trees and generating vignettes.
pub struct GeneratorService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl GeneratorService {
    /// Create a new generator service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Load and classify a treatment tree from a JSON file.
    ///
    /// I/O failures surface as [`ApplicationError::TreeFile`]; JSON that
    /// parses but violates the tree shape surfaces as a domain error.
    pub fn load_tree(&self, path: &Path) -> ApplicationResult<TreatmentNode> {
        debug!("load_tree: path={}", path.display());
        if !self.fs.exists(path) {
            return Err(ApplicationError::TreeFile {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }
        if !self.fs.is_file(path) {
            return Err(ApplicationError::TreeFile {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let content = self.fs.read_to_string(path).with_tree_context(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| DomainError::malformed(format!("invalid JSON: {e}")))?;
        let tree = TreatmentNode::from_json(&value)?;
        debug!(
            "load_tree: depth={} branches={} leaves={}",
            tree.depth(),
            tree.branch_count(),
            tree.leaf_count()
        );
        Ok(tree)
    }

    /// Generate one vignette from an already loaded tree.
    pub fn generate(
        &self,
        tree: &TreatmentNode,
        opts: &DrawOptions,
        style: OutputStyle,
        rng: &mut impl Rng,
    ) -> ApplicationResult<VignetteObject> {
        let results = reduce_to_results(tree, opts, rng, self.settings.max_depth)?;
        Ok(assemble(&results, style))
    }

    /// Generate a batch of vignettes from one tree under a single RNG
    /// stream, so a seed reproduces the whole batch.
    pub fn generate_batch(
        &self,
        tree: &TreatmentNode,
        opts: &DrawOptions,
        style: OutputStyle,
        rng: &mut impl Rng,
        count: usize,
    ) -> ApplicationResult<Vec<VignetteObject>> {
        debug!("generate_batch: count={}", count);
        let mut vignettes = Vec::with_capacity(count);
        for _ in 0..count {
            vignettes.push(self.generate(tree, opts, style, rng)?);
        }
        Ok(vignettes)
    }

    /// Load a tree and generate one vignette from it.
    pub fn generate_from_file(
        &self,
        path: &Path,
        opts: &DrawOptions,
        style: OutputStyle,
        rng: &mut impl Rng,
    ) -> ApplicationResult<VignetteObject> {
        let tree = self.load_tree(path)?;
        self.generate(&tree, opts, style, rng)
    }

    /// Load a tree and summarize its shape without drawing anything.
    pub fn inspect(&self, path: &Path) -> ApplicationResult<TreeReport> {
        let tree = self.load_tree(path)?;
        Ok(TreeReport {
            depth: tree.depth(),
            branches: tree.branch_count(),
            leaves: tree.leaf_count(),
            root_candidates: root_candidates(&tree),
        })
    }
}

fn root_candidates(tree: &TreatmentNode) -> Vec<String> {
    match tree {
        TreatmentNode::Texts(_) => Vec::new(),
        TreatmentNode::Branch(branch) => branch
            .child_keys()
            .iter()
            .map(|key| key.raw().to_string())
            .collect(),
        TreatmentNode::Forest(entries) => entries
            .iter()
            .map(|(key, _)| key.raw().to_string())
            .collect(),
    }
}
