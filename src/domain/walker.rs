//! Treatment-tree walking: repeated selection steps until every treatment
//! is settled into text.
//!
//! Each step classifies the current node shape once (the shapes are fixed
//! at construction, see [`TreatmentNode`]) and expands every pending branch
//! by sampling its candidates. The walk is strictly level by level; the
//! RNG is consumed in entry order within a level.

use rand::Rng;
use tracing::{debug, instrument};

use crate::domain::entities::{Branch, ResultsObject, TreatKey, TreatmentNode};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::sampler::{self, DrawOptions};

/// Depth bound applied by [`reduce_to_results`] callers that have no
/// configured limit of their own.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Outcome of one reduction step.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// At least one branch remains to be selected through.
    Next(TreatmentNode),
    /// Every treatment is settled.
    Terminal(ResultsObject),
}

/// Perform one selection step on a treatment tree.
///
/// A forest whose entries are all settled becomes `Terminal`; a branch, or
/// a forest still containing branches, has each pending branch expanded
/// into its constant text plus the sampled candidate subtrees, yielding
/// `Next`.
pub fn reduce(
    node: &TreatmentNode,
    opts: &DrawOptions,
    rng: &mut impl Rng,
) -> DomainResult<Reduction> {
    match node {
        TreatmentNode::Texts(_) => Err(DomainError::malformed(
            "a bare text array is not walkable; wrap it in a keyed object",
        )),
        TreatmentNode::Branch(branch) => {
            let mut entries = Vec::with_capacity(branch.children.len() + 1);
            expand_branch(branch, opts, rng, &mut entries)?;
            Ok(Reduction::Next(TreatmentNode::Forest(entries)))
        }
        TreatmentNode::Forest(entries) => reduce_forest(entries, opts, rng),
    }
}

/// Step over a prior reduction: a terminal result passes through
/// unchanged, a pending tree is reduced once more.
pub fn reduce_step(
    reduction: Reduction,
    opts: &DrawOptions,
    rng: &mut impl Rng,
) -> DomainResult<Reduction> {
    match reduction {
        Reduction::Terminal(results) => {
            debug!("results already settled, passing through");
            Ok(Reduction::Terminal(results))
        }
        Reduction::Next(node) => reduce(&node, opts, rng),
    }
}

/// Reduce a treatment tree all the way to settled results.
///
/// Every round that still yields `Next` counts against `max_depth`;
/// exhausting the budget fails with [`DomainError::UnboundedRecursion`]
/// rather than descending further.
#[instrument(level = "debug", skip(node, rng))]
pub fn reduce_to_results(
    node: &TreatmentNode,
    opts: &DrawOptions,
    rng: &mut impl Rng,
    max_depth: usize,
) -> DomainResult<ResultsObject> {
    let mut current = reduce(node, opts, rng)?;
    let mut depth = 1;
    loop {
        match current {
            Reduction::Terminal(results) => {
                debug!(rounds = depth, treatments = results.len(), "walk settled");
                return Ok(results);
            }
            Reduction::Next(next) => {
                if depth >= max_depth {
                    return Err(DomainError::UnboundedRecursion { depth });
                }
                depth += 1;
                current = reduce(&next, opts, rng)?;
            }
        }
    }
}

fn reduce_forest(
    entries: &[(TreatKey, TreatmentNode)],
    opts: &DrawOptions,
    rng: &mut impl Rng,
) -> DomainResult<Reduction> {
    let settled = entries
        .iter()
        .all(|(_, entry)| matches!(entry, TreatmentNode::Texts(_)));
    if settled {
        let results = entries
            .iter()
            .filter_map(|(key, entry)| match entry {
                TreatmentNode::Texts(texts) => Some((key.clone(), texts.clone())),
                _ => None,
            })
            .collect();
        return Ok(Reduction::Terminal(ResultsObject::new(results)));
    }

    let mut out = Vec::with_capacity(entries.len());
    for (key, entry) in entries {
        match entry {
            TreatmentNode::Texts(texts) => {
                out.push((key.clone(), TreatmentNode::Texts(texts.clone())));
            }
            TreatmentNode::Branch(branch) => expand_branch(branch, opts, rng, &mut out)?,
            TreatmentNode::Forest(_) => {
                return Err(DomainError::malformed(format!(
                    "entry `{key}` is a nested forest and cannot be selected through"
                )));
            }
        }
    }
    Ok(Reduction::Next(TreatmentNode::Forest(out)))
}

/// Expand one branch: its constant text always survives, then each sampled
/// candidate subtree follows under its own key. An empty multiple draw
/// keeps the constant text with no candidates.
fn expand_branch(
    branch: &Branch,
    opts: &DrawOptions,
    rng: &mut impl Rng,
    out: &mut Vec<(TreatKey, TreatmentNode)>,
) -> DomainResult<()> {
    out.push((
        branch.text_key.clone(),
        TreatmentNode::Texts(branch.text.clone()),
    ));
    let picks = sampler::draw(branch.children.len(), opts, rng)?;
    debug!(
        branch = %branch.text_key,
        candidates = branch.children.len(),
        selected = picks.len(),
        "branch expanded"
    );
    for i in picks {
        let (key, child) = &branch.children[i];
        out.push((key.clone(), child.clone()));
    }
    Ok(())
}
