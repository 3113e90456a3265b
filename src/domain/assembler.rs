//! Vignette assembly: stitch settled treatment text into one stimulus
//! string, reconstructing order grouping from the numeric ID paths.

use std::fmt;
use std::str::FromStr;

use crate::domain::entities::{ResultsObject, VignetteObject};

/// Separator style for the stitched vignette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// Blank-line separators for plain text surveys.
    Text,
    /// `<br /><br />` separators for web-embedded instruments.
    #[default]
    Html,
}

impl OutputStyle {
    pub fn separator(self) -> &'static str {
        match self {
            OutputStyle::Text => "\n\n",
            OutputStyle::Html => "<br /><br />",
        }
    }
}

impl FromStr for OutputStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputStyle::Text),
            "html" => Ok(OutputStyle::Html),
            other => Err(format!(
                "unrecognized output style `{other}`; possible options are \"text\" and \"html\""
            )),
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStyle::Text => write!(f, "text"),
            OutputStyle::Html => write!(f, "html"),
        }
    }
}

/// Assemble a vignette from settled results.
///
/// Fragments are collected in treatment order; treatments whose settled
/// text is empty contribute neither a fragment nor an ID path. The
/// fragments are then grouped by order (see [`group_by_depth`]), flattened
/// and joined with the style's separator.
pub fn assemble(results: &ResultsObject, style: OutputStyle) -> VignetteObject {
    let mut treatment_text = Vec::new();
    for key in results.treatments() {
        if let Some(texts) = results.get(key) {
            treatment_text.extend(texts.iter().cloned());
        }
    }

    let selected_treats: Vec<Vec<u32>> = results
        .treatments()
        .iter()
        .filter(|key| results.get(key).is_some_and(|texts| !texts.is_empty()))
        .map(|key| key.path().to_vec())
        .collect();

    let grouped = group_by_depth(&treatment_text, &selected_treats);
    let vignette = grouped
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(style.separator());

    VignetteObject {
        vignette,
        treatment_text,
        selected_treats,
    }
}

/// Group fragments into per-order buckets by comparing consecutive ID path
/// lengths: a fragment whose path is strictly longer than its successor's
/// closes the current order (the walk stepped back up the tree), so the
/// next fragment opens a new bucket. Ties and descents stay in the same
/// bucket, and the final fragment always lands in the current one.
///
/// Fragments and paths are index-aligned; fragments beyond the last path
/// are dropped, paths beyond the last fragment contribute empty slots.
pub fn group_by_depth(texts: &[String], paths: &[Vec<u32>]) -> Vec<Vec<String>> {
    let mut buckets: Vec<Vec<String>> = Vec::new();
    let mut level = 0;
    for i in 0..paths.len() {
        if buckets.len() <= level {
            buckets.push(Vec::new());
        }
        let Some(text) = texts.get(i) else {
            continue;
        };
        buckets[level].push(text.clone());
        if let Some(next) = paths.get(i + 1) {
            if paths[i].len() > next.len() {
                level += 1;
            }
        }
    }
    buckets
}
