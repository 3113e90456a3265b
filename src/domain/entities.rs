//! Domain entities: treatment keys, the classified treatment tree, and the
//! walker/assembler value objects.
//!
//! A treatment tree arrives as a JSON object whose key order is meaningful
//! (author insertion order decides vignette order), so parsing goes through
//! `serde_json::Map` with the `preserve_order` feature enabled.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::error::{DomainError, DomainResult};

/// Key of the mapping entry that introduces the next order of a branch.
pub const NEXT_ORDER_KEY: &str = "next_ord_treats";

/// A treatment identifier such as `treat_1_2` or `treat_2_1_text`.
///
/// The numeric segments are parsed once at construction; the assembler
/// compares their count to reconstruct nesting and never re-parses the
/// raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreatKey {
    raw: String,
    path: Vec<u32>,
}

impl TreatKey {
    /// Build a key from its raw string form, extracting the numeric ID path.
    ///
    /// Segments are split on `_`; every segment that parses as an unsigned
    /// integer joins the path, all others (markers like `treat`, `text`,
    /// `const`) are dropped.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let path = raw
            .split('_')
            .filter_map(|segment| segment.parse::<u32>().ok())
            .collect();
        Self { raw, path }
    }

    /// The raw key string as authored in the tree file.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The numeric ID path, e.g. `[1, 2]` for `treat_1_2`.
    pub fn path(&self) -> &[u32] {
        &self.path
    }

    /// Number of numeric segments; deeper treatments have longer paths.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

impl fmt::Display for TreatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for TreatKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// One branch of the treatment hierarchy: constant text shown to every
/// subject passing through, plus the candidate subtrees of the next order.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Key and fragments of the constant text entry.
    pub text_key: TreatKey,
    pub text: Vec<String>,
    /// Candidate subtrees, in author order. Selection picks among these.
    pub children: Vec<(TreatKey, TreatmentNode)>,
}

impl Branch {
    /// Keys of the candidate subtrees, in author order.
    pub fn child_keys(&self) -> Vec<&TreatKey> {
        self.children.iter().map(|(key, _)| key).collect()
    }
}

/// A node of the treatment tree, classified once at construction.
///
/// The three shapes correspond to the authorable node forms:
/// - `Texts`: settled candidate fragments for one treatment ID,
/// - `Branch`: constant text plus a set of next-order candidates,
/// - `Forest`: parallel entries walked in lock step (terminal when every
///   entry is `Texts`).
#[derive(Debug, Clone, PartialEq)]
pub enum TreatmentNode {
    Texts(Vec<String>),
    Branch(Branch),
    Forest(Vec<(TreatKey, TreatmentNode)>),
}

impl TreatmentNode {
    /// Classify a parsed JSON value into a treatment tree.
    ///
    /// Classification happens exactly once, here; the walker afterwards
    /// only matches on the enum. Rules, checked in order on each object:
    /// every value a string array -> terminal forest of `Texts`; a
    /// `next_ord_treats` entry present -> `Branch`; anything else -> mixed
    /// `Forest` whose entries must each be a string array or a branch.
    pub fn from_json(value: &Value) -> DomainResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            DomainError::malformed("the tree root must be a JSON object")
        })?;
        Self::from_map(map)
    }

    fn from_map(map: &Map<String, Value>) -> DomainResult<Self> {
        if map.is_empty() {
            return Err(DomainError::malformed("a tree node cannot be an empty object"));
        }

        if map.values().all(Value::is_array) {
            let entries = map
                .iter()
                .map(|(key, value)| {
                    Ok((TreatKey::new(key), TreatmentNode::Texts(string_array(key, value)?)))
                })
                .collect::<DomainResult<Vec<_>>>()?;
            return Ok(TreatmentNode::Forest(entries));
        }

        if map.contains_key(NEXT_ORDER_KEY) {
            return Ok(TreatmentNode::Branch(branch_from_map(map)?));
        }

        // Mixed forest: parallel entries which are each settled text or a
        // branch of their own.
        let entries = map
            .iter()
            .map(|(key, value)| Ok((TreatKey::new(key), entry_node(key, value)?)))
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(TreatmentNode::Forest(entries))
    }

    /// Greatest number of branch orders below this node (a terminal node
    /// has depth 0).
    pub fn depth(&self) -> usize {
        match self {
            TreatmentNode::Texts(_) => 0,
            TreatmentNode::Branch(branch) => {
                1 + branch
                    .children
                    .iter()
                    .map(|(_, child)| child.depth())
                    .max()
                    .unwrap_or(0)
            }
            TreatmentNode::Forest(entries) => entries
                .iter()
                .map(|(_, entry)| entry.depth())
                .max()
                .unwrap_or(0),
        }
    }

    /// Total number of branch nodes in the subtree.
    pub fn branch_count(&self) -> usize {
        match self {
            TreatmentNode::Texts(_) => 0,
            TreatmentNode::Branch(branch) => {
                1 + branch
                    .children
                    .iter()
                    .map(|(_, child)| child.branch_count())
                    .sum::<usize>()
            }
            TreatmentNode::Forest(entries) => entries
                .iter()
                .map(|(_, entry)| entry.branch_count())
                .sum(),
        }
    }

    /// Total number of settled text entries in the subtree, branch constant
    /// texts included.
    pub fn leaf_count(&self) -> usize {
        match self {
            TreatmentNode::Texts(_) => 1,
            TreatmentNode::Branch(branch) => {
                1 + branch
                    .children
                    .iter()
                    .map(|(_, child)| child.leaf_count())
                    .sum::<usize>()
            }
            TreatmentNode::Forest(entries) => entries
                .iter()
                .map(|(_, entry)| entry.leaf_count())
                .sum(),
        }
    }
}

fn string_array(key: &str, value: &Value) -> DomainResult<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        DomainError::malformed(format!("entry `{key}` must be an array of strings"))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                DomainError::malformed(format!(
                    "entry `{key}` must contain only strings"
                ))
            })
        })
        .collect()
}

fn branch_from_map(map: &Map<String, Value>) -> DomainResult<Branch> {
    let mut text_entry = None;
    for (key, value) in map {
        if key == NEXT_ORDER_KEY {
            continue;
        }
        if text_entry.is_some() {
            return Err(DomainError::malformed(format!(
                "a branch must hold exactly one constant text entry besides \
                 `{NEXT_ORDER_KEY}`, found a second one: `{key}`"
            )));
        }
        text_entry = Some((TreatKey::new(key), string_array(key, value)?));
    }
    let (text_key, text) = text_entry.ok_or_else(|| {
        DomainError::malformed(format!(
            "a branch must hold a constant text entry besides `{NEXT_ORDER_KEY}`"
        ))
    })?;

    let next = map
        .get(NEXT_ORDER_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| {
            DomainError::malformed(format!("`{NEXT_ORDER_KEY}` must be a JSON object"))
        })?;
    if next.is_empty() {
        return Err(DomainError::malformed(format!(
            "`{NEXT_ORDER_KEY}` must name at least one candidate treatment"
        )));
    }

    let children = next
        .iter()
        .map(|(key, value)| Ok((TreatKey::new(key), entry_node(key, value)?)))
        .collect::<DomainResult<Vec<_>>>()?;

    Ok(Branch {
        text_key,
        text,
        children,
    })
}

/// Entry rule shared by forest entries and branch candidates: a string
/// array settles as `Texts`, a branch object recurses, everything else is
/// a shape the walker cannot select through.
fn entry_node(key: &str, value: &Value) -> DomainResult<TreatmentNode> {
    match value {
        Value::Array(_) => Ok(TreatmentNode::Texts(string_array(key, value)?)),
        Value::Object(inner) if inner.contains_key(NEXT_ORDER_KEY) => {
            Ok(TreatmentNode::Branch(branch_from_map(inner)?))
        }
        _ => Err(DomainError::malformed(format!(
            "entry `{key}` must be a text array or a branch object"
        ))),
    }
}

/// Terminal output of the tree walk: settled text per treatment, plus the
/// selected treatment keys in settlement order.
///
/// `treatments` always equals the keys of `results` in order; the pair is
/// kept because downstream consumers index by key and iterate by order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsObject {
    results: Vec<(TreatKey, Vec<String>)>,
    treatments: Vec<TreatKey>,
}

impl ResultsObject {
    pub fn new(results: Vec<(TreatKey, Vec<String>)>) -> Self {
        let treatments = results.iter().map(|(key, _)| key.clone()).collect();
        Self { results, treatments }
    }

    pub fn treatments(&self) -> &[TreatKey] {
        &self.treatments
    }

    /// Settled fragments for a key; first entry wins on duplicate keys.
    pub fn get(&self, key: &TreatKey) -> Option<&[String]> {
        self.results
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, texts)| texts.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TreatKey, &[String])> {
        self.results
            .iter()
            .map(|(key, texts)| (key, texts.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// The assembled vignette: the stitched stimulus string plus the treatment
/// bookkeeping an analysis pipeline needs to reconstruct the condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VignetteObject {
    pub vignette: String,
    pub treatment_text: Vec<String>,
    pub selected_treats: Vec<Vec<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_key_with_markers_when_parsed_then_only_numeric_segments_remain() {
        let key = TreatKey::new("treat_1_2_text");
        assert_eq!(key.raw(), "treat_1_2_text");
        assert_eq!(key.path(), &[1, 2]);
        assert_eq!(key.depth(), 2);
    }

    #[test]
    fn given_key_without_numbers_when_parsed_then_path_is_empty() {
        let key = TreatKey::new("const_text");
        assert!(key.path().is_empty());
    }

    #[test]
    fn given_all_array_object_when_classified_then_terminal_forest() {
        let value = json!({
            "treat_1_text": ["Hello."],
            "treat_1_1": ["World."]
        });
        let node = TreatmentNode::from_json(&value).unwrap();
        match node {
            TreatmentNode::Forest(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(entries
                    .iter()
                    .all(|(_, entry)| matches!(entry, TreatmentNode::Texts(_))));
                assert_eq!(entries[0].0.raw(), "treat_1_text");
            }
            other => panic!("expected forest, got {other:?}"),
        }
    }

    #[test]
    fn given_branch_object_when_classified_then_branch_with_children_in_order() {
        let value = json!({
            "treat_1_text": ["Intro."],
            "next_ord_treats": {
                "treat_1_1": ["Low."],
                "treat_1_2": ["High."]
            }
        });
        let node = TreatmentNode::from_json(&value).unwrap();
        match node {
            TreatmentNode::Branch(branch) => {
                assert_eq!(branch.text_key.raw(), "treat_1_text");
                assert_eq!(branch.text, vec!["Intro.".to_string()]);
                let keys: Vec<_> = branch.children.iter().map(|(k, _)| k.raw()).collect();
                assert_eq!(keys, vec!["treat_1_1", "treat_1_2"]);
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }

    #[test]
    fn given_nested_branches_when_classified_then_depth_counts_orders() {
        let value = json!({
            "treat_text": ["Root."],
            "next_ord_treats": {
                "treat_1": {
                    "treat_1_text": ["Mid."],
                    "next_ord_treats": {
                        "treat_1_1": ["Leaf."]
                    }
                }
            }
        });
        let node = TreatmentNode::from_json(&value).unwrap();
        assert_eq!(node.depth(), 2);
        assert_eq!(node.branch_count(), 2);
        assert_eq!(node.leaf_count(), 3);
    }

    #[test]
    fn given_branch_without_text_entry_when_classified_then_malformed() {
        let value = json!({
            "next_ord_treats": { "treat_1_1": ["Leaf."] }
        });
        let err = TreatmentNode::from_json(&value).unwrap_err();
        assert!(matches!(err, DomainError::MalformedTree { .. }));
    }

    #[test]
    fn given_branch_with_two_text_entries_when_classified_then_malformed() {
        let value = json!({
            "treat_1_text": ["A."],
            "treat_1_extra": ["B."],
            "next_ord_treats": { "treat_1_1": ["Leaf."] }
        });
        let err = TreatmentNode::from_json(&value).unwrap_err();
        assert!(err.to_string().contains("treat_1_extra"));
    }

    #[test]
    fn given_empty_next_order_when_classified_then_malformed() {
        let value = json!({
            "treat_1_text": ["A."],
            "next_ord_treats": {}
        });
        assert!(TreatmentNode::from_json(&value).is_err());
    }

    #[test]
    fn given_forest_with_plain_object_entry_when_classified_then_malformed() {
        // An object entry inside a forest must be a branch; a bare nested
        // forest has no selection semantics at that position.
        let value = json!({
            "treat_1_text": ["A."],
            "treat_2": { "treat_2_text": ["B."] }
        });
        let err = TreatmentNode::from_json(&value).unwrap_err();
        assert!(err.to_string().contains("treat_2"));
    }

    #[test]
    fn given_non_object_root_when_classified_then_malformed() {
        let err = TreatmentNode::from_json(&json!(["not", "a", "tree"])).unwrap_err();
        assert!(matches!(err, DomainError::MalformedTree { .. }));
    }

    #[test]
    fn given_array_with_non_string_when_classified_then_malformed() {
        let value = json!({ "treat_1_text": ["ok", 3] });
        let err = TreatmentNode::from_json(&value).unwrap_err();
        assert!(err.to_string().contains("treat_1_text"));
    }

    #[test]
    fn given_results_object_when_built_then_treatments_mirror_key_order() {
        let results = ResultsObject::new(vec![
            (TreatKey::new("treat_text"), vec!["Root.".to_string()]),
            (TreatKey::new("treat_1"), vec!["Leaf.".to_string()]),
        ]);
        let keys: Vec<_> = results.treatments().iter().map(TreatKey::raw).collect();
        assert_eq!(keys, vec!["treat_text", "treat_1"]);
        assert_eq!(
            results.get(&TreatKey::new("treat_1")),
            Some(&["Leaf.".to_string()][..])
        );
    }
}
