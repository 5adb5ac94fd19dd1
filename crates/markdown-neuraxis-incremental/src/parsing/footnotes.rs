use std::{collections::HashMap, sync::Arc};

use crate::model::{Node, NodeKind};

pub(crate) const REFERENCE: &str = "footnote_reference";
pub(crate) const DEFINITION: &str = "footnote_definition";

/// Cross-links footnote references and definitions in a freshly built tree.
///
/// References get `defined=true|false`, definitions get `references=<count>`. Labels are
/// matched case-insensitively, as the grammar does.
pub(crate) fn link(root: &mut Node) {
    let mut references: HashMap<String, usize> = HashMap::new();
    let mut definitions: HashMap<String, usize> = HashMap::new();
    for node in root.descendants() {
        if let Some(label) = label_of(node, REFERENCE) {
            *references.entry(label).or_default() += 1;
        } else if let Some(label) = label_of(node, DEFINITION) {
            *definitions.entry(label).or_default() += 1;
        }
    }
    if references.is_empty() && definitions.is_empty() {
        return;
    }
    annotate(root, &references, &definitions);
}

fn annotate(
    node: &mut Node,
    references: &HashMap<String, usize>,
    definitions: &HashMap<String, usize>,
) {
    if let Some(label) = label_of(node, REFERENCE) {
        let defined = definitions.contains_key(&label);
        node.metadata
            .insert("defined".to_string(), defined.to_string());
    } else if let Some(label) = label_of(node, DEFINITION) {
        let count = references.get(&label).copied().unwrap_or(0);
        node.metadata
            .insert("references".to_string(), count.to_string());
    }
    for child in &mut node.children {
        // Freshly built: the Arc is unique, so this never clones.
        annotate(Arc::make_mut(child), references, definitions);
    }
}

fn label_of(node: &Node, custom: &str) -> Option<String> {
    match &node.kind {
        NodeKind::Custom(name) if name == custom => {
            node.metadata.get("label").map(|l| l.to_lowercase())
        }
        _ => None,
    }
}
