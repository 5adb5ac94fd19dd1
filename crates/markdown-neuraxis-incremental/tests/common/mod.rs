use markdown_neuraxis_incremental::{Document, Node, TextRange};

/// Kind, range and content of every node in pre-order, with depth. Ids are left out.
#[allow(dead_code)]
pub fn signature(doc: &Document) -> Vec<(usize, String, TextRange, String)> {
    let mut out = Vec::new();
    walk(&doc.root, 0, &mut |depth, node| {
        out.push((depth, node.kind.to_string(), node.range, node.content.clone()));
    });
    out
}

/// Block kinds only, with depth.
#[allow(dead_code)]
pub fn block_shape(doc: &Document) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    walk(&doc.root, 0, &mut |depth, node| {
        if node.is_block() {
            out.push((depth, node.kind.to_string()));
        }
    });
    out
}

/// Panics when a child escapes its parent or siblings overlap.
#[allow(dead_code)]
pub fn assert_ranges_nest(doc: &Document) {
    assert_eq!(doc.root.range, TextRange::new(0, doc.len_utf16()));
    walk(&doc.root, 0, &mut |_, node| {
        let mut previous_end = node.range.start;
        for child in &node.children {
            assert!(
                node.range.contains_range(child.range),
                "{} {} escapes {} {}",
                child.kind,
                child.range,
                node.kind,
                node.range
            );
            assert!(
                child.range.start >= previous_end,
                "{} {} overlaps its previous sibling",
                child.kind,
                child.range
            );
            previous_end = child.range.end;
        }
    });
}

fn walk(node: &Node, depth: usize, visit: &mut impl FnMut(usize, &Node)) {
    visit(depth, node);
    for child in &node.children {
        walk(child, depth + 1, visit);
    }
}

/// UTF-16 offset of the first occurrence of `needle`.
#[allow(dead_code)]
pub fn utf16_offset_of(source: &str, needle: &str) -> usize {
    let byte = source.find(needle).expect("needle in source");
    source[..byte].encode_utf16().count()
}
