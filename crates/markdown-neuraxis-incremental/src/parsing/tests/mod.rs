//! Integration tests for the parsing module.
//!
//! Fixtures (.md) live in `fixtures/`; their expected trees are inline `insta` snapshots of
//! the indented outline produced by [`normalize::dump`].


use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::{
    model::{Document, NodeKind, TextRange},
    parsing::{MarkdownParser, ParserConfiguration, parse},
};

fn fixture(name: &str) -> Document {
    let path = format!(
        "{}/src/parsing/tests/fixtures/{name}.md",
        env!("CARGO_MANIFEST_DIR")
    );
    let md = std::fs::read_to_string(&path).unwrap();
    let doc = parse(md.as_str());
    invariants::check(&doc);
    doc
}

// Fixture-based snapshot tests

#[test]
fn fixture_headings_and_emphasis() {
    let doc = fixture("headings_and_emphasis");
    assert_snapshot!(normalize::dump(&doc.root), @r#"
    document
      heading(1)
        text "Title"
      paragraph
        text "Some "
        emphasis
          text "emphasis"
        text " and "
        strong
          text "strong"
        text " text."
      heading(2)
        text "Second"
    "#);
}

#[test]
fn fixture_nested_lists() {
    let doc = fixture("nested_lists");
    assert_snapshot!(normalize::dump(&doc.root), @r#"
    document
      list(bullet)
        list_item
          text "one"
        list_item
          text "two"
          list(bullet)
            list_item
              text "nested"
      list(ordered) [start=1]
        list_item
          text "first"
        list_item
          text "second"
    "#);
}

#[test]
fn fixture_quote_and_fence() {
    let doc = fixture("quote_and_fence");
    assert_snapshot!(normalize::dump(&doc.root), @r#"
    document
      blockquote
        paragraph
          text "quoted "
          emphasis
            text "text"
          soft_break
          text "continues"
      code_block(rust) "fn main() {}\n" [fence=true]
    "#);
}

#[test]
fn fixture_links_and_images() {
    let doc = fixture("links_and_images");
    assert_snapshot!(normalize::dump(&doc.root), @r#"
    document
      paragraph
        text "See "
        link(https://example.com)
          text "the docs"
        text " and "
        image(logo.png) "logo"
        text "."
    "#);
}

#[test]
fn fixture_tables_and_strikethrough() {
    let doc = fixture("tables_and_strikethrough");
    assert_snapshot!(normalize::dump(&doc.root), @r#"
    document
      paragraph
        text "Some "
        strikethrough
          text "old"
        text " text."
      table [alignments=none,none]
        table_row [header=true]
          table_cell
            text "a"
          table_cell
            text "b"
        table_row
          table_cell
            text "1"
          table_cell
            text "2"
    "#);
}

// Behaviour tests

#[test]
fn single_heading() {
    let doc = parse("# Heading 1");
    assert_eq!(doc.root.children.len(), 1);
    let heading = &doc.root.children[0];
    assert_eq!(heading.kind, NodeKind::Heading { level: 1 });
    assert_eq!(heading.children[0].kind, NodeKind::Text);
    assert_eq!(heading.children[0].content, "Heading 1");
}

#[test]
fn flat_bullet_list() {
    let doc = parse("- a\n- b\n- c");
    assert_eq!(doc.root.children.len(), 1);
    let list = &doc.root.children[0];
    assert_eq!(list.kind, NodeKind::List { ordered: false });
    assert_eq!(list.children.len(), 3);
    assert!(list.children.iter().all(|c| c.kind == NodeKind::ListItem));
}

#[test]
fn strong_nested_in_emphasis() {
    let doc = parse("*italic and **bold** text*");
    assert_eq!(doc.root.children.len(), 1);
    let para = &doc.root.children[0];
    assert_eq!(para.children.len(), 1);
    let emphasis = &para.children[0];
    assert_eq!(emphasis.kind, NodeKind::Emphasis);
    assert!(emphasis.children.iter().any(|c| c.kind == NodeKind::Strong));
}

#[rstest]
#[case("")]
#[case("\n\n\n")]
#[case("# Heading 1")]
#[case("*unclosed **bold [link](")]
#[case("> > deeply\n> nested\n\n    indented code\n")]
#[case("<div>\n*not parsed*\n</div>\n")]
#[case("héllo 🦀 wörld\n\n- ünïcode\n")]
#[case("---\ntitle: x\n---\n# After\n")]
#[case("Term[^1]\n\n[^1]: def\n")]
fn source_round_trips_and_ranges_hold(#[case] source: &str) {
    let doc = parse(source);
    assert_eq!(&*doc.source, source);
    invariants::check(&doc);
}

#[test]
fn empty_document_has_no_blocks() {
    let doc = parse("");
    assert!(doc.root.children.is_empty());
    assert_eq!(doc.root.range, TextRange::new(0, 0));
}

#[test]
fn ranges_are_utf16() {
    let doc = parse("# 🦀 crab\n");
    let text = &doc.root.children[0].children[0];
    assert_eq!(text.content, "🦀 crab");
    assert_eq!(text.range, TextRange::new(2, 9));
}

#[test]
fn front_matter_fields_become_metadata() {
    let doc = parse("---\ntitle: Notes\ntags: draft\n---\n\nBody.\n");
    let front = &doc.root.children[0];
    assert_eq!(front.kind, NodeKind::FrontMatter);
    assert_eq!(front.metadata.get("title").map(String::as_str), Some("Notes"));
    assert_eq!(front.metadata.get("tags").map(String::as_str), Some("draft"));
    assert_eq!(front.metadata.get("format").map(String::as_str), Some("yaml"));
    assert_eq!(doc.root.children[1].kind, NodeKind::Paragraph);
}

#[test]
fn disabled_extensions_fall_back_to_text() {
    let parser = MarkdownParser::new(ParserConfiguration::commonmark());

    let doc = parser.parse("| a |\n|---|\n");
    assert_eq!(doc.root.children[0].kind, NodeKind::Paragraph);

    let doc = parser.parse("~~x~~");
    assert_eq!(doc.root.children[0].plain_text(), "~~x~~");
}

#[test]
fn node_at_finds_text_under_cursor() {
    let doc = parse("# Title\n\nSome *text* here.\n");
    let node = doc.node_at(15).expect("node under cursor");
    assert_eq!(node.kind, NodeKind::Text);
    assert_eq!(node.content, "text");
    let block = doc.block_at(15).expect("block under cursor");
    assert_eq!(block.kind, NodeKind::Paragraph);
}

#[test]
fn cursor_at_end_resolves_last_element() {
    let doc = parse("# Title");
    assert_eq!(doc.node_at(7).map(|n| &n.kind), Some(&NodeKind::Text));
    assert!(doc.node_at(8).is_none());
}
