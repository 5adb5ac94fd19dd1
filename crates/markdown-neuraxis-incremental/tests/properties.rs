use std::{sync::Arc, thread};

use markdown_neuraxis_incremental::{
    ChangeType, Document, EditDescriptor, IncrementalParser, MarkdownParser, ParserState,
    ReparseStrategy, ReparseThresholds, SourcePreservingRenderer, compute_incremental_update,
    diff, parse,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

const SAMPLES: &[&str] = &[
    "",
    "\n\n\n",
    "# Heading 1",
    "Title\n=====\n\nBody\n",
    "- a\n- b\n  - nested *em*\n\n1. one\n2. two\n",
    "> quote\n> > deeper\n>\n> - listed\n",
    "```rust\nfn main() {}\n```\n\n    indented\n",
    "| a | b |\n|:-:|---|\n| 1 | ~~2~~ |\n",
    "---\ntitle: Notes\n---\n\n# Body\n",
    "Text[^n] more.\n\n[^n]: The note.\n",
    "- [ ] todo\n- [x] done\n",
    "<div>\nraw\n</div>\n\ninline <b>tag</b> and $x^2$\n",
    "Ünïcödé 🦀🦀 text with `code` and [link](https://example.com \"t\")\n",
    "crlf line\r\nsecond\r\n\r\n# head\r\n",
    "* * *\n\n![alt *text*](img.png)\n",
];

fn localizing() -> IncrementalParser {
    IncrementalParser::new(MarkdownParser::default(), ReparseThresholds::always_localize())
}

#[test]
fn parse_and_render_preserve_source() {
    let renderer = SourcePreservingRenderer::default();
    for source in SAMPLES {
        let doc = parse(*source);
        assert_eq!(&*doc.source, *source);
        assert_eq!(renderer.render(&doc).text(), *source);
    }
}

#[test]
fn diff_against_itself_is_unchanged() {
    for source in SAMPLES {
        let doc = parse(*source);
        let results = diff(&doc, &doc);
        assert_eq!(results.len(), doc.root.descendants().count());
        assert!(results.iter().all(|r| r.change_type == ChangeType::Unchanged));
    }
}

#[test]
fn ranges_nest_for_every_sample() {
    for source in SAMPLES {
        common::assert_ranges_nest(&parse(*source));
    }
}

#[rstest]
#[case::paragraph_text("Intro.\n\n# Head\n\nSome body text here.\n", "body", " more")]
#[case::heading_text("Intro.\n\n# Head\n\nBody.\n", "Head", "er")]
#[case::list_item("- one\n- two\n- three\n", "two", "ty")]
#[case::quoted("> quoted words\n\nAfter.\n", "words", "!")]
#[case::code_body("```\nlet x = 1;\n```\n\nAfter.\n", "1", "2")]
#[case::emphasis_inside("Plain *emph* plain.\n\nNext.\n", "emph", "asis")]
fn single_block_edit_matches_full_parse(
    #[case] source: &str,
    #[case] anchor: &str,
    #[case] insert: &str,
) {
    let old = parse(source);
    let at = common::utf16_offset_of(source, anchor) + 1;
    let edit = EditDescriptor::insert(at, insert);
    let new_source = edit.apply(source);

    let (incremental, strategy) =
        localizing().parse_incremental_with_strategy(&old, edit.range, new_source.as_str());
    let full = parse(new_source.as_str());

    assert_eq!(strategy, ReparseStrategy::Localized);
    assert_eq!(common::block_shape(&incremental), common::block_shape(&full));
    assert_eq!(common::signature(&incremental), common::signature(&full));
    common::assert_ranges_nest(&incremental);
}

const FENCED: &str = "Intro\n\n```rust\nlet x = 1;\n```\n\nAfter para.\n";

/// Edits to delimiters and markers change what surrounds the block, so they must re-parse
/// the whole document.
#[rstest]
#[case::fence_lengthened(FENCED, 7, 7, "`")]
#[case::fence_info_string(FENCED, 10, 14, "python")]
#[case::closing_fence_deleted(FENCED, 26, 29, "")]
#[case::comment_terminator_removed("<!-- note -->\n\nAfter.\n", 10, 13, "")]
#[case::bullet_swapped("- alpha\n- beta\n- gamma\n", 8, 9, "*")]
#[case::ordered_delimiter_swapped("1. a\n2. b\n3. c\n", 6, 7, ")")]
#[case::heading_level_lowered("Intro.\n\n## Head\n\nBody.\n", 8, 9, "")]
#[case::heading_level_raised("Intro.\n\n## Head\n\nBody.\n", 8, 8, "#")]
#[case::quote_marker_removed("> first\n> second\n\nAfter.\n", 8, 9, "")]
fn markup_edit_matches_full_parse(
    #[case] source: &str,
    #[case] start: usize,
    #[case] end: usize,
    #[case] replacement: &str,
) {
    let old = parse(source);
    let edit = EditDescriptor::new(start..end, replacement);
    let new_source = edit.apply(source);

    let (incremental, strategy) =
        localizing().parse_incremental_with_strategy(&old, edit.range, new_source.as_str());
    let full = parse(new_source.as_str());

    assert!(matches!(strategy, ReparseStrategy::Full(_)), "{strategy}");
    assert_eq!(common::block_shape(&incremental), common::block_shape(&full));
    assert_eq!(common::signature(&incremental), common::signature(&full));
    common::assert_ranges_nest(&incremental);
}

#[rstest]
#[case("# Title\n\nBody.\n", 9, 9, "New ")]
#[case("# Title\n\nBody.\n", 0, 2, "")]
#[case("- a\n- b\n", 3, 4, "\n\n")]
#[case("abc", 3, 3, " def")]
#[case("Hello world", 6, 11, "there")]
fn affected_range_contains_edit(
    #[case] source: &str,
    #[case] start: usize,
    #[case] end: usize,
    #[case] replacement: &str,
) {
    let old = parse(source);
    let edit = EditDescriptor::new(start..end, replacement);
    let new = parse(edit.apply(source));
    let info = compute_incremental_update(&old, &new, edit.range);
    assert!(info.affected_range.contains_range(edit.range));
}

/// Two hundred paragraphs is well past the default size threshold.
fn long_document() -> String {
    (0..200)
        .map(|i| format!("Paragraph {i} has some filler words so the document grows quickly.\n\n"))
        .collect()
}

#[test]
fn large_document_edits_stay_localized_and_equivalent() {
    let source = long_document();
    let mut state = ParserState::with_source(IncrementalParser::default(), source.as_str());
    let mut at = common::utf16_offset_of(&source, "Paragraph 100 has") + "Paragraph 100".len();

    for ch in ["!", "?", "x", "y"] {
        state.apply_text_edit(EditDescriptor::insert(at, ch));
        at += 1;
        assert_eq!(state.last_strategy(), Some(ReparseStrategy::Localized));
        let full = parse(state.source());
        assert_eq!(
            common::signature(state.document()),
            common::signature(&full)
        );
    }
    assert!(state.source().contains("Paragraph 100!?xy has"));

    let untouched = &state.document().root.children[150];
    assert_eq!(untouched.plain_text(), "Paragraph 150 has some filler words so the document grows quickly.");
}

#[test]
fn documents_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Document>();
    assert_send_sync::<ParserState>();

    let shared = Arc::new(parse("# Shared\n\nRead from many threads.\n"));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let doc = Arc::clone(&shared);
            thread::spawn(move || SourcePreservingRenderer::default().render(&doc).segments().len())
        })
        .collect();
    for reader in readers {
        assert!(reader.join().expect("reader thread") > 0);
    }

    let writers: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                let mut state = ParserState::default();
                state.set_source(format!("# Buffer {i}\n"));
                state.apply_text_edit(EditDescriptor::insert(0, "Intro\n\n"));
                state.document().root.children.len()
            })
        })
        .collect();
    for writer in writers {
        assert_eq!(writer.join().expect("writer thread"), 2);
    }
}
