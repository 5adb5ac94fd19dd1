// Shared by the bench targets; each target compiles its own copy and uses a subset, so
// unused-item warnings are silenced per item.

/// Where a benchmarked keystroke lands inside one entry of [`notes_document`].
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum EditPoint {
    Paragraph,
    ListItem,
    FenceBody,
    QuoteText,
}

#[allow(dead_code)]
impl EditPoint {
    pub const ALL: [EditPoint; 4] = [
        EditPoint::Paragraph,
        EditPoint::ListItem,
        EditPoint::FenceBody,
        EditPoint::QuoteText,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EditPoint::Paragraph => "paragraph",
            EditPoint::ListItem => "list_item",
            EditPoint::FenceBody => "fence_body",
            EditPoint::QuoteText => "quote_text",
        }
    }

    /// Text unique to `entry`, edited right after its first character.
    fn anchor(self, entry: usize) -> String {
        match self {
            EditPoint::Paragraph => format!("observed {entry} times"),
            EditPoint::ListItem => format!("follow up {entry} "),
            EditPoint::FenceBody => format!("let total_{entry} "),
            EditPoint::QuoteText => format!("noted in {entry} "),
        }
    }
}

/// A notes file of `entries` dated sections, each around half a kilobyte: a paragraph
/// with inline markup, a nested task list, a quote and a fenced code block, with a table
/// every tenth entry. Plain ASCII, so byte and UTF-16 offsets agree.
#[allow(dead_code)]
pub fn notes_document(entries: usize) -> String {
    let mut out = String::with_capacity(entries * 560);
    out.push_str("# Field notes\n\n");
    for n in 0..entries {
        out.push_str(&format!("## Day {n}\n\n"));
        out.push_str(&format!(
            "The sensor drift was observed {n} times, mostly *after* the **night** \
             calibration. See [the log](https://example.com/log/{n}) and `drift::check`.\n\n"
        ));
        out.push_str(&format!(
            "- [x] replace cable {n}\n- [ ] follow up {n} with the vendor\n  \
             - ask about firmware\n  - compare with day {}\n\n",
            n.saturating_sub(1)
        ));
        out.push_str(&format!("> Battery was noted in {n} as ~~low~~ stable.\n\n"));
        out.push_str(&format!(
            "```rust\nlet total_{n} = readings.iter().sum::<f64>();\nassert!(total_{n} > 0.0);\n```\n\n"
        ));
        if n % 10 == 0 {
            out.push_str("| sensor | value |\n|---|---:|\n| a | 1.5 |\n| b | 2.25 |\n\n");
        }
    }
    out
}

/// UTF-16 offset inside `entry`'s block for `point`, one character into its anchor text.
#[allow(dead_code)]
pub fn edit_offset(document: &str, entry: usize, point: EditPoint) -> usize {
    let anchor = point.anchor(entry);
    document.find(&anchor).map_or(0, |at| at + 1)
}
