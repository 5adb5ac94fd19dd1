use pulldown_cmark::Options;
use serde::{Deserialize, Serialize};

/// Grammar extensions layered on top of CommonMark.
///
/// Each flag is a straight pass-through to a pulldown-cmark option, so toggling one never
/// changes how the base grammar behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfiguration {
    /// GFM pipe tables.
    pub tables: bool,
    /// GFM `~~strikethrough~~`.
    pub strikethrough: bool,
    /// GFM `- [ ]` / `- [x]` task list markers.
    pub task_lists: bool,
    /// `[^id]` references and `[^id]: ...` definitions.
    pub footnotes: bool,
    /// `---` (YAML) and `+++` (TOML) metadata blocks at the top of the document.
    pub front_matter: bool,
    /// `$inline$` and `$$display$$` math.
    pub math: bool,
    /// Curly quotes and dashes in text content. Ranges are unaffected.
    pub smart_punctuation: bool,
}

impl Default for ParserConfiguration {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: true,
            footnotes: true,
            front_matter: true,
            math: true,
            smart_punctuation: false,
        }
    }
}

impl ParserConfiguration {
    /// Plain CommonMark with every extension switched off.
    pub fn commonmark() -> Self {
        Self {
            tables: false,
            strikethrough: false,
            task_lists: false,
            footnotes: false,
            front_matter: false,
            math: false,
            smart_punctuation: false,
        }
    }

    pub fn options(&self) -> Options {
        let mut options = Options::empty();
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.front_matter {
            options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
            options.insert(Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS);
        }
        if self.math {
            options.insert(Options::ENABLE_MATH);
        }
        if self.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }
}
