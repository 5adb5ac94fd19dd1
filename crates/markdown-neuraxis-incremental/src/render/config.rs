use serde::{Deserialize, Serialize};

use super::style::ColorToken;

/// Color tokens for each semantic role the renderer styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub text: ColorToken,
    /// De-emphasized syntax markers.
    pub muted: ColorToken,
    pub link: ColorToken,
    pub code_background: ColorToken,
    pub quote: ColorToken,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: ColorToken::new("#1f2328"),
            muted: ColorToken::new("#8c959f"),
            link: ColorToken::new("#0969da"),
            code_background: ColorToken::new("#f6f8fa"),
            quote: ColorToken::new("#57606a"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfiguration {
    /// Show raw markdown: no syntax marker is muted or flagged as hideable.
    pub source_mode: bool,
    pub theme: Theme,
    /// Font scale for heading levels 1 to 6.
    pub heading_scale_percent: [u16; 6],
}

impl Default for RenderConfiguration {
    fn default() -> Self {
        Self {
            source_mode: false,
            theme: Theme::default(),
            heading_scale_percent: [200, 160, 130, 115, 100, 90],
        }
    }
}

impl RenderConfiguration {
    pub fn heading_scale(&self, level: u8) -> u16 {
        let index = usize::from(level.clamp(1, 6)) - 1;
        self.heading_scale_percent[index]
    }
}
