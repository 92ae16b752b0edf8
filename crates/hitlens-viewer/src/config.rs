use std::time::Duration;

use hitlens_core::Section;

/// How long a citation highlight stays visible.
pub const DEFAULT_HIGHLIGHT_TTL: Duration = Duration::from_secs(3);

/// Per-viewer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerConfig {
    pub highlight_ttl: Duration,
    /// Section shown before the user or a citation picks one.
    pub initial_section: Section,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            highlight_ttl: DEFAULT_HIGHLIGHT_TTL,
            initial_section: Section::FIRST,
        }
    }
}

impl ViewerConfig {
    pub fn with_highlight_ttl(mut self, ttl: Duration) -> Self {
        self.highlight_ttl = ttl;
        self
    }

    pub fn with_initial_section(mut self, section: Section) -> Self {
        self.initial_section = section;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = ViewerConfig::default()
            .with_highlight_ttl(Duration::from_millis(500))
            .with_initial_section(Section::Sources);
        assert_eq!(config.highlight_ttl, Duration::from_millis(500));
        assert_eq!(config.initial_section, Section::Sources);
        assert_eq!(ViewerConfig::default().highlight_ttl, DEFAULT_HIGHLIGHT_TTL);
    }
}
