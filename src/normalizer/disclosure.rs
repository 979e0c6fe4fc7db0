pub const SENSITIVE_LABEL: &str = "Sensitive Content (click to view)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisclosureMode {
    None,
    Sensitive,
    Summary,
}

/// Whether a note body is hidden behind a disclosure toggle, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureState {
    pub mode: DisclosureMode,
    pub label: String,
    pub collapsed_by_default: bool,
    pub expanded: bool,
}

impl DisclosureState {
    /// Sensitive wins over summary; the two never combine.
    pub fn for_note(sensitive: bool, summary: Option<&str>) -> Self {
        if sensitive {
            Self::collapsed(DisclosureMode::Sensitive, SENSITIVE_LABEL)
        } else if let Some(summary) = summary.filter(|s| !s.is_empty()) {
            Self::collapsed(DisclosureMode::Summary, summary)
        } else {
            Self {
                mode: DisclosureMode::None,
                label: String::new(),
                collapsed_by_default: false,
                expanded: true,
            }
        }
    }

    fn collapsed(mode: DisclosureMode, label: &str) -> Self {
        Self {
            mode,
            label: label.to_string(),
            collapsed_by_default: true,
            expanded: false,
        }
    }

    pub fn is_gated(&self) -> bool {
        self.mode != DisclosureMode::None
    }

    pub fn is_collapsed(&self) -> bool {
        self.is_gated() && !self.expanded
    }

    /// Flips the expansion state. Ungated content is always shown.
    pub fn toggle(&mut self) {
        if self.is_gated() {
            self.expanded = !self.expanded;
        }
    }

    /// "Show more"/"Show less" affordance for summarized notes.
    pub fn toggle_text(&self) -> Option<&'static str> {
        match (self.mode, self.expanded) {
            (DisclosureMode::Summary, false) => Some("Show more"),
            (DisclosureMode::Summary, true) => Some("Show less"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_takes_precedence() {
        let state = DisclosureState::for_note(true, Some("cw: food"));
        assert_eq!(state.mode, DisclosureMode::Sensitive);
        assert_eq!(state.label, SENSITIVE_LABEL);
        assert!(state.collapsed_by_default);
        assert!(state.is_collapsed());
    }

    #[test]
    fn test_summary_label() {
        let state = DisclosureState::for_note(false, Some("A title"));
        assert_eq!(state.mode, DisclosureMode::Summary);
        assert_eq!(state.label, "A title");
        assert_eq!(state.toggle_text(), Some("Show more"));
    }

    #[test]
    fn test_plain() {
        let state = DisclosureState::for_note(false, None);
        assert_eq!(state.mode, DisclosureMode::None);
        assert!(!state.collapsed_by_default);
        assert!(!state.is_collapsed());
        assert_eq!(DisclosureState::for_note(false, Some("")).mode, DisclosureMode::None);
    }

    #[test]
    fn test_toggle() {
        let mut state = DisclosureState::for_note(false, Some("A title"));
        state.toggle();
        assert!(!state.is_collapsed());
        assert_eq!(state.toggle_text(), Some("Show less"));
        state.toggle();
        assert!(state.is_collapsed());

        let mut plain = DisclosureState::for_note(false, None);
        plain.toggle();
        assert!(!plain.is_collapsed());
        assert_eq!(plain.toggle_text(), None);
    }
}
