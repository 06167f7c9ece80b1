//! Unlocked Content Modules

use serde::{Deserialize, Serialize};

/// Reserved id marking a quick demonstration set
pub const DEMO_INFO: &str = "demo_info";

/// Reserved id marking a full trial set
pub const TEST_FULL_INFO: &str = "test_full_info";

/// A unit of unlocked content
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl Module {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// Whether this is one of the reserved marker modules
    pub fn is_marker(&self) -> bool {
        self.id == DEMO_INFO || self.id == TEST_FULL_INFO
    }
}

/// How an unlocked module set should be presented
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// Paid content
    #[default]
    Standard,

    /// Quick demonstration, offers a full trial next
    Demo,

    /// Full trial of the top tier
    FullTest,
}

impl PresentationMode {
    /// Derive the mode from the reserved ids present in a module set.
    /// A full-test marker takes precedence over a demo marker.
    pub fn detect(modules: &[Module]) -> Self {
        if modules.iter().any(|m| m.id == TEST_FULL_INFO) {
            Self::FullTest
        } else if modules.iter().any(|m| m.id == DEMO_INFO) {
            Self::Demo
        } else {
            Self::Standard
        }
    }

    pub const fn is_demo(self) -> bool {
        matches!(self, Self::Demo)
    }

    pub const fn is_full_test(self) -> bool {
        matches!(self, Self::FullTest)
    }
}

/// Open/closed state of the module reading pane
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleViewer {
    selected: Option<Module>,
}

impl ModuleViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a module, replacing whatever was shown before
    pub fn open(&mut self, module: Module) -> &Module {
        self.selected.insert(module)
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub const fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub const fn selected(&self) -> Option<&Module> {
        self.selected.as_ref()
    }

    /// Body of the open module, one entry per line
    pub fn body_lines(&self) -> Vec<&str> {
        self.selected
            .as_ref()
            .map(|m| m.content.lines().collect())
            .unwrap_or_default()
    }

    /// Plain text of the open module, for copying
    pub fn copy_text(&self) -> Option<String> {
        self.selected
            .as_ref()
            .map(|m| format!("{}\n\n{}", m.title, m.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str) -> Module {
        Module::new(id, format!("Title {id}"), "line one\nline two")
    }

    #[test]
    fn test_standard_mode() {
        let modules = vec![module("business_idea"), module("brand_name")];
        assert_eq!(PresentationMode::detect(&modules), PresentationMode::Standard);
        assert_eq!(PresentationMode::detect(&[]), PresentationMode::Standard);
    }

    #[test]
    fn test_demo_mode() {
        let modules = vec![module(DEMO_INFO), module("business_idea")];
        let mode = PresentationMode::detect(&modules);
        assert!(mode.is_demo());
        assert!(!mode.is_full_test());
    }

    #[test]
    fn test_full_test_mode() {
        let modules = vec![module(TEST_FULL_INFO), module("business_idea")];
        let mode = PresentationMode::detect(&modules);
        assert!(mode.is_full_test());
        assert!(!mode.is_demo());
    }

    #[test]
    fn test_full_test_wins_over_demo() {
        let modules = vec![module(DEMO_INFO), module(TEST_FULL_INFO)];
        assert_eq!(PresentationMode::detect(&modules), PresentationMode::FullTest);
    }

    #[test]
    fn test_marker_detection() {
        assert!(module(DEMO_INFO).is_marker());
        assert!(!module("pitch_post").is_marker());
    }

    #[test]
    fn test_viewer_lifecycle() {
        let mut viewer = ModuleViewer::new();
        assert!(!viewer.is_open());
        assert!(viewer.body_lines().is_empty());
        assert_eq!(viewer.copy_text(), None);

        viewer.open(module("pitch_post"));
        assert!(viewer.is_open());
        assert_eq!(viewer.selected().unwrap().id, "pitch_post");
        assert_eq!(viewer.body_lines(), vec!["line one", "line two"]);
        assert_eq!(
            viewer.copy_text().unwrap(),
            "Title pitch_post\n\nline one\nline two"
        );

        assert_eq!(viewer.open(module("brand_name")).id, "brand_name");
        assert_eq!(viewer.selected().unwrap().id, "brand_name");

        viewer.close();
        assert!(!viewer.is_open());
    }
}
