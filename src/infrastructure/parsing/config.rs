//! Structural signatures for the training site
//!
//! Every region the parsers look for is described here as an ordered list of
//! CSS selectors. A change in the site's markup only needs an edit to these
//! lists (or to the `signatures` section of the configuration file).

use serde::{Deserialize, Serialize};

/// All structural signatures used by the parsers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureRules {
    pub navigation: NavigationSignature,
    pub content: ContentSignature,
}

/// Signatures for the module index page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSignature {
    /// Container holding the unit list; first match wins
    pub container: Vec<String>,

    /// Unit entries inside the container; first selector with matches wins
    pub entry: Vec<String>,

    /// Link inside an entry; tried in order per entry
    pub link: Vec<String>,

    /// Module title on the index page
    pub module_title: Vec<String>,
}

/// Signatures for section pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSignature {
    /// Main content region; first match wins
    pub region: Vec<String>,

    /// Chrome removed from inside the region
    pub chrome: Vec<String>,

    /// Section title inside the region; the match is removed from the body
    pub title: Vec<String>,

    /// Title fallback searched in the whole document
    pub page_title: Vec<String>,
}

impl Default for NavigationSignature {
    fn default() -> Self {
        Self {
            container: vec!["ul#unit-list".to_string(), "ol#unit-list".to_string()],
            entry: vec!["li.module-unit".to_string(), "li".to_string()],
            link: vec!["div.barLink a[href]".to_string(), "a[href]".to_string()],
            module_title: vec!["h1".to_string(), "title".to_string()],
        }
    }
}

impl Default for ContentSignature {
    fn default() -> Self {
        Self {
            region: vec![
                "main".to_string(),
                "[role='main']".to_string(),
                "div.content".to_string(),
                ".main-content".to_string(),
                "article".to_string(),
                ".markdown-body".to_string(),
            ],
            chrome: vec![
                // Non-content markup
                "script".to_string(),
                "style".to_string(),
                "noscript".to_string(),
                "template".to_string(),
                // Embedded players and form widgets
                "iframe".to_string(),
                "object".to_string(),
                "embed".to_string(),
                "video".to_string(),
                "audio".to_string(),
                "canvas".to_string(),
                "svg".to_string(),
                "button".to_string(),
                "input".to_string(),
                "select".to_string(),
                "textarea".to_string(),
                // Site header and footer
                "[role='banner']".to_string(),
                "[role='contentinfo']".to_string(),
                "header.site-header".to_string(),
                "footer.site-footer".to_string(),
                "#site-header".to_string(),
                "#footer".to_string(),
                // Breadcrumb trails
                "nav[aria-label='Breadcrumb']".to_string(),
                "nav.breadcrumbs".to_string(),
                ".breadcrumb".to_string(),
                "[data-bi-name='breadcrumb']".to_string(),
                // Feedback widgets
                "#feedback-section".to_string(),
                ".feedback-section".to_string(),
                "[data-bi-name='feedback']".to_string(),
                // Next/previous controls
                ".next-unit".to_string(),
                ".previous-unit".to_string(),
                ".unit-navigation".to_string(),
                "[data-bi-name='next-unit']".to_string(),
                "[data-bi-name='previous-unit']".to_string(),
                // Unit list duplicated from the index
                "#unit-list".to_string(),
                "[data-bi-name='unit-list']".to_string(),
                // Achievement, progress and completion boxes
                "div.achievements".to_string(),
                "div.progress".to_string(),
                "div.completion".to_string(),
                "div.module-completion".to_string(),
            ],
            title: vec!["h1".to_string()],
            page_title: vec!["title".to_string()],
        }
    }
}
