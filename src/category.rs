//! Application category mapping

use crate::types::{Category, UNKNOWN_APP};

/// Keyword table, checked in order; the first category with a matching
/// keyword wins. Keywords are lowercase.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Editor,
        &[
            "code", "studio", "pycharm", "intellij", "sublime", "notepad", "vim", "terminal",
            "powershell", "cmd", "antigravity",
        ],
    ),
    (
        Category::Browser,
        &["chrome", "firefox", "edge", "brave", "opera", "safari", "explorer"],
    ),
    (
        Category::Messaging,
        &[
            "slack", "discord", "teams", "whatsapp", "telegram", "signal", "messenger", "outlook",
            "mail",
        ],
    ),
    (
        Category::Video,
        &["youtube", "netflix", "vlc", "twitch", "player", "movie"],
    ),
    (
        Category::Design,
        &["figma", "photoshop", "illustrator", "blender", "canva", "paint", "gimp"],
    ),
    (
        Category::Game,
        &["steam", "league", "valorant", "minecraft", "roblox", "game", "unity", "unreal"],
    ),
    (
        Category::Notes,
        &["notion", "obsidian", "onenote", "evernote", "keep"],
    ),
];

/// Maps free-text window labels to the fixed taxonomy
pub struct CategoryMapper;

impl CategoryMapper {
    /// Case-insensitive substring match; blank and unknown labels map to `Other`
    pub fn map(app: &str) -> Category {
        let app = app.trim();
        if app.is_empty() || app == UNKNOWN_APP {
            return Category::Other;
        }
        let app = app.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| app.contains(kw)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }
}
