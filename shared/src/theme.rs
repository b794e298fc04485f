//! 主题模型
//!
//! 主题由名称和一组 CSS 类组成。明暗判定是派生值，不做存储。

use crate::STORAGE_THEME_PREFIX;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    /// 视觉样式描述（Tailwind 类）
    #[serde(rename = "class")]
    pub class: String,
}

impl Theme {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
        }
    }

    /// 明暗判定，按顺序匹配第一条成立的规则：
    /// 名称含 light → 亮；名称含 dark → 暗；浅色类 → 亮；深色类 → 暗；否则暗
    pub fn is_light(&self) -> bool {
        let name = self.name.to_lowercase();
        if name.contains("light") {
            return true;
        }
        if name.contains("dark") {
            return false;
        }
        if self.class.contains("text-gray-900") || self.class.contains("bg-gray-100") {
            return true;
        }
        if self.class.contains("text-white") || self.class.contains("bg-gray-900") {
            return false;
        }
        false
    }
}

impl Default for Theme {
    fn default() -> Self {
        let (name, class) = PRESETS[0];
        Self::new(name, class)
    }
}

/// 主题的本地存储键：`app-theme-<userId>`，无身份时为 `app-theme-default`
pub fn storage_key(user_id: Option<&str>) -> String {
    match user_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("{}-{}", STORAGE_THEME_PREFIX, id),
        None => format!("{}-default", STORAGE_THEME_PREFIX),
    }
}

pub const PRESETS: [(&str, &str); 26] = [
    (
        "Default Gradient",
        "bg-gradient-to-br from-indigo-900 via-purple-950 to-pink-900 text-white",
    ),
    ("Ocean Breeze", "bg-gradient-to-br from-cyan-500 to-blue-600 text-white"),
    (
        "Sunset Glow",
        "bg-gradient-to-br from-orange-400 via-pink-500 to-purple-600 text-white",
    ),
    ("Dark Mode", "bg-gray-900 text-white"),
    ("Light Mode", "bg-gray-100 text-gray-900"),
    (
        "Cosmic Nebula",
        "bg-gradient-to-br from-purple-900 via-blue-900 to-black text-white",
    ),
    (
        "Forest Aurora",
        "bg-gradient-to-br from-green-800 via-teal-600 to-blue-800 text-white",
    ),
    (
        "Fire Ember",
        "bg-gradient-to-br from-red-900 via-orange-800 to-yellow-600 text-white",
    ),
    (
        "Arctic Ice",
        "bg-gradient-to-br from-blue-200 via-cyan-300 to-white text-gray-900",
    ),
    (
        "Golden Hour",
        "bg-gradient-to-br from-yellow-400 via-orange-500 to-red-600 text-white",
    ),
    (
        "Midnight Abyss",
        "bg-gradient-to-br from-black via-purple-900 to-red-900 text-white",
    ),
    (
        "Neon Glow",
        "bg-gradient-to-br from-pink-500 via-blue-500 to-green-500 text-white",
    ),
    (
        "Pastel Dream",
        "bg-gradient-to-br from-pink-100 via-blue-100 to-green-100 text-gray-800",
    ),
    (
        "Retro Synthwave",
        "bg-gradient-to-br from-purple-600 via-pink-600 to-cyan-600 text-white",
    ),
    (
        "Nature Zen",
        "bg-gradient-to-br from-green-300 via-blue-200 to-teal-300 text-gray-800",
    ),
    (
        "Cyberpunk Neon",
        "bg-black bg-gradient-to-br from-green-400 via-pink-500 to-purple-600 text-white",
    ),
    (
        "Desert Mirage",
        "bg-gradient-to-br from-yellow-300 via-orange-400 to-red-500 text-white",
    ),
    (
        "Forest Whisper",
        "bg-gradient-to-br from-green-900 via-brown-800 to-black text-white",
    ),
    (
        "Ice Crystal",
        "bg-gradient-to-br from-blue-100 via-cyan-200 to-white text-gray-900",
    ),
    (
        "Royal Velvet",
        "bg-gradient-to-br from-purple-900 via-gold-600 to-black text-white",
    ),
    (
        "Electric Vibes",
        "bg-gradient-to-br from-purple-500 via-pink-500 to-yellow-400 text-white",
    ),
    (
        "Tropical Sunset",
        "bg-gradient-to-br from-yellow-400 via-red-400 to-pink-500 text-white",
    ),
    (
        "Mystic Forest",
        "bg-gradient-to-br from-green-700 via-green-900 to-black text-white",
    ),
    (
        "Solar Flare",
        "bg-gradient-to-br from-red-600 via-orange-600 to-yellow-500 text-white",
    ),
    (
        "Deep Ocean",
        "bg-gradient-to-br from-blue-800 via-blue-900 to-black text-white",
    ),
    (
        "Lavender Dream",
        "bg-gradient-to-br from-purple-300 via-pink-300 to-white text-gray-900",
    ),
];

pub fn presets() -> Vec<Theme> {
    PRESETS
        .iter()
        .map(|(name, class)| Theme::new(*name, *class))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn presets_are_distinct_and_classified() {
        let all = presets();
        assert_eq!(all.len(), 26);
        let names: HashSet<_> = all.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), 26);

        // 判定是确定性的
        for t in &all {
            assert_eq!(t.is_light(), t.clone().is_light());
        }

        let light: Vec<_> = all.iter().filter(|t| t.is_light()).map(|t| t.name.as_str()).collect();
        assert_eq!(
            light,
            vec!["Light Mode", "Arctic Ice", "Ice Crystal", "Lavender Dream"]
        );
    }

    #[test]
    fn name_rules_win_over_classes() {
        assert!(Theme::new("My LIGHT theme", "bg-gray-900 text-white").is_light());
        assert!(!Theme::new("Dark paper", "bg-gray-100 text-gray-900").is_light());
        assert!(!Theme::new("Plain", "").is_light());
        assert!(Theme::new("Plain", "bg-gray-100").is_light());
    }

    #[test]
    fn storage_key_is_per_user() {
        assert_eq!(storage_key(Some("u42")), "app-theme-u42");
        assert_eq!(storage_key(None), "app-theme-default");
        assert_eq!(storage_key(Some("")), "app-theme-default");
    }

    #[test]
    fn default_is_first_preset() {
        assert_eq!(Theme::default().name, "Default Gradient");
        assert!(!Theme::default().is_light());
    }
}
