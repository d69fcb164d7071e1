//! Target languages for generated descriptions and titles.

use std::fmt;

use tracing::warn;

/// Language used for descriptions, titles and section headings.
///
/// Branch names are always English regardless of this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    /// English.
    #[default]
    English,
    /// Simplified Chinese.
    SimplifiedChinese,
    /// Traditional Chinese.
    TraditionalChinese,
    /// Japanese.
    Japanese,
    /// Korean.
    Korean,
    /// French.
    French,
    /// German.
    German,
    /// Spanish.
    Spanish,
    /// Russian.
    Russian,
    /// Portuguese.
    Portuguese,
    /// Italian.
    Italian,
}

/// Translated merge request section headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeadings {
    /// "What changed".
    pub what_changed: &'static str,
    /// "Why".
    pub why: &'static str,
    /// "How to test".
    pub how_to_test: &'static str,
}

impl Language {
    /// Parses a language code, returning `None` for unrecognised codes.
    pub fn parse(code: &str) -> Option<Self> {
        let lang = match code.trim().to_lowercase().as_str() {
            "en" => Self::English,
            "zh-cn" | "zhcn" => Self::SimplifiedChinese,
            "zh-tw" | "zhtw" => Self::TraditionalChinese,
            "ja" => Self::Japanese,
            "ko" => Self::Korean,
            "fr" => Self::French,
            "de" => Self::German,
            "es" => Self::Spanish,
            "ru" => Self::Russian,
            "pt" => Self::Portuguese,
            "it" => Self::Italian,
            _ => return None,
        };
        Some(lang)
    }

    /// Parses a language code, falling back to English with a warning.
    pub fn from_code(code: &str) -> Self {
        Self::parse(code).unwrap_or_else(|| {
            warn!(code, "Unrecognised language code, falling back to English");
            Self::English
        })
    }

    /// Canonical language code.
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::SimplifiedChinese => "zh-cn",
            Self::TraditionalChinese => "zh-tw",
            Self::Japanese => "ja",
            Self::Korean => "ko",
            Self::French => "fr",
            Self::German => "de",
            Self::Spanish => "es",
            Self::Russian => "ru",
            Self::Portuguese => "pt",
            Self::Italian => "it",
        }
    }

    /// English name of the language, used inside prompts.
    pub fn name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::SimplifiedChinese => "Simplified Chinese",
            Self::TraditionalChinese => "Traditional Chinese",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::French => "French",
            Self::German => "German",
            Self::Spanish => "Spanish",
            Self::Russian => "Russian",
            Self::Portuguese => "Portuguese",
            Self::Italian => "Italian",
        }
    }

    /// Section headings for the merge request description.
    pub fn headings(self) -> SectionHeadings {
        let (what_changed, why, how_to_test) = match self {
            Self::English => ("What changed", "Why", "How to test"),
            Self::SimplifiedChinese => ("变更内容", "变更原因", "测试方法"),
            Self::TraditionalChinese => ("變更內容", "變更原因", "測試方法"),
            Self::Japanese => ("変更内容", "変更理由", "テスト方法"),
            Self::Korean => ("변경 사항", "변경 이유", "테스트 방법"),
            Self::French => ("Modifications", "Pourquoi", "Comment tester"),
            Self::German => ("Änderungen", "Warum", "Testanleitung"),
            Self::Spanish => ("Qué cambió", "Por qué", "Cómo probar"),
            Self::Russian => ("Что изменено", "Зачем", "Как проверить"),
            Self::Portuguese => ("O que mudou", "Por quê", "Como testar"),
            Self::Italian => ("Cosa è cambiato", "Perché", "Come testare"),
        };
        SectionHeadings {
            what_changed,
            why,
            how_to_test,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
