use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ThemeConfig;
use crate::error::ThemeError;

/// Citation of the form `(Work 12a)` or `(Work 12a-13b)`.
const CITATION_PATTERN: &str = r"\(([A-Za-z]+)\s+\d+[ab]?(?:-\d+[ab]?)?\)";

/// Work name used in headlines when no title cites one.
const VARIOUS: &str = "Various";

/// Keyword-matched content category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    TempleService,
    AggadahStories,
    HalakhaLegal,
    HistoricalFigures,
    BiblicalCommentary,
    EthicsWisdom,
    DigitalHumanities,
    LiturgyPrayer,
    TalmudicMethodology,
    SocialDynamics,
}

impl Theme {
    /// Every theme in table order.
    pub const ALL: [Theme; 10] = [
        Theme::TempleService,
        Theme::AggadahStories,
        Theme::HalakhaLegal,
        Theme::HistoricalFigures,
        Theme::BiblicalCommentary,
        Theme::EthicsWisdom,
        Theme::DigitalHumanities,
        Theme::LiturgyPrayer,
        Theme::TalmudicMethodology,
        Theme::SocialDynamics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::TempleService => "temple_service",
            Theme::AggadahStories => "aggadah_stories",
            Theme::HalakhaLegal => "halakha_legal",
            Theme::HistoricalFigures => "historical_figures",
            Theme::BiblicalCommentary => "biblical_commentary",
            Theme::EthicsWisdom => "ethics_wisdom",
            Theme::DigitalHumanities => "digital_humanities",
            Theme::LiturgyPrayer => "liturgy_prayer",
            Theme::TalmudicMethodology => "talmudic_methodology",
            Theme::SocialDynamics => "social_dynamics",
        }
    }

    /// Lowercase keywords; any one of them marks the theme.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Theme::TempleService => &["temple", "incense", "priest", "sacrifice", "yom kippur", "service"],
            Theme::AggadahStories => &["story", "stories", "anecdote", "tale", "narrative"],
            Theme::HalakhaLegal => &["law", "legal", "ritual", "boundaries", "modes", "ruling"],
            Theme::HistoricalFigures => &["rabbi", "rabban", "reish lakish", "alexander", "antoninus"],
            Theme::BiblicalCommentary => &["biblical", "bible", "ezra", "esther", "daniel", "scripture"],
            Theme::EthicsWisdom => &["advice", "guidance", "wisdom", "righteous", "moral"],
            Theme::DigitalHumanities => &["computational", "digital", "chatgpt", "ai", "algorithm", "software"],
            Theme::LiturgyPrayer => &["prayer", "liturgy", "blessing", "tefillin", "tzitzit"],
            Theme::TalmudicMethodology => &["talmudic", "methodology", "hermeneutics", "interpretation"],
            Theme::SocialDynamics => &["community", "social", "hierarchy", "relationship", "marriage"],
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive annotation of one group of documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeLabel {
    /// Headline chosen by theme precedence.
    pub title: String,
    /// One-sentence description matching the headline.
    pub significance: String,
    /// Matched themes in table order.
    pub themes: Vec<Theme>,
    /// Cited works, deduplicated in first-seen order.
    pub works: Vec<String>,
    /// Leading entries of `works`.
    pub primary_works: Vec<String>,
}

/// Tags document groups with themes and citation references.
///
/// Labeling reads titles only and never fails.
#[derive(Debug, Clone)]
pub struct ThemeLabeler {
    config: ThemeConfig,
    citation: Regex,
}

impl ThemeLabeler {
    pub fn new(config: ThemeConfig) -> Result<Self, ThemeError> {
        Ok(Self {
            config,
            citation: Regex::new(CITATION_PATTERN)?,
        })
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }

    /// Work names cited in `titles`, deduplicated in first-seen order.
    pub fn citations<S: AsRef<str>>(&self, titles: &[S]) -> Vec<String> {
        let mut works: Vec<String> = Vec::new();
        for title in titles {
            for caps in self.citation.captures_iter(title.as_ref()) {
                let work = &caps[1];
                if !works.iter().any(|w| w == work) {
                    works.push(work.to_string());
                }
            }
        }
        works
    }

    /// Themes whose keywords occur in the lowercased, space-joined titles.
    pub fn themes<S: AsRef<str>>(&self, titles: &[S]) -> Vec<Theme> {
        let text = titles
            .iter()
            .map(|t| t.as_ref())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Theme::ALL
            .into_iter()
            .filter(|theme| {
                theme.keywords().iter().any(|kw| {
                    if self.config.whole_words {
                        contains_word(&text, kw)
                    } else {
                        text.contains(kw)
                    }
                })
            })
            .collect()
    }

    /// Themes, citations and a headline for one group of titles.
    pub fn label<S: AsRef<str>>(&self, titles: &[S]) -> ThemeLabel {
        let themes = self.themes(titles);
        let works = self.citations(titles);
        let (title, significance) = headline(&themes, &works);
        let primary_works = works.iter().take(self.config.primary_works).cloned().collect();
        ThemeLabel {
            title,
            significance,
            themes,
            works,
            primary_works,
        }
    }
}

/// Picks the headline by fixed precedence. Temple and legal headlines name
/// a cited work and apply only when one exists.
fn headline(themes: &[Theme], works: &[String]) -> (String, String) {
    let has = |t: Theme| themes.contains(&t);
    let first_work = works.first();

    if has(Theme::DigitalHumanities) {
        return (
            "Digital Talmudic Studies and Computational Methods".into(),
            "Explores applications of technology and digital methods to traditional Jewish texts".into(),
        );
    }
    if let (true, Some(w)) = (has(Theme::TempleService), first_work) {
        return (
            format!("Temple Service and Ritual ({w})"),
            format!("Focused study of Temple-era practices and priestly responsibilities in {w}"),
        );
    }
    if has(Theme::AggadahStories) {
        return (
            "Talmudic Narratives and Moral Tales".into(),
            "Concentrated collection of aggadic narratives that convey ethical teachings".into(),
        );
    }
    if let (true, Some(w)) = (has(Theme::HalakhaLegal), first_work) {
        return (
            format!("Legal Principles and Practical Rulings ({w})"),
            format!("Focused analysis of halakhic principles and legal reasoning in {w}"),
        );
    }
    if has(Theme::HistoricalFigures) {
        return (
            "Talmudic Sages and Historical Personalities".into(),
            "Intimate study of key rabbinic figures and their contributions".into(),
        );
    }
    if has(Theme::BiblicalCommentary) {
        return (
            "Talmudic Biblical Interpretation".into(),
            "Concentrated exploration of rabbinic hermeneutical approaches to Scripture".into(),
        );
    }
    if has(Theme::SocialDynamics) {
        return (
            "Social Dynamics and Community Relations".into(),
            "Focused examination of social structures and interpersonal dynamics in the Talmud".into(),
        );
    }
    if has(Theme::LiturgyPrayer) {
        return (
            "Prayer, Liturgy, and Ritual Practice".into(),
            "Concentrated study of liturgical practices and ritual observance".into(),
        );
    }

    let w = first_work.map(String::as_str).unwrap_or(VARIOUS);
    (
        format!("Focused Study Collection ({w})"),
        format!("Concentrated thematic exploration of related topics in {w}"),
    )
}

/// Whether `needle` occurs in `haystack` with no alphanumeric character
/// directly before or after it.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, m)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + m.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
