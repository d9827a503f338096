//! Descriptive labels for groups of documents.
//!
//! A [`ThemeLabeler`] reads the titles of a group and reports which of ten
//! fixed [`Theme`]s their keywords touch, which works they cite in the
//! `(Work 12a)` style, and a headline picked by theme precedence.
//!
//! ```
//! use lectern_theme::{Theme, ThemeConfig, ThemeLabeler};
//!
//! let labeler = ThemeLabeler::new(ThemeConfig::default()).unwrap();
//! let label = labeler.label(&["The incense of the high priest (Yoma 44a)"]);
//! assert_eq!(label.themes, vec![Theme::TempleService]);
//! assert_eq!(label.title, "Temple Service and Ritual (Yoma)");
//! ```

mod config;
mod error;
mod theme;

pub use config::ThemeConfig;
pub use error::ThemeError;
pub use theme::{Theme, ThemeLabel, ThemeLabeler};
