use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use lectern_cluster::{ClusterAssignment, Label};
use lectern_corpus::{Corpus, Document};

use crate::config::SummaryConfig;
use crate::error::LecternError;

/// English stop words removed from title terms.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "couldn", "couldn't", "d", "did", "didn", "didn't",
    "do", "does", "doesn", "doesn't", "doing", "don", "don't", "down", "during", "each", "few",
    "for", "from", "further", "had", "hadn", "hadn't", "has", "hasn", "hasn't", "have", "haven",
    "haven't", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "i", "if", "in", "into", "is", "isn", "isn't", "it", "it's", "its", "itself", "just", "ll",
    "m", "ma", "me", "mightn", "mightn't", "more", "most", "mustn", "mustn't", "my", "myself",
    "needn", "needn't", "no", "nor", "not", "now", "o", "of", "off", "on", "once", "only", "or",
    "other", "our", "ours", "ourselves", "out", "over", "own", "re", "s", "same", "shan",
    "shan't", "she", "she's", "should", "should've", "shouldn", "shouldn't", "so", "some",
    "such", "t", "than", "that", "that'll", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "ve", "very", "was", "wasn", "wasn't", "we", "were", "weren", "weren't", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "won", "won't",
    "wouldn", "wouldn't", "y", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves",
];

/// Earliest and latest dated member of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

/// A title term and how often it occurs in a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// Content overview of one cluster of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub label: Label,
    pub size: usize,
    pub avg_word_count: f64,
    /// Mean body text length in characters.
    pub avg_text_length: f64,
    /// None when no member is dated.
    pub date_range: Option<DateRange>,
    /// Most frequent title terms, ties in order of first appearance.
    pub top_title_terms: Vec<TermCount>,
    /// Most frequent body text terms over the leading members.
    pub top_text_terms: Vec<TermCount>,
    /// Leading member titles in corpus order.
    pub sample_titles: Vec<String>,
}

/// Summarizes every non-noise cluster with at least
/// `config.min_cluster_size` members, labels ascending.
pub fn summarize(
    corpus: &Corpus,
    assignment: &ClusterAssignment,
    config: &SummaryConfig,
) -> Result<Vec<ClusterSummary>, LecternError> {
    let mut out = Vec::new();
    for (label, local) in assignment.clusters() {
        if local.len() < config.min_cluster_size {
            continue;
        }
        let docs = local
            .iter()
            .map(|&i| {
                let id = &assignment.ids()[i];
                corpus
                    .by_id(id)
                    .ok_or_else(|| LecternError::UnknownDocument(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        out.push(summarize_cluster(label, &docs, config));
    }
    Ok(out)
}

fn summarize_cluster(label: Label, docs: &[&Document], config: &SummaryConfig) -> ClusterSummary {
    let n = docs.len() as f64;
    let avg_word_count = docs.iter().map(|d| d.word_count as f64).sum::<f64>() / n;
    let avg_text_length = docs.iter().map(|d| d.text.chars().count() as f64).sum::<f64>() / n;

    let dates = docs.iter().filter_map(|d| d.date);
    let date_range = dates.clone().min().zip(dates.max()).map(|(earliest, latest)| DateRange {
        earliest,
        latest,
    });

    let titles = docs.iter().map(|d| d.title.as_str()).collect::<Vec<_>>().join(" ");
    let mut top_title_terms = term_counts(&titles);
    top_title_terms.truncate(config.top_terms);

    let texts = docs
        .iter()
        .take(config.text_sample)
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let mut top_text_terms = term_counts(&texts);
    top_text_terms.truncate(config.top_terms);

    ClusterSummary {
        label,
        size: docs.len(),
        avg_word_count,
        avg_text_length,
        date_range,
        top_title_terms,
        top_text_terms,
        sample_titles: docs
            .iter()
            .take(config.sample_titles)
            .map(|d| d.title.clone())
            .collect(),
    }
}

/// Counts content words of `text`, most frequent first.
///
/// Text is lowercased and punctuation becomes whitespace. Kept terms are
/// purely alphabetic, longer than two characters and not stop words.
pub fn term_counts(text: &str) -> Vec<TermCount> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut counts: Vec<TermCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() <= 2
            || !word.chars().all(char::is_alphabetic)
            || STOP_WORDS.contains(&word)
        {
            continue;
        }
        match index.get(word) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(word, counts.len());
                counts.push(TermCount {
                    term: word.to_string(),
                    count: 1,
                });
            }
        }
    }
    // Stable: equal counts keep first-appearance order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_corpus::Metadata;

    fn corpus() -> Corpus {
        let docs = [
            ("a", "The Temple incense", 400, "Incense burned", Some((2023, 5, 1))),
            ("b", "Incense and the priests", 600, "incense", Some((2021, 1, 9))),
            ("c", "Priests of the Temple (Yoma 2a)", 800, "", None),
            ("d", "A lone essay", 100, "abcdef", Some((2024, 2, 2))),
        ];
        let mut vectors = Vec::new();
        let mut meta = Vec::new();
        for (i, (id, title, wc, text, date)) in docs.into_iter().enumerate() {
            let mut v = vec![0.0; 4];
            v[i] = 1.0;
            vectors.push(v);
            meta.push(Metadata {
                id: id.into(),
                title: title.into(),
                word_count: wc,
                text: text.into(),
                date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            });
        }
        Corpus::from_parts(vectors, meta).unwrap()
    }

    #[test]
    fn summarizes_large_enough_clusters() {
        let c = corpus();
        let assignment = ClusterAssignment::new(c.ids(), vec![0, 0, 0, 1]).unwrap();
        let out = summarize(&c, &assignment, &SummaryConfig::default()).unwrap();
        assert_eq!(out.len(), 1, "cluster 1 is below the minimum size");

        let s = &out[0];
        assert_eq!(s.label, 0);
        assert_eq!(s.size, 3);
        assert_eq!(s.avg_word_count, 600.0);
        assert_eq!(s.avg_text_length, 7.0);
        let range = s.date_range.unwrap();
        assert_eq!(range.earliest, NaiveDate::from_ymd_opt(2021, 1, 9).unwrap());
        assert_eq!(range.latest, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
        assert_eq!(s.sample_titles.len(), 3);

        let terms: Vec<(&str, usize)> = s
            .top_title_terms
            .iter()
            .map(|t| (t.term.as_str(), t.count))
            .collect();
        assert_eq!(terms, vec![("temple", 2), ("incense", 2), ("priests", 2), ("yoma", 1)]);

        let text: Vec<(&str, usize)> = s
            .top_text_terms
            .iter()
            .map(|t| (t.term.as_str(), t.count))
            .collect();
        assert_eq!(text, vec![("incense", 2), ("burned", 1)]);
    }

    #[test]
    fn text_terms_use_leading_members() {
        let c = corpus();
        let assignment = ClusterAssignment::new(c.ids(), vec![0, 0, 0, 1]).unwrap();
        let cfg = SummaryConfig {
            text_sample: 1,
            ..Default::default()
        };
        let out = summarize(&c, &assignment, &cfg).unwrap();
        let text: Vec<&str> = out[0].top_text_terms.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(text, vec!["incense", "burned"]);
    }

    #[test]
    fn noise_is_not_summarized() {
        let c = corpus();
        let assignment =
            ClusterAssignment::new(c.ids(), vec![lectern_cluster::NOISE; 4]).unwrap();
        assert!(summarize(&c, &assignment, &SummaryConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn term_filtering() {
        let terms = term_counts("It's the C3PO droid, an AI: and_so on; Über-cool!");
        let words: Vec<&str> = terms.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(words, vec!["droid", "über", "cool"]);
    }

    #[test]
    fn undated_cluster_has_no_range() {
        let c = corpus();
        let assignment = ClusterAssignment::new(c.ids(), vec![1, 1, 0, 1]).unwrap();
        let cfg = SummaryConfig {
            min_cluster_size: 1,
            top_terms: 1,
            sample_titles: 1,
            ..Default::default()
        };
        let out = summarize(&c, &assignment, &cfg).unwrap();
        assert_eq!(out[0].label, 0);
        assert_eq!(out[0].date_range, None);
        assert_eq!(out[1].top_title_terms.len(), 1);
        assert_eq!(out[1].sample_titles, vec!["The Temple incense"]);
    }
}
