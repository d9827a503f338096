use serde::Serialize;

use lectern_corpus::{Corpus, DocId};

use crate::error::LecternError;

/// Reading speed behind the time estimates.
const WORDS_PER_MINUTE: usize = 200;

/// Estimate used for documents without a word count.
const UNKNOWN_MINUTES: usize = 5;

/// One step of a reading sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingItem {
    /// 1-based position.
    pub order: usize,
    pub id: DocId,
    pub title: String,
    pub word_count: usize,
    /// Display estimate such as `"~4 min"`.
    pub reading_time: String,
    pub minutes: usize,
}

/// Documents of a group ordered shortest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadingSequence {
    pub items: Vec<ReadingItem>,
    pub total_minutes: usize,
}

/// Orders `ids` by word count ascending; equal counts keep the given order.
pub fn reading_sequence(corpus: &Corpus, ids: &[DocId]) -> Result<ReadingSequence, LecternError> {
    let mut docs = ids
        .iter()
        .map(|id| corpus.by_id(id).ok_or_else(|| LecternError::UnknownDocument(id.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    docs.sort_by_key(|d| d.word_count);

    let items: Vec<ReadingItem> = docs
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let (reading_time, minutes) = reading_time(d.word_count);
            ReadingItem {
                order: i + 1,
                id: d.id.clone(),
                title: d.title.clone(),
                word_count: d.word_count,
                reading_time,
                minutes,
            }
        })
        .collect();
    let total_minutes = items.iter().map(|it| it.minutes).sum();
    Ok(ReadingSequence {
        items,
        total_minutes,
    })
}

/// Reading time estimate at 200 words per minute.
///
/// Unknown length reads as 5 minutes; short documents count at least
/// 3 minutes; documents of 2500 words or more are marked detailed.
pub fn reading_time(word_count: usize) -> (String, usize) {
    let minutes = word_count / WORDS_PER_MINUTE;
    match word_count {
        0 => (format!("~{UNKNOWN_MINUTES} min"), UNKNOWN_MINUTES),
        1..1000 => {
            let m = minutes.max(3);
            (format!("~{m} min"), m)
        }
        1000..2500 => (format!("~{minutes} min"), minutes),
        _ => (format!("~{minutes} min (detailed)"), minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_corpus::Metadata;

    #[test]
    fn time_estimates() {
        assert_eq!(reading_time(0), ("~5 min".to_string(), 5));
        assert_eq!(reading_time(150), ("~3 min".to_string(), 3));
        assert_eq!(reading_time(999), ("~4 min".to_string(), 4));
        assert_eq!(reading_time(1000), ("~5 min".to_string(), 5));
        assert_eq!(reading_time(2499), ("~12 min".to_string(), 12));
        assert_eq!(reading_time(2500), ("~12 min (detailed)".to_string(), 12));
        assert_eq!(reading_time(6000), ("~30 min (detailed)".to_string(), 30));
    }

    #[test]
    fn shortest_first() {
        let meta: Vec<Metadata> = [("a", 3000), ("b", 0), ("c", 1200), ("d", 0)]
            .into_iter()
            .map(|(id, wc)| Metadata {
                id: id.into(),
                title: id.to_uppercase(),
                word_count: wc,
                ..Default::default()
            })
            .collect();
        let vectors = vec![vec![1.0, 0.0]; 4];
        let corpus = Corpus::from_parts(vectors, meta).unwrap();

        let ids: Vec<DocId> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let seq = reading_sequence(&corpus, &ids).unwrap();
        let order: Vec<&str> = seq.items.iter().map(|it| it.id.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "c", "a"]);
        assert_eq!(seq.items[0].order, 1);
        assert_eq!(seq.items[3].reading_time, "~15 min (detailed)");
        assert_eq!(seq.total_minutes, 5 + 5 + 6 + 15);
    }

    #[test]
    fn unknown_id() {
        let corpus = Corpus::from_parts(
            vec![vec![1.0]],
            vec![Metadata {
                id: "a".into(),
                ..Default::default()
            }],
        )
        .unwrap();
        let err = reading_sequence(&corpus, &["z".to_string()]).unwrap_err();
        assert!(matches!(err, LecternError::UnknownDocument(id) if id == "z"));
    }
}
