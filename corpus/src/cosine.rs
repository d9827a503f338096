/// Cosine similarity between two vectors.
///
/// Returns 0 for zero vectors or dimension mismatches. The result is
/// clamped to `[-1, 1]` to absorb floating point error.
pub fn cosine_sim(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;
    for (ai, bi) in a.iter().zip(b.iter()) {
        dot += ai * bi;
        na += ai * ai;
        nb += bi * bi;
    }

    let denom = na.sqrt() * nb.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Cosine distance: 1 - cosine_similarity. Lies in `[0, 2]`.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    1.0 - cosine_sim(a, b)
}

/// Euclidean distance between two vectors of equal length.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Squared euclidean distance between two vectors of equal length.
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Dense symmetric matrix of pairwise cosine similarities.
///
/// The diagonal is always 1, including for zero vectors.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Computes cosine similarity between every pair of `vectors`.
    pub fn new<V: AsRef<[f64]>>(vectors: &[V]) -> Self {
        let n = vectors.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let sim = cosine_sim(vectors[i].as_ref(), vectors[j].as_ref());
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }
        Self { n, values }
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Mean similarity over all unordered pairs `i < j` of `members`
    /// (indices into this matrix). Fewer than two members yields 0.
    pub fn average_pairwise(&self, members: &[usize]) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for (a, &i) in members.iter().enumerate() {
            for &j in &members[a + 1..] {
                sum += self.get(i, j);
                count += 1;
            }
        }
        if count == 0 {
            return 0.0;
        }
        sum / count as f64
    }

    /// Mean similarity over all unordered pairs of the whole matrix.
    pub fn average(&self) -> f64 {
        let all: Vec<usize> = (0..self.n).collect();
        self.average_pairwise(&all)
    }
}

/// Mean pairwise cosine similarity of a group of vectors.
/// Groups with fewer than two vectors yield 0.
pub fn average_pairwise_similarity<V: AsRef<[f64]>>(vectors: &[V]) -> f64 {
    SimilarityMatrix::new(vectors).average()
}
