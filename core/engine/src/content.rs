// core/engine/src/content.rs

use crate::error::{EngineError, Result};
use crate::math::{cosine_similarity, l2_normalize};
use crate::types::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Text preprocessing applied to every description before tokenization
pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Default normalizer: case folding only
#[derive(Debug, Clone, Copy, Default)]
pub struct Lowercase;

impl TextNormalizer for Lowercase {
    fn normalize(&self, text: &str) -> String {
        text.to_lowercase()
    }
}

impl<F> TextNormalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn normalize(&self, text: &str) -> String {
        self(text)
    }
}

/// Split into runs of at least two word characters (alphanumerics or `_`)
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .collect()
}

/// Fitted vocabulary and idf weights
///
/// Vocabulary terms are sorted lexicographically; term `i` owns column `i`.
/// Weights use the smoothed form `ln((1 + n) / (1 + df)) + 1` and every
/// transformed vector is L2-normalized.
#[derive(Clone)]
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    normalizer: Arc<dyn TextNormalizer>,
}

impl fmt::Debug for TfidfModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TfidfModel")
            .field("vocabulary_size", &self.vocabulary.len())
            .finish()
    }
}

impl TfidfModel {
    /// Fit on a corpus; an empty corpus gives an empty vocabulary
    pub fn fit<S: AsRef<str>>(documents: &[S], normalizer: Arc<dyn TextNormalizer>) -> Self {
        let normalized: Vec<String> = documents
            .iter()
            .map(|doc| normalizer.normalize(doc.as_ref()))
            .collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut terms: BTreeSet<&str> = BTreeSet::new();
        for doc in &normalized {
            let unique: HashSet<&str> = tokenize(doc).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
                terms.insert(term);
            }
        }

        let n = normalized.len() as f64;
        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (col, term) in terms.into_iter().enumerate() {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
            idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term.to_string(), col);
        }

        debug!(
            documents = normalized.len(),
            vocabulary = vocabulary.len(),
            "Fitted tf-idf model"
        );

        Self {
            vocabulary,
            idf,
            normalizer,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&col| self.idf[col])
    }

    /// Project one text into the fitted space; unseen terms are dropped
    pub fn transform_one(&self, text: &str) -> Vec<f64> {
        let normalized = self.normalizer.normalize(text);
        let mut vector = vec![0.0; self.vocabulary_size()];
        for token in tokenize(&normalized) {
            if let Some(&col) = self.vocabulary.get(token) {
                vector[col] += 1.0;
            }
        }
        for (weight, idf) in vector.iter_mut().zip(self.idf.iter()) {
            *weight *= idf;
        }
        l2_normalize(&mut vector);
        vector
    }

    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<Vec<f64>> {
        documents
            .iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect()
    }
}

/// Precomputed tf-idf rows, one per project in input order
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    project_ids: Vec<ProjectId>,
    /// First row position per project id
    index: HashMap<ProjectId, usize>,
    rows: Vec<Vec<f64>>,
}

impl TfidfMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn project_ids(&self) -> &[ProjectId] {
        &self.project_ids
    }

    /// Row of the first project carrying `project_id`
    pub fn row_for(&self, project_id: &str) -> Option<&[f64]> {
        self.index.get(project_id).map(|&pos| self.rows[pos].as_slice())
    }

    pub fn row(&self, pos: usize) -> &[f64] {
        &self.rows[pos]
    }
}

/// Fit a model on all project descriptions and vectorize them
pub fn build_tfidf(
    projects: &[ProjectRecord],
    normalizer: Arc<dyn TextNormalizer>,
) -> (TfidfMatrix, TfidfModel) {
    let descriptions: Vec<&str> = projects.iter().map(|p| p.description.as_str()).collect();
    let model = TfidfModel::fit(&descriptions, normalizer);
    let rows = model.transform(&descriptions);
    let project_ids: Vec<ProjectId> = projects.iter().map(|p| p.id.clone()).collect();
    let mut index = HashMap::with_capacity(project_ids.len());
    for (pos, id) in project_ids.iter().enumerate() {
        index.entry(id.clone()).or_insert(pos);
    }
    let matrix = TfidfMatrix {
        project_ids,
        index,
        rows,
    };
    (matrix, model)
}

/// Vectors of the projects a user wishlisted, ready to score candidates
#[derive(Debug, Clone)]
pub struct UserContentProfile {
    wishlist_vectors: Vec<Vec<f64>>,
}

impl UserContentProfile {
    /// Collect wishlisted descriptions in project order and transform them
    pub fn new(user: &UserRecord, projects: &[ProjectRecord], model: &TfidfModel) -> Self {
        let wished: HashSet<&str> = user
            .wishlist
            .iter()
            .map(|item| item.project_id.as_str())
            .collect();
        let descriptions: Vec<&str> = projects
            .iter()
            .filter(|p| wished.contains(p.id.as_str()))
            .map(|p| p.description.as_str())
            .collect();

        Self {
            wishlist_vectors: model.transform(&descriptions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wishlist_vectors.is_empty()
    }

    /// Mean cosine similarity of `target` to the wishlist vectors, 0 when empty
    pub fn score(&self, target: &[f64]) -> f64 {
        if self.wishlist_vectors.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .wishlist_vectors
            .iter()
            .map(|v| cosine_similarity(target, v))
            .sum();
        total / self.wishlist_vectors.len() as f64
    }

    /// Score a project by id; an id without a tf-idf row is an error unless
    /// the profile is empty
    pub fn score_project(&self, project_id: &str, tfidf_matrix: &TfidfMatrix) -> Result<f64> {
        if self.is_empty() {
            return Ok(0.0);
        }
        let target = tfidf_matrix
            .row_for(project_id)
            .ok_or_else(|| EngineError::UnknownProject(project_id.to_string()))?;
        Ok(self.score(target))
    }
}

/// Average description similarity between a candidate and the user's wishlist
///
/// Fails only when `target_project_id` is not a row of `tfidf_matrix`.
pub fn content_score(
    target_project_id: &str,
    user: &UserRecord,
    projects: &[ProjectRecord],
    tfidf_matrix: &TfidfMatrix,
    model: &TfidfModel,
) -> Result<f64> {
    UserContentProfile::new(user, projects, model).score_project(target_project_id, tfidf_matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn projects() -> Vec<ProjectRecord> {
        vec![
            ProjectRecord::new("p1", "Solar", "Solar panels for rural schools"),
            ProjectRecord::new("p2", "Wind", "Wind turbines for rural farms"),
            ProjectRecord::new("p3", "Code", "Teaching kids to code in Rust"),
        ]
    }

    fn lowercase() -> Arc<dyn TextNormalizer> {
        Arc::new(Lowercase)
    }

    #[test]
    fn test_tokenize_drops_single_characters() {
        assert_eq!(tokenize("a rust_lang b 42 x"), vec!["rust_lang", "42"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_fit_vocabulary_and_idf() {
        let model = TfidfModel::fit(&["rust code", "rust farm"], lowercase());
        assert_eq!(model.vocabulary_size(), 3);
        // Sorted vocabulary
        assert_eq!(model.vocabulary()["code"], 0);
        assert_eq!(model.vocabulary()["farm"], 1);
        assert_eq!(model.vocabulary()["rust"], 2);
        // rust occurs everywhere: ln(3/3) + 1
        assert!((model.idf("rust").unwrap() - 1.0).abs() < EPS);
        assert!((model.idf("code").unwrap() - ((3.0f64 / 2.0).ln() + 1.0)).abs() < EPS);
    }

    #[test]
    fn test_rows_are_unit_length_and_case_insensitive() {
        let (matrix, model) = build_tfidf(&projects(), lowercase());
        assert_eq!(matrix.len(), 3);
        for pos in 0..matrix.len() {
            let norm: f64 = matrix.row(pos).iter().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < EPS);
        }
        let upper = model.transform_one("SOLAR PANELS FOR RURAL SCHOOLS");
        assert!((cosine_similarity(&upper, matrix.row(0)) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_custom_normalizer_is_applied() {
        let strip: Arc<dyn TextNormalizer> =
            Arc::new(|text: &str| text.to_lowercase().replace("rural", ""));
        let (_, model) = build_tfidf(&projects(), strip);
        assert!(model.idf("rural").is_none());
        assert!(model.idf("solar").is_some());
    }

    #[test]
    fn test_empty_corpus_does_not_fail() {
        let (matrix, model) = build_tfidf(&[], lowercase());
        assert!(matrix.is_empty());
        assert_eq!(model.vocabulary_size(), 0);
        assert!(model.transform_one("anything").is_empty());

        let blank = vec![ProjectRecord::new("p", "P", "a ! ?")];
        let (matrix, model) = build_tfidf(&blank, lowercase());
        assert_eq!(model.vocabulary_size(), 0);
        assert!(matrix.row(0).is_empty());
    }

    #[test]
    fn test_content_score_empty_wishlist_is_zero() {
        let projects = projects();
        let (matrix, model) = build_tfidf(&projects, lowercase());
        let user = UserRecord::new("u");
        for project in &projects {
            let score = content_score(&project.id, &user, &projects, &matrix, &model).unwrap();
            assert_eq!(score, 0.0);
        }
    }

    #[test]
    fn test_content_score_prefers_related_descriptions() {
        let projects = projects();
        let (matrix, model) = build_tfidf(&projects, lowercase());
        let user = UserRecord::new("u").with_wish("p1");

        let own = content_score("p1", &user, &projects, &matrix, &model).unwrap();
        let related = content_score("p2", &user, &projects, &matrix, &model).unwrap();
        let unrelated = content_score("p3", &user, &projects, &matrix, &model).unwrap();

        assert!((own - 1.0).abs() < EPS);
        assert!(related > unrelated);
        assert!(unrelated.abs() < EPS);
    }

    #[test]
    fn test_content_score_averages_over_wishlist() {
        let projects = projects();
        let (matrix, model) = build_tfidf(&projects, lowercase());
        let user = UserRecord::new("u").with_wish("p1").with_wish("p3").with_wish("gone");

        let score = content_score("p1", &user, &projects, &matrix, &model).unwrap();
        let expected = (1.0 + cosine_similarity(matrix.row(0), matrix.row(2))) / 2.0;
        assert!((score - expected).abs() < EPS);
    }

    #[test]
    fn test_content_score_unknown_target_fails() {
        let projects = projects();
        let (matrix, model) = build_tfidf(&projects, lowercase());
        let user = UserRecord::new("u").with_wish("p1");

        let err = content_score("missing", &user, &projects, &matrix, &model).unwrap_err();
        assert!(matches!(err, EngineError::UnknownProject(ref id) if id == "missing"));
    }
}
