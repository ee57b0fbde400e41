use tracing::debug;
use crate::error::Error;
use super::similarity::cosine_similarity;
use super::Embedding;

/// Retrieved text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Document text.
    pub page_content: String,
}

impl Document {
    /// Create a document.
    pub fn new(page_content: impl Into<String>) -> Self {
        Document { page_content: page_content.into() }
    }
}

/// In-memory corpus with one embedding per text.
pub struct VectorStore {
    documents: Vec<Document>,
    embeddings: Vec<Vec<f32>>,
    embedder: Box<dyn Embedding>,
}

impl VectorStore {

    /// Embed every text once and keep it alongside its vector.
    pub fn new<I, S>(texts: I, embedder: Box<dyn Embedding>) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        let embeddings = embedder.embed_documents(&texts)?;

        if embeddings.len() != texts.len() {
            return Err(Error::EmbeddingError(format!(
                "expected {} embeddings, got {}", texts.len(), embeddings.len()
            )));
        }

        if let Some(first) = embeddings.first() {
            let expected = first.len();
            if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
                return Err(Error::DimensionMismatch { expected, actual: bad.len() });
            }
        }

        debug!(documents = texts.len(), "vector store built");

        let documents = texts.into_iter().map(Document::new).collect();
        Ok(VectorStore { documents, embeddings, embedder })
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True if the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Retriever returning at most `k` documents per query.
    pub fn as_retriever(&self, k: usize) -> Retriever<'_> {
        Retriever { store: self, k }
    }

    /// Up to `k` documents with their scores, best first.
    /// Equal scores keep corpus order.
    pub fn similarity_search_with_score(&self, query: &str, k: usize) -> Result<Vec<(Document, f32)>, Error> {

        let query_embedding = self.embedder.embed_query(query)?;

        if let Some(first) = self.embeddings.first() {
            if first.len() != query_embedding.len() {
                return Err(Error::DimensionMismatch { expected: first.len(), actual: query_embedding.len() });
            }
        }

        let mut scored: Vec<(usize, f32)> = self.embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(&query_embedding, e)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| (self.documents[i].clone(), score))
            .collect())
    }
}

/// Top-k view over a [`VectorStore`].
pub struct Retriever<'a> {
    store: &'a VectorStore,
    k: usize,
}

impl Retriever<'_> {

    /// Documents returned per query.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The `k` documents closest to the query, best first.
    pub fn invoke(&self, query: &str) -> Result<Vec<Document>, Error> {
        Ok(self.store
            .similarity_search_with_score(query, self.k)?
            .into_iter()
            .map(|(doc, _)| doc)
            .collect())
    }
}
