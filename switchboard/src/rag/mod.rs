//! Retrieval primitives: embedders and a brute-force vector store.

use crate::error::Error;

mod hugface;
mod remote;
mod similarity;
mod store;

pub use hugface::{BertEmbedding, DEFAULT_MODEL_ID, DEFAULT_REVISION};
pub use remote::RemoteEmbedding;
pub use similarity::cosine_similarity;
pub use store::{Document, Retriever, VectorStore};

/// Embedding generation.
pub trait Embedding: Send + Sync {
    /// One embedding per text, in input order.
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error>;

    /// Embedding of a search query.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, Error>;
}

/// Join page contents with blank lines, ready to be placed into a prompt.
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_documents() {
        let docs = vec![Document::new("RAG combines retrieval with generation."), Document::new("Embeddings encode meaning.")];
        assert_eq!(
            format_documents(&docs),
            "RAG combines retrieval with generation.\n\nEmbeddings encode meaning."
        );
        assert_eq!(format_documents(&[]), "");
    }
}
