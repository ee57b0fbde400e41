use std::path::Path;
use candle_core::{Device, Tensor};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;
use candle_transformers::models::bert::{BertModel, Config, HiddenAct, DTYPE};
use candle_nn::VarBuilder;
use tracing::{debug, info};

use crate::error::Error;

use super::Embedding;

/// Default sentence-transformers model.
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Revision of [`DEFAULT_MODEL_ID`] that ships `pytorch_model.bin`.
pub const DEFAULT_REVISION: &str = "refs/pr/21";

/// Sentence embeddings from a local BERT model: mean pooling over tokens, L2 normalised.
pub struct BertEmbedding {
    model: BertModel,
    tokenizer: Tokenizer,
}

impl BertEmbedding {

    /// Fetch the model from the Hugging Face hub (cached locally) and load it.
    pub fn new(model_id: &str,
        revision: &str,
        use_pth: bool,
        device: Device,
        approximate_gelu: bool) -> Result<Self, Error>
    {
        let repo = Repo::with_revision(model_id.to_owned(), RepoType::Model, revision.to_owned());
        let (config_filename, tokenizer_filename, weights_filename) = {

            let api = Api::new()?;
            let api = api.repo(repo);
            let config = api.get("config.json")?;
            let tokenizer = api.get("tokenizer.json")?;
            let weights = if use_pth {
                api.get("pytorch_model.bin")?
            } else {
                api.get("model.safetensors")?
            };
            (config, tokenizer, weights)
        };

        info!(model_id, revision, "embedding model fetched");

        Self::from_files(&config_filename, &tokenizer_filename, &weights_filename, use_pth, device, approximate_gelu)
    }

    /// [`DEFAULT_MODEL_ID`] on CPU.
    pub fn all_mini_lm() -> Result<Self, Error> {
        Self::new(DEFAULT_MODEL_ID, DEFAULT_REVISION, true, Device::Cpu, false)
    }

    /// Load the model from files on disk.
    pub fn from_files(config_filename: &Path,
        tokenizer_filename: &Path,
        weights_filename: &Path,
        use_pth: bool,
        device: Device,
        approximate_gelu: bool) -> Result<Self, Error>
    {
        let config = std::fs::read_to_string(config_filename)
            .map_err(|e| Error::EmbeddingError(format!("Failed to load {}: {}", config_filename.display(), e)))?;
        let mut config: Config = serde_json::from_str(&config)
            .map_err(|e| Error::EmbeddingError(format!("Failed to parse json from {}: {}", config_filename.display(), e)))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_filename)
            .map_err(|e| Error::EmbeddingError(format!("Failed to load tokenizer from {}: {}", tokenizer_filename.display(), e)))?;
        tokenizer
            .with_padding(None)
            .with_truncation(None)
            .map_err(|e| Error::EmbeddingError(format!("tokenizer build error: {}", e)))?;

        let vb = if use_pth {
            VarBuilder::from_pth(weights_filename, DTYPE, &device)?
        } else {
            // SAFETY: the weights file is not modified while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_filename], DTYPE, &device)? }
        };

        if approximate_gelu {
            config.hidden_act = HiddenAct::GeluApproximate;
        }
        let model = BertModel::load(vb, &config)?;

        Ok(BertEmbedding {
            model,
            tokenizer,
        })
    }

    fn normalize_l2(v: &Tensor) -> Result<Tensor, Error> {
        Ok(v.broadcast_div(&v.sqr()?.sum_keepdim(1)?.sqrt()?)?)
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, Error> {

        let device = &self.model.device;

        let tokens = self.tokenizer
            .encode(text, true)
            .map_err(|e| Error::EmbeddingError(format!("tokenization error: {}", e)))?
            .get_ids()
            .to_vec();

        let token_ids = Tensor::new(&tokens[..], device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;

        let embeddings = self.model.forward(&token_ids, &token_type_ids, None)?;

        let (_n_sentence, n_tokens, _hidden_size) = embeddings.dims3()?;
        let embeddings = (embeddings.sum(1)? / (n_tokens as f64))?;
        let embeddings = Self::normalize_l2(&embeddings)?;

        Ok(embeddings.squeeze(0)?.to_vec1::<f32>()?)
    }
}

impl Embedding for BertEmbedding {

    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        debug!(texts = texts.len(), "local embedding");
        texts.iter().map(|t| self.embed_one(t)).collect()
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, Error> {
        self.embed_one(text)
    }
}
