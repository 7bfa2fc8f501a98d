use crate::careerday::client_wrapper::{
    ClientWrapper, GenerationParams, Message, MessageChunkStream, SendError,
};
use crate::careerday::clients::openai::OpenAIClient;
use async_trait::async_trait;

/// OpenAI-compatible endpoint of NVIDIA's hosted inference API.
pub const NVIDIA_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";

/// NVIDIA-hosted reasoning models that stream a `reasoning_content` channel.
pub enum Model {
    /// `nvidia/nvidia-nemotron-nano-9b-v2` – small hybrid model, honours thinking budgets.
    NemotronNano9bV2,
    /// `nvidia/llama-3.3-nemotron-super-49b-v1` – larger Nemotron reasoning model.
    NemotronSuper49bV1,
    /// `deepseek-ai/deepseek-r1` – open reasoning model hosted by NVIDIA.
    DeepSeekR1,
}

pub fn model_to_string(model: Model) -> String {
    match model {
        Model::NemotronNano9bV2 => "nvidia/nvidia-nemotron-nano-9b-v2".to_string(),
        Model::NemotronSuper49bV1 => "nvidia/llama-3.3-nemotron-super-49b-v1".to_string(),
        Model::DeepSeekR1 => "deepseek-ai/deepseek-r1".to_string(),
    }
}

/// Model used when nothing else is configured.
pub fn default_model() -> String {
    model_to_string(Model::NemotronNano9bV2)
}

pub struct NvidiaClient {
    client: OpenAIClient,
}

impl NvidiaClient {
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Result<Self, SendError> {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Result<Self, SendError> {
        Self::new_with_base_url(secret_key, model_name, NVIDIA_BASE_URL)
    }

    /// Point the preset at a self-hosted NIM or a proxy.
    pub fn new_with_base_url(
        secret_key: &str,
        model_name: &str,
        base_url: &str,
    ) -> Result<Self, SendError> {
        Ok(NvidiaClient {
            client: OpenAIClient::new_with_base_url(secret_key, model_name, base_url)?,
        })
    }
}

#[async_trait]
impl ClientWrapper for NvidiaClient {
    fn model_name(&self) -> &str {
        self.client.model_name()
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<MessageChunkStream, SendError> {
        self.client.send_message_stream(messages, params).await
    }
}
