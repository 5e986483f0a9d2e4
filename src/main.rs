use std::{error::Error, sync::Arc};

use ai_llm_service::{
    CompletionClient, LlmServiceProfiles, config::default_config::profiles_from_env, telemetry,
};
use api::{AppState, ServerConfig};
use rag_base::{Embedder, RagConfig, VectorRetriever, vector_store::LocalVectorStore};
use tokio::sync::watch;
use tracing::{info, warn};
use weather_context::{OpenMeteoSource, WeatherCache, WeatherConfig, WeatherRefresher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; the real environment may carry everything.
    let dotenv = dotenvy::dotenv();
    telemetry::init("info")?;
    if let Err(e) = dotenv {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let server = ServerConfig::from_env()?;
    let profiles = profiles_from_env()?;
    let llm = Arc::new(LlmServiceProfiles::new(profiles.chat, profiles.embedding, None)?);

    let rag = RagConfig::from_env()?;
    let store = LocalVectorStore::open(&rag.index_dir).await?;
    let embedder: Arc<dyn Embedder> = llm.clone();
    let retriever = VectorRetriever::new(store, embedder, rag.top_k);
    let index = retriever.index_info();
    info!(dir = %rag.index_dir.display(), chunks = index.chunks, dim = index.dim, "vector index loaded");

    let completion: Arc<dyn CompletionClient> = llm.clone();
    let mut state = AppState::new(completion.clone(), Arc::new(retriever))
        .with_health(llm.clone())
        .with_index(index);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresher = match WeatherConfig::from_env()? {
        Some(cfg) => {
            let every = cfg.refresh;
            let source = Arc::new(OpenMeteoSource::new(cfg)?);
            let (publisher, cache) = WeatherCache::channel();
            state = state.with_weather(cache);
            Some(WeatherRefresher::new(source, completion, publisher, every).spawn(shutdown_rx))
        }
        None => {
            info!("weather context disabled");
            None
        }
    };

    let served = api::start(state, &server).await;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = refresher {
        if let Err(e) = handle.await {
            warn!(error = %e, "weather refresher task ended abnormally");
        }
    }

    served?;
    Ok(())
}
