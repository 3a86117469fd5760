//! Dagger runner for the Replicated CLI

use super::{REPLICATED_IMAGE, REPLICATED_PLATFORM};
use async_trait::async_trait;
use dagger_sdk::{Config, Platform, QueryContainerOptsBuilder, connect_opts};
use shipyard_secrets::{CommandRunner, EnvBindings, EnvValue, ExecError};
use std::sync::{Arc, Mutex};

type DaggerReport = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Variable set to the current time on every exec so results are never cached
const CACHE_BUSTER_ENV: &str = "DAGGER_CACHEBUSTER_CBE";

/// Runs each command in a Dagger container built from the vendor image.
///
/// Secret bindings become Dagger secrets and reach the container through
/// `with_secret_variable`.
#[derive(Debug, Clone)]
pub struct DaggerRunner {
    image: String,
    platform: String,
}

impl Default for DaggerRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl DaggerRunner {
    /// Run the vendor image
    #[must_use]
    pub fn new() -> Self {
        Self {
            image: REPLICATED_IMAGE.to_string(),
            platform: REPLICATED_PLATFORM.to_string(),
        }
    }

    /// Use a different image
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

#[async_trait]
impl CommandRunner for DaggerRunner {
    async fn run(&self, argv: &[String], env: &EnvBindings) -> Result<String, ExecError> {
        let program = argv.first().ok_or(ExecError::EmptyCommand)?.clone();
        let backend_error = |message: String| ExecError::Backend {
            program: program.clone(),
            backend: "dagger",
            message,
        };

        let image = self.image.clone();
        let platform = self.platform.clone();
        let argv = argv.to_vec();
        let env = env.clone();

        let result_store: Arc<Mutex<Option<Result<String, DaggerReport>>>> =
            Arc::new(Mutex::new(None));
        let result_store_clone = Arc::clone(&result_store);

        connect_opts(Config::default(), move |client| {
            let image = image.clone();
            let platform = platform.clone();
            let argv = argv.clone();
            let env = env.clone();
            let result_store = Arc::clone(&result_store_clone);

            async move {
                let opts = match QueryContainerOptsBuilder::default()
                    .platform(Platform(platform))
                    .build()
                {
                    Ok(opts) => opts,
                    Err(e) => {
                        if let Ok(mut guard) = result_store.lock() {
                            *guard = Some(Err(e.into()));
                        }
                        return Ok(());
                    }
                };

                let mut container = client.container_opts(opts).from(image);
                for (name, value) in env.iter() {
                    container = match value {
                        EnvValue::Secret(secret) => container
                            .with_secret_variable(name, client.set_secret(name, secret.expose())),
                        EnvValue::Plain(value) => container.with_env_variable(name, value),
                    };
                }

                let res = container
                    .with_env_variable(CACHE_BUSTER_ENV, chrono::Utc::now().to_rfc3339())
                    .with_exec(argv)
                    .stdout()
                    .await
                    .map_err(DaggerReport::from);

                if let Ok(mut guard) = result_store.lock() {
                    *guard = Some(res);
                }
                Ok(())
            }
        })
        .await
        .map_err(|e| backend_error(e.to_string()))?;

        let mut guard = result_store
            .lock()
            .map_err(|_| backend_error("result lock poisoned".to_string()))?;
        guard
            .take()
            .ok_or_else(|| backend_error("session ended without a result".to_string()))?
            .map_err(|e| backend_error(e.to_string()))
    }
}
