//! Where the Replicated CLI runs

#[cfg(feature = "dagger-backend")]
mod dagger;

#[cfg(feature = "dagger-backend")]
pub use dagger::DaggerRunner;

use async_trait::async_trait;
use shipyard_secrets::{CommandRunner, EnvBindings, EnvValue, ExecError, ProcessRunner};

/// Vendor image with the CLI at `/replicated`
pub const REPLICATED_IMAGE: &str = "replicated/vendor-cli:latest";

/// The vendor image is only published for this platform
pub const REPLICATED_PLATFORM: &str = "linux/amd64";

/// Runs each command in a fresh `docker run --rm` container.
///
/// Plain bindings are passed as `-e NAME=value`. Secret bindings are passed
/// as `-e NAME` so docker copies them from its own environment, which is the
/// only place their values are set.
#[derive(Debug, Clone)]
pub struct DockerRunner {
    docker: String,
    image: String,
    platform: String,
    process: ProcessRunner,
}

impl Default for DockerRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerRunner {
    /// Run the vendor image with `docker` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            docker: "docker".to_string(),
            image: REPLICATED_IMAGE.to_string(),
            platform: REPLICATED_PLATFORM.to_string(),
            process: ProcessRunner::new(),
        }
    }

    /// Use a different image
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Use a different docker-compatible binary (e.g. `podman`)
    #[must_use]
    pub fn with_docker(mut self, docker: impl Into<String>) -> Self {
        self.docker = docker.into();
        self
    }

    /// The docker argv and docker's own environment for running `argv`
    fn invocation(&self, argv: &[String], env: &EnvBindings) -> (Vec<String>, EnvBindings) {
        let mut docker_argv = vec![
            self.docker.clone(),
            "run".to_string(),
            "--rm".to_string(),
            "--platform".to_string(),
            self.platform.clone(),
        ];
        let mut docker_env = EnvBindings::new();

        for (name, value) in env.iter() {
            docker_argv.push("-e".to_string());
            match value {
                EnvValue::Plain(v) => docker_argv.push(format!("{name}={v}")),
                EnvValue::Secret(_) => {
                    docker_argv.push(name.to_string());
                    docker_env.set(name, value.clone());
                }
            }
        }

        docker_argv.push(self.image.clone());
        docker_argv.extend(argv.iter().cloned());
        (docker_argv, docker_env)
    }
}

#[async_trait]
impl CommandRunner for DockerRunner {
    async fn run(&self, argv: &[String], env: &EnvBindings) -> Result<String, ExecError> {
        if argv.is_empty() {
            return Err(ExecError::EmptyCommand);
        }
        let (docker_argv, docker_env) = self.invocation(argv, env);
        tracing::debug!(image = %self.image, command = %argv[0], "Running in container");
        self.process.run(&docker_argv, &docker_env).await
    }
}
