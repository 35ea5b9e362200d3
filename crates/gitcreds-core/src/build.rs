//! Build phase: resolve credentials, provision them, register the layer

use crate::{resolve, Credential, Environment, Layer, Provisioner, Result};
use gitcreds_config::{BuildpackToml, Configuration};
use std::path::PathBuf;

/// Paths handed to the build phase by the lifecycle
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Directory holding `buildpack.toml`
    pub buildpack_dir: PathBuf,
    /// Application directory holding the optional `buildpack.yml`
    pub working_dir: PathBuf,
    /// Lifecycle layers directory
    pub layers_dir: PathBuf,
}

/// Everything one build invocation provisions
pub struct BuildEnvironment {
    credentials: Vec<Credential>,
    configuration: Configuration,
    span: tracing::Span,
}

impl BuildEnvironment {
    pub fn new(credentials: Vec<Credential>, configuration: Configuration) -> Self {
        let span = tracing::info_span!("provision", credentials = credentials.len());
        Self {
            credentials,
            configuration,
            span,
        }
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Span all provisioning output is recorded under
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

/// Outcome of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub layers: Vec<Layer>,
}

/// Run the build phase.
///
/// Fails with the first error from any step; nothing is attempted after it.
pub async fn build(
    context: &BuildContext,
    env: &dyn Environment,
    provisioner: &Provisioner<'_>,
) -> Result<BuildResult> {
    let buildpack = BuildpackToml::load(&context.buildpack_dir)?;
    tracing::info!("{}", buildpack.buildpack.title());

    let configuration = buildpack.configuration().clone();
    let credentials = resolve(env, &configuration, &context.working_dir)?;

    let build_env = BuildEnvironment::new(credentials, configuration);
    provisioner.provision(&build_env).await?;

    let layer = Layer::gitcredentials();
    let path = layer.write(&context.layers_dir)?;
    tracing::debug!("Wrote layer metadata to {:?}", path);

    Ok(BuildResult {
        layers: vec![layer],
    })
}
