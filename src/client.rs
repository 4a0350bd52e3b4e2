use crate::config::VizqueryConfig;
use crate::error::{Result, VizcatError};
use crate::types::QueryRequest;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Boundary to the external catalog query service.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Runs one query and returns the service's combined stdout/stderr text.
    async fn fetch(&self, catalog: &str, request: &QueryRequest) -> Result<String>;
}

/// Production implementation shelling out to the cdsclient `vizquery` tool.
pub struct VizqueryClient {
    binary: String,
    timeout: Duration,
}

impl VizqueryClient {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &VizqueryConfig) -> Self {
        Self::new(&config.binary, Duration::from_secs(config.timeout_secs))
    }

    /// Argument vector matching the cdsclient invocation shape. The tool is
    /// spawned directly rather than through a shell, so each `-flag=value`
    /// is a single argument and needs no quoting.
    fn build_args(request: &QueryRequest) -> Vec<String> {
        vec![
            format!("-source={}", request.source),
            format!("-c={}", request.target),
            format!("-c.rs={}", request.radius),
            format!("-out={}", request.output),
            "-sort=_r".to_string(),
            format!("-out.max={}", request.max_rows),
            "-mime=csv".to_string(),
        ]
    }
}

#[async_trait]
impl CatalogService for VizqueryClient {
    #[instrument(skip(self, request), fields(source = %request.source))]
    async fn fetch(&self, catalog: &str, request: &QueryRequest) -> Result<String> {
        let args = Self::build_args(request);
        debug!("Spawning {} {}", self.binary, args.join(" "));

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VizcatError::Service {
                message: format!("Failed to spawn '{}': {}", self.binary, e),
            })?;

        // Dropping the wait future on timeout kills the child via kill_on_drop.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| VizcatError::Timeout {
                catalog: catalog.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| VizcatError::Service {
                message: format!("Failed to collect output from '{}': {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(VizcatError::Service {
                message: format!(
                    "'{}' exited with {} for source '{}'",
                    self.binary, output.status, request.source
                ),
            });
        }

        // The original read the tool's stdout and stderr as one stream; the
        // concatenation (stdout first) is the sole input to cleaning.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}
