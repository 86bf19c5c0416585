//! HTTP client for the enforcement daemon's admin endpoint

use arbiter_lib::models::{MinCapacity, NmCapacity};
use arbiter_lib::{ControlPlane, ControlPlaneError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Serialize)]
struct EnsureCapacityRequest<'a> {
    target: &'a NmCapacity,
    conflicting_resources: &'a [String],
    is_decrease: bool,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    running: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct PropertyValue {
    value: String,
}

/// Control plane implementation talking JSON to the daemon's local
/// admin listener
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
    /// Last floor the daemon reported, served when a refresh fails
    cached_min: Mutex<MinCapacity>,
}

impl HttpControlPlane {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cached_min: Mutex::new(MinCapacity::default()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn command(&self, path: &str) -> Result<(), ControlPlaneError> {
        let response = self
            .client
            .post(self.url(path))
            .send()
            .await
            .map_err(|e| ControlPlaneError::Command(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ControlPlaneError::Command(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn capacity(&self) -> Result<NmCapacity, ControlPlaneError> {
        let response = self
            .client
            .get(self.url("/v1/capacity"))
            .send()
            .await
            .map_err(|e| ControlPlaneError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| ControlPlaneError::Unavailable(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| ControlPlaneError::Unavailable(e.to_string()))
    }

    async fn min_capacity(&self) -> MinCapacity {
        let fetched: Result<MinCapacity, reqwest::Error> = async {
            self.client
                .get(self.url("/v1/capacity/min"))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
        }
        .await;

        match fetched {
            Ok(min) => {
                *self.cached_min.lock().unwrap() = min;
                min
            }
            Err(e) => {
                let cached = *self.cached_min.lock().unwrap();
                warn!(error = %e, "Failed to refresh minimum capacity, using cached value");
                cached
            }
        }
    }

    async fn ensure_capacity(
        &self,
        target: &NmCapacity,
        conflicting_resources: &[String],
        is_decrease: bool,
    ) -> Result<(), ControlPlaneError> {
        let body = EnsureCapacityRequest {
            target,
            conflicting_resources,
            is_decrease,
        };
        let response = self
            .client
            .put(self.url("/v1/capacity"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Command(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ControlPlaneError::Command(format!(
                "capacity update returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn status(&self) -> Result<bool, ControlPlaneError> {
        let response: StatusResponse = self
            .client
            .get(self.url("/v1/process/status"))
            .send()
            .await
            .map_err(|e| ControlPlaneError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| ControlPlaneError::Unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| ControlPlaneError::Unavailable(e.to_string()))?;
        Ok(response.running)
    }

    async fn start_process(&self) -> Result<(), ControlPlaneError> {
        self.command("/v1/process/start").await
    }

    async fn stop_process(&self) -> Result<(), ControlPlaneError> {
        self.command("/v1/process/stop").await
    }

    async fn disable_scheduling(&self) -> Result<(), ControlPlaneError> {
        self.command("/v1/scheduler/disable").await
    }

    async fn enable_scheduling(&self) -> Result<(), ControlPlaneError> {
        self.command("/v1/scheduler/enable").await
    }

    async fn get_property(&self, key: &str) -> Result<String, ControlPlaneError> {
        let response: PropertyValue = self
            .client
            .get(self.url(&format!("/v1/properties/{key}")))
            .send()
            .await
            .map_err(|e| ControlPlaneError::Property {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| ControlPlaneError::Property {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| ControlPlaneError::Property {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(response.value)
    }

    async fn set_property(&self, key: &str, value: &str) -> Result<(), ControlPlaneError> {
        let body = PropertyValue {
            value: value.to_string(),
        };
        let response = self
            .client
            .put(self.url(&format!("/v1/properties/{key}")))
            .json(&body)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Property {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(ControlPlaneError::Property {
                key: key.to_string(),
                message: format!("update returned {}", response.status()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let control = HttpControlPlane::new("http://127.0.0.1:10670/").unwrap();
        assert_eq!(control.url("/v1/capacity"), "http://127.0.0.1:10670/v1/capacity");
    }
}
