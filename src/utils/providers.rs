//! Backend/provider string parsing and diagnostics

use crate::{
    config::{BackendType, ExecutionProvider},
    error::{ClassifyError, Result},
};

/// Environment variable consulted when no `--backend` flag is given
pub const BACKEND_ENV_VAR: &str = "LABELVISION_BACKEND";

/// Information about an execution provider
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub execution_provider: ExecutionProvider,
    pub available: bool,
    pub description: String,
}

/// Utility for parsing and listing execution providers
pub struct ExecutionProviderManager;

impl ExecutionProviderManager {
    /// Parse execution provider string in format "backend:provider"
    ///
    /// A bare backend name selects its default provider.
    ///
    /// # Examples
    /// ```rust
    /// use labelvision::utils::ExecutionProviderManager;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let (backend, provider) = ExecutionProviderManager::parse_provider_string("onnx:cuda")?;
    /// let (backend, provider) = ExecutionProviderManager::parse_provider_string("tract")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse_provider_string(provider_str: &str) -> Result<(BackendType, ExecutionProvider)> {
        let normalized = provider_str.trim().to_ascii_lowercase();
        let (backend, provider) = match normalized.split_once(':') {
            Some((backend, provider)) => (backend, Some(provider)),
            None => (normalized.as_str(), None),
        };

        match backend {
            "onnx" => {
                let execution_provider = match provider.unwrap_or("auto") {
                    "auto" => ExecutionProvider::Auto,
                    "cpu" => ExecutionProvider::Cpu,
                    "cuda" => ExecutionProvider::Cuda,
                    "coreml" => ExecutionProvider::CoreMl,
                    other => {
                        return Err(ClassifyError::invalid_config(format!(
                            "Unknown ONNX provider: {other}. Supported: auto, cpu, cuda, coreml"
                        )));
                    },
                };
                Ok((BackendType::Onnx, execution_provider))
            },
            "tract" => match provider.unwrap_or("cpu") {
                "cpu" => Ok((BackendType::Tract, ExecutionProvider::Cpu)),
                other => Err(ClassifyError::invalid_config(format!(
                    "Unknown Tract provider: {other}. Tract only supports 'cpu'"
                ))),
            },
            other => Err(ClassifyError::invalid_config(format!(
                "Unknown backend: {other}. Use backend:provider (e.g., tract, onnx:auto, onnx:cuda)"
            ))),
        }
    }

    /// Resolve the backend from an explicit value, then `LABELVISION_BACKEND`
    pub fn resolve(explicit: Option<&str>) -> Result<(BackendType, ExecutionProvider)> {
        let from_env = std::env::var(BACKEND_ENV_VAR).ok();
        Self::resolve_from(explicit, from_env.as_deref())
    }

    fn resolve_from(
        explicit: Option<&str>,
        from_env: Option<&str>,
    ) -> Result<(BackendType, ExecutionProvider)> {
        match explicit.or(from_env) {
            Some(value) => Self::parse_provider_string(value),
            None => {
                let backend_type = BackendType::default();
                let provider = match backend_type {
                    BackendType::Tract => ExecutionProvider::Cpu,
                    BackendType::Onnx => ExecutionProvider::Auto,
                };
                Ok((backend_type, provider))
            },
        }
    }

    /// List provider combinations with their availability in this build
    #[must_use]
    pub fn list_all_providers() -> Vec<ProviderInfo> {
        let mut providers = Vec::new();

        #[cfg(feature = "onnx")]
        let (cuda, coreml) = crate::backends::OnnxBackend::accelerators();
        #[cfg(not(feature = "onnx"))]
        let (cuda, coreml) = (false, false);
        let onnx = cfg!(feature = "onnx");

        let entries = [
            (
                "onnx:auto",
                ExecutionProvider::Auto,
                onnx,
                "ONNX Runtime with auto-selected provider",
            ),
            ("onnx:cpu", ExecutionProvider::Cpu, onnx, "ONNX Runtime CPU execution"),
            (
                "onnx:cuda",
                ExecutionProvider::Cuda,
                onnx && cuda,
                "ONNX Runtime CUDA GPU acceleration",
            ),
            (
                "onnx:coreml",
                ExecutionProvider::CoreMl,
                onnx && coreml,
                "ONNX Runtime CoreML acceleration",
            ),
        ];
        for (name, execution_provider, available, description) in entries {
            providers.push(ProviderInfo {
                name: name.to_string(),
                backend_type: BackendType::Onnx,
                execution_provider,
                available,
                description: description.to_string(),
            });
        }

        providers.push(ProviderInfo {
            name: "tract:cpu".to_string(),
            backend_type: BackendType::Tract,
            execution_provider: ExecutionProvider::Cpu,
            available: cfg!(feature = "tract"),
            description: "Pure Rust CPU inference with no external dependencies".to_string(),
        });

        providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_string() {
        assert_eq!(
            ExecutionProviderManager::parse_provider_string("onnx:cuda").unwrap(),
            (BackendType::Onnx, ExecutionProvider::Cuda)
        );
        assert_eq!(
            ExecutionProviderManager::parse_provider_string("ONNX").unwrap(),
            (BackendType::Onnx, ExecutionProvider::Auto)
        );
        assert_eq!(
            ExecutionProviderManager::parse_provider_string("tract").unwrap(),
            (BackendType::Tract, ExecutionProvider::Cpu)
        );
        assert_eq!(
            ExecutionProviderManager::parse_provider_string(" tract:cpu ").unwrap(),
            (BackendType::Tract, ExecutionProvider::Cpu)
        );
    }

    #[test]
    fn test_parse_provider_string_errors() {
        for value in ["tract:cuda", "onnx:tpu", "tensorflow", "", ":cpu"] {
            assert!(
                ExecutionProviderManager::parse_provider_string(value).is_err(),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_explicit_value_wins() {
        let (backend, provider) = ExecutionProviderManager::resolve(Some("onnx:cpu")).unwrap();
        assert_eq!(backend, BackendType::Onnx);
        assert_eq!(provider, ExecutionProvider::Cpu);
    }

    #[test]
    fn test_environment_fallback() {
        let from_env = Some("onnx:coreml");

        let (backend, provider) = ExecutionProviderManager::resolve_from(None, from_env).unwrap();
        assert_eq!((backend, provider), (BackendType::Onnx, ExecutionProvider::CoreMl));

        let (backend, provider) =
            ExecutionProviderManager::resolve_from(Some("tract"), from_env).unwrap();
        assert_eq!((backend, provider), (BackendType::Tract, ExecutionProvider::Cpu));

        assert!(ExecutionProviderManager::resolve_from(None, Some("tensorflow")).is_err());

        let (backend, _) = ExecutionProviderManager::resolve_from(None, None).unwrap();
        assert_eq!(backend, BackendType::default());
    }

    #[test]
    fn test_list_all_providers() {
        let providers = ExecutionProviderManager::list_all_providers();
        assert_eq!(providers.len(), 5);
        let tract = providers.iter().find(|p| p.name == "tract:cpu").unwrap();
        assert_eq!(tract.available, cfg!(feature = "tract"));
    }
}
