use serde::{Deserialize, Serialize};

use crate::convertor::{ConvertorConfig, SimulatedBackendConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub convertor: ConvertorConfig,
    #[serde(default)]
    pub backend: SimulatedBackendConfig,
}
