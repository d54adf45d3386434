// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::game::DrawRules;

/// Configuration for a [`SessionCoordinator`](super::SessionCoordinator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Lifetime of credentials minted by the built-in authority.
    /// Default: 1800 (30 minutes).
    pub credential_ttl_secs: u64,
    /// Automatic draws applied to new sessions. Default: none.
    pub draw_rules: DrawRules,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            credential_ttl_secs: 30 * 60,
            draw_rules: DrawRules::NONE,
        }
    }
}

impl CoordinatorConfig {
    pub fn credential_ttl(&self) -> Duration {
        i64::try_from(self.credential_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.credential_ttl(), Duration::minutes(30));
        assert_eq!(config.draw_rules, DrawRules::NONE);
    }
    #[test]
    fn test_partial_config() {
        let config: CoordinatorConfig = serde_json::from_str(
            r#"{ "draw_rules": { "threefold_repetition": true, "fifty_moves": true } }"#,
        )
        .unwrap();
        assert_eq!(config.credential_ttl_secs, 1800);
        assert!(config.draw_rules.threefold_repetition);
        assert!(config.draw_rules.fifty_moves);
        assert!(!config.draw_rules.insufficient_material);
    }
    #[test]
    fn test_huge_ttl_saturates() {
        let config = CoordinatorConfig {
            credential_ttl_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.credential_ttl(), Duration::MAX);
    }
}
