use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::registry;
use crate::core::CalcError;

pub const MAX_SCENARIOS: usize = 200;
const MAX_NAME_LEN: usize = 120;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("name: {0}")]
    InvalidName(&'static str),
    #[error(transparent)]
    Calc(#[from] CalcError),
    #[error("failed to timestamp scenario: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("scenario '{0}' not found")]
    NotFound(Uuid),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScenario {
    pub name: String,
    pub calculator: String,
    pub inputs: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: Uuid,
    pub name: String,
    pub calculator: String,
    pub inputs: Value,
    pub result: Value,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioStore {
    inner: Arc<RwLock<Vec<Scenario>>>,
}

impl ScenarioStore {
    pub async fn list(&self) -> Vec<Scenario> {
        self.inner.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Result<Scenario, ScenarioError> {
        self.inner
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ScenarioError::NotFound(id))
    }

    pub async fn save(&self, new: NewScenario) -> Result<Scenario, ScenarioError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ScenarioError::InvalidName("must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ScenarioError::InvalidName("must be at most 120 characters"));
        }

        let calculator = registry::find(&new.calculator)?;
        let result = calculator.evaluate(new.inputs.clone())?;
        let scenario = Scenario {
            id: Uuid::new_v4(),
            name: name.to_string(),
            calculator: calculator.id().to_string(),
            inputs: new.inputs,
            result,
            created_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
        };

        let mut scenarios = self.inner.write().await;
        if scenarios.len() >= MAX_SCENARIOS {
            let evicted = scenarios.remove(0);
            tracing::info!(scenario_id = %evicted.id, "evicted oldest scenario");
        }
        scenarios.push(scenario.clone());
        Ok(scenario)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ScenarioError> {
        let mut scenarios = self.inner.write().await;
        let before = scenarios.len();
        scenarios.retain(|s| s.id != id);
        if scenarios.len() == before {
            return Err(ScenarioError::NotFound(id));
        }
        Ok(())
    }
}
