//! Tools the agent runtime may call back into
//!
//! Tools are registered explicitly at startup; nothing is discovered from
//! the filesystem. Each tool declares a typed parameter struct whose JSON
//! Schema is advertised to the runtime with every session.

mod calculator;
mod cost_estimator;
mod matchup;
mod prediction;
mod teams;
mod weather;

pub use calculator::Calculator;
pub use cost_estimator::CostEstimator;
pub use matchup::MatchupAnalyzer;
pub use prediction::PredictWinner;
pub use weather::Weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::agents::domain::ToolSpec;
use crate::agents::error::{AgentError, Result};

/// A callable tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema for the arguments
    fn parameters(&self) -> Value;

    /// Run the tool; the returned text is handed to the model
    async fn invoke(&self, args: Value) -> anyhow::Result<String>;
}

/// JSON Schema for a parameter struct
pub(crate) fn schema_of<P: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(P)).unwrap_or(Value::Null)
}

/// Decode arguments into a parameter struct (null counts as `{}`)
pub(crate) fn parse_args<P: DeserializeOwned>(args: Value) -> anyhow::Result<P> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| anyhow::anyhow!("Invalid arguments: {}", e))
}

/// Ordered, name-indexed set of tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every demo tool
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Calculator));
        registry.register(Arc::new(CostEstimator));
        registry.register(Arc::new(MatchupAnalyzer));
        registry.register(Arc::new(PredictWinner));
        registry.register(Arc::new(Weather));
        registry
    }

    /// Add a tool; a tool with the same name replaces the earlier one in place
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        match self.by_name.get(name) {
            Some(&index) => self.tools[index] = tool,
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
        tracing::debug!(tool = %name, "Registered tool");
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions advertised to the runtime, in registration order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    pub async fn invoke(&self, name: &str, args: Value) -> Result<String> {
        let tool = self
            .by_name
            .get(name)
            .map(|&i| self.tools[i].clone())
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        tool.invoke(args)
            .await
            .map_err(|e| AgentError::Runtime(format!("{} failed: {}", name, e)))
    }
}
