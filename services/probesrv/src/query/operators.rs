//! Value operators applied to raw query results
//!
//! A leaf in a class query tree carries an [`OperatorPipeline`]: an ordered
//! chain of [`ValueOperator`]s that turn a raw device value into the value
//! stored in the row. The first failing operator aborts the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use errors::{ProbeError, Result};
use netprobe_model::Value;
use serde::{Deserialize, Serialize};

use super::PollContext;

/// One normalization step
#[async_trait]
pub trait ValueOperator: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(&self, ctx: &PollContext, value: Value) -> Result<Value>;
}

/// Built-in operators usable from class definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operator {
    /// Trim surrounding whitespace from strings
    Trim,
    /// Multiply a numeric value, producing a float
    Scale { factor: f64 },
    /// Parse a numeric string
    ParseNumber,
    /// Replace a value by a lookup on its textual form
    Map {
        values: BTreeMap<String, Value>,
        #[serde(default)]
        default: Option<Value>,
    },
}

#[async_trait]
impl ValueOperator for Operator {
    fn name(&self) -> &str {
        match self {
            Operator::Trim => "trim",
            Operator::Scale { .. } => "scale",
            Operator::ParseNumber => "parse_number",
            Operator::Map { .. } => "map",
        }
    }

    async fn apply(&self, _ctx: &PollContext, value: Value) -> Result<Value> {
        match self {
            Operator::Trim => Ok(match value {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other,
            }),
            Operator::Scale { factor } => {
                let number = f64::try_from(value)?;
                Ok(Value::Float(number * factor))
            },
            Operator::ParseNumber => parse_number(value),
            Operator::Map { values, default } => {
                let key = value.to_string();
                values
                    .get(&key)
                    .or(default.as_ref())
                    .cloned()
                    .ok_or_else(|| ProbeError::operator(format!("no mapping for '{}'", key)))
            },
        }
    }
}

fn parse_number(value: Value) -> Result<Value> {
    let Value::String(s) = value else {
        return Ok(value);
    };
    let s = s.trim();
    if let Ok(u) = s.parse::<u64>() {
        return Ok(Value::Unsigned(u));
    }
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    s.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ProbeError::operator(format!("'{}' is not a number", s)))
}

/// Ordered chain of operators
#[derive(Clone, Default)]
pub struct OperatorPipeline {
    operators: Vec<Arc<dyn ValueOperator>>,
}

impl fmt::Debug for OperatorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.operators.iter().map(|op| op.name()))
            .finish()
    }
}

impl OperatorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, operator: impl ValueOperator + 'static) -> Self {
        self.operators.push(Arc::new(operator));
        self
    }

    pub fn push(&mut self, operator: Arc<dyn ValueOperator>) {
        self.operators.push(operator);
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub async fn apply(&self, ctx: &PollContext, mut value: Value) -> Result<Value> {
        for operator in &self.operators {
            value = operator
                .apply(ctx, value)
                .await
                .map_err(|e| e.context(format!("operator '{}' failed", operator.name())))?;
        }
        Ok(value)
    }
}

impl From<Vec<Operator>> for OperatorPipeline {
    fn from(operators: Vec<Operator>) -> Self {
        Self {
            operators: operators
                .into_iter()
                .map(|op| Arc::new(op) as Arc<dyn ValueOperator>)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::mock::MockClient;

    fn ctx() -> PollContext {
        PollContext::new(Arc::new(MockClient::new()))
    }

    #[tokio::test]
    async fn test_pipeline_runs_in_order() {
        let pipeline = OperatorPipeline::new()
            .with(Operator::Trim)
            .with(Operator::ParseNumber)
            .with(Operator::Scale { factor: 0.5 });
        let value = pipeline.apply(&ctx(), Value::from(" 47 ")).await.unwrap();
        assert_eq!(value, Value::Float(23.5));
    }

    #[tokio::test]
    async fn test_map_with_default() {
        let op = Operator::Map {
            values: BTreeMap::from([
                ("1".to_string(), Value::from("up")),
                ("2".to_string(), Value::from("down")),
            ]),
            default: Some(Value::from("unknown")),
        };
        let ctx = ctx();
        assert_eq!(op.apply(&ctx, Value::Integer(1)).await.unwrap(), Value::from("up"));
        assert_eq!(
            op.apply(&ctx, Value::Integer(7)).await.unwrap(),
            Value::from("unknown")
        );
    }

    #[tokio::test]
    async fn test_failure_names_operator() {
        let pipeline = OperatorPipeline::new().with(Operator::ParseNumber);
        let err = pipeline
            .apply(&ctx(), Value::from("n/a"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), errors::ErrorKind::Decode);
        assert!(err.to_string().starts_with("operator 'parse_number' failed"));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let ops: Vec<Operator> =
            serde_yaml::from_str("- type: trim\n- type: scale\n  factor: 0.01\n").unwrap();
        assert_eq!(ops, vec![Operator::Trim, Operator::Scale { factor: 0.01 }]);
        assert_eq!(OperatorPipeline::from(ops).len(), 2);
    }
}
