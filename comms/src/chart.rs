use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque chart descriptor handed through to the chart library.
///
/// The core interprets exactly one field: `name`, the unique redraw target
/// the library uses to locate the chart. Everything else is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartSpec(Value);

impl ChartSpec {
    pub fn new(spec: Value) -> Self {
        Self(spec)
    }

    /// The redraw target id, when the spec carries one.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_is_the_only_interpreted_field() {
        let spec = ChartSpec::new(json!({"name": "loss", "mark": "line", "encoding": {}}));
        assert_eq!(spec.name(), Some("loss"));

        let nameless = ChartSpec::new(json!({"mark": "line"}));
        assert_eq!(nameless.name(), None);
    }

    #[test]
    fn serde_is_transparent() {
        let raw = json!({"name": "accuracy", "width": 400});
        let spec: ChartSpec = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&spec).unwrap(), raw);
    }
}
