use serde_json::Value;

/// Bound arguments for an entry point, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    values: Vec<(String, Value)>,
}

impl Args {
    pub(crate) fn new(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(arg_name, _)| arg_name == name)
            .map(|(_, value)| value)
    }

    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.values.get(index).map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values.into_iter().map(|(_, value)| value).collect()
    }

    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.values
    }
}
