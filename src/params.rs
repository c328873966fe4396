use std::collections::HashMap;

/// An interpolation parameter value.
///
/// Primitive variants participate in cache-key generation; `Map` values
/// support dotted-path lookup inside templates but force the call to
/// bypass the result cache.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Map(HashMap<String, ParamValue>),
}

/// Named interpolation parameters for a single `translate` call.
pub type Params = HashMap<String, ParamValue>;

impl ParamValue {
    pub fn is_primitive(&self) -> bool {
        !matches!(self, ParamValue::Map(_))
    }

    /// Stringify for interpolation.
    pub fn render(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Int(n) => n.to_string(),
            ParamValue::Float(n) => n.to_string(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Map(_) => "[object]".to_string(),
        }
    }

    /// Look up a dotted path through nested `Map` values.
    ///
    /// `lookup(params, ["user", "name"])` finds `params["user"]["name"]`.
    pub fn lookup<'a>(params: &'a Params, path: &[String]) -> Option<&'a ParamValue> {
        let (first, rest) = path.split_first()?;
        let mut current = params.get(first)?;
        for segment in rest {
            match current {
                ParamValue::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<HashMap<String, ParamValue>> for ParamValue {
    fn from(value: HashMap<String, ParamValue>) -> Self {
        ParamValue::Map(value)
    }
}
