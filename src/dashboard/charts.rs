use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

/// Rendering hint for the browser side. Styling is left to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Heatmap,
    Histogram,
    Pie,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Trace {
    pub name: String,
    pub x: Vec<Value>,
    pub y: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Vec<Option<f64>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
}

impl Trace {
    pub fn new<X, Y>(name: impl Into<String>, x: X, y: Y) -> Self
    where
        X: IntoIterator,
        X::Item: Into<Value>,
        Y: IntoIterator,
        Y::Item: Into<Value>,
    {
        Self {
            name: name.into(),
            x: x.into_iter().map(Into::into).collect(),
            y: y.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Heatmap trace: `z[row][col]` with rows along `y` and columns along `x`.
    pub fn heatmap<X, Y>(name: impl Into<String>, x: X, y: Y, z: Vec<Vec<Option<f64>>>) -> Self
    where
        X: IntoIterator,
        X::Item: Into<Value>,
        Y: IntoIterator,
        Y::Item: Into<Value>,
    {
        Self {
            z: Some(z),
            ..Self::new(name, x, y)
        }
    }

    pub fn with_size(mut self, size: Vec<f64>) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_text(mut self, text: Vec<String>) -> Self {
        self.text = Some(text);
        self
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    pub traces: Vec<Trace>,
}

impl Chart {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            x_title: None,
            y_title: None,
            barmode: None,
            traces: Vec::new(),
        }
    }

    pub fn axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_title = Some(x.into());
        self.y_title = Some(y.into());
        self
    }

    pub fn grouped(mut self) -> Self {
        self.barmode = Some("group".to_string());
        self
    }

    pub fn trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    pub fn traces(mut self, traces: impl IntoIterator<Item = Trace>) -> Self {
        self.traces.extend(traces);
        self
    }

    /// A chart with no data points renders blank on the client.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.traces.iter().all(Trace::is_empty)
    }
}

pub fn decimal_value(value: Decimal) -> Value {
    value
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
