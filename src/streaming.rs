//! Incremental line-oriented output.
//!
//! Handlers describe what they produced with [`Output`]; the
//! [`StreamWriter`] turns that into console lines. Streamed values are
//! written and flushed one at a time, so each value is observable before the
//! producing iterator computes the next one.

use std::io::{BufWriter, Write};

use serde_json::Value;

use crate::error::Result;

/// What a command handler produced.
pub enum Output {
    /// Nothing; no line is written.
    None,
    /// A single value, written as one line.
    Value(Value),
    /// A lazily produced sequence; each item is written as its own line the
    /// moment it becomes available.
    Stream(Box<dyn Iterator<Item = Value>>),
}

impl Output {
    /// Stream every item of `items` as its own line.
    pub fn stream<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        Output::Stream(Box::new(items.into_iter().map(Into::into)))
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Output::Value(value)
    }
}

impl From<()> for Output {
    fn from(_: ()) -> Self {
        Output::None
    }
}

macro_rules! scalar_output {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Output {
            fn from(value: $ty) -> Self {
                Output::Value(Value::from(value))
            }
        }
    )*};
}

scalar_output!(i64, i32, u32, f64, bool, String, &str);

/// Line sink that flushes after every line.
pub struct StreamWriter<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: BufWriter::new(writer),
        }
    }

    /// Write one line and flush it through to the sink.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()?;
        Ok(())
    }

    /// Drain a handler's output into the sink.
    ///
    /// For [`Output::Stream`], the iterator is advanced only after the
    /// previous item's line has been written and flushed, preserving the
    /// incremental-visibility guarantee.
    pub fn emit(&mut self, output: Output) -> Result<()> {
        match output {
            Output::None => Ok(()),
            Output::Value(value) => self.write_line(&render(&value)),
            Output::Stream(items) => {
                for value in items {
                    self.write_line(&render(&value))?;
                }
                Ok(())
            }
        }
    }
}

/// String form of a produced value: bare contents for text, JSON rendering
/// for everything else.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
