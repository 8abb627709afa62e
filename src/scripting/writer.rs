use crate::error::{EngineError, Result};

/// A value renderable as a script literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ScriptValue {
    /// Renders the value in the interpreter's literal syntax.
    pub fn render(&self) -> Result<String> {
        match self {
            Self::Str(text) => quote(text),
            Self::Bool(value) => Ok(value.to_string()),
            Self::Int(value) => Ok(value.to_string()),
            Self::Float(value) => {
                if !value.is_finite() {
                    return Err(EngineError::encoding(format!(
                        "{value} is not a finite number"
                    )));
                }
                Ok(value.to_string())
            }
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ScriptValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for ScriptValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// One argument of a member call, positional or named.
#[derive(Debug, Clone)]
pub struct Arg {
    name: Option<String>,
    value: ScriptValue,
}

impl Arg {
    pub fn new(value: impl Into<ScriptValue>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<String>, value: impl Into<ScriptValue>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

/// Formats one statement calling `function` on `receiver`.
///
/// Named arguments are gathered into a single trailing table
/// constructor, the Lua spelling of keyword arguments:
/// `r.loadScene("a.xml", {buildFlags = 2})`. A positional argument
/// after a named one cannot be expressed and is rejected.
pub fn member_call(receiver: &str, function: &str, args: &[Arg]) -> Result<String> {
    let mut rendered = Vec::with_capacity(args.len());
    let mut named = Vec::new();
    for arg in args {
        match &arg.name {
            None => {
                if !named.is_empty() {
                    return Err(EngineError::encoding(
                        "positional argument follows a named argument",
                    ));
                }
                rendered.push(arg.value.render()?);
            }
            Some(name) => named.push(format!("{name} = {}", arg.value.render()?)),
        }
    }
    if !named.is_empty() {
        rendered.push(format!("{{{}}}", named.join(", ")));
    }
    Ok(format!("{receiver}.{function}({})\n", rendered.join(", ")))
}

/// Formats one property assignment: `receiver.property = value`.
pub fn set_property(receiver: &str, property: &str, value: impl Into<ScriptValue>) -> Result<String> {
    Ok(format!(
        "{receiver}.{property} = {}\n",
        value.into().render()?
    ))
}

fn quote(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                return Err(EngineError::encoding(format!(
                    "control character {c:?} in string"
                )));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_call_renders_literals() {
        let line = member_call(
            "r",
            "loadScene",
            &[Arg::new("media/arcade.xml"), Arg::new(2u32)],
        )
        .unwrap();
        assert_eq!(line, "r.loadScene(\"media/arcade.xml\", 2)\n");
    }

    #[test]
    fn member_call_without_arguments() {
        assert_eq!(member_call("t", "pause", &[]).unwrap(), "t.pause()\n");
    }

    #[test]
    fn named_arguments_render_as_trailing_table() {
        let line = member_call(
            "r",
            "loadScene",
            &[
                Arg::new("a.xml"),
                Arg::named("buildFlags", 2i64),
                Arg::named("async", false),
            ],
        )
        .unwrap();
        assert_eq!(line, "r.loadScene(\"a.xml\", {buildFlags = 2, async = false})\n");
    }

    #[test]
    fn positional_after_named_is_rejected() {
        let result = member_call("r", "f", &[Arg::named("k", 1i64), Arg::new(2i64)]);
        assert!(matches!(result, Err(EngineError::Encoding(_))));
    }

    #[test]
    fn set_property_renders_booleans_and_floats() {
        assert_eq!(set_property("r", "ui", true).unwrap(), "r.ui = true\n");
        assert_eq!(set_property("t", "time", 2.5).unwrap(), "t.time = 2.5\n");
    }

    #[test]
    fn strings_escape_quotes_and_backslashes() {
        let line = set_property("fc", "outputDir", "C:\\out\\\"daily\"").unwrap();
        assert_eq!(line, "fc.outputDir = \"C:\\\\out\\\\\\\"daily\\\"\"\n");
    }

    #[test]
    fn control_characters_are_an_encoding_error() {
        let result = ScriptValue::from("bad\u{7}name").render();
        assert!(matches!(result, Err(EngineError::Encoding(_))));
    }

    #[test]
    fn non_finite_floats_are_an_encoding_error() {
        assert!(matches!(
            ScriptValue::Float(f64::NAN).render(),
            Err(EngineError::Encoding(_))
        ));
        assert!(matches!(
            ScriptValue::Float(f64::INFINITY).render(),
            Err(EngineError::Encoding(_))
        ));
    }
}
