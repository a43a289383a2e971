//! Wrapper source generation.
//!
//! Each wrapped function gets a small shim module that imports the user's
//! handler, wraps it with the tracer and re-exports it under the same name.
//! There are four shapes, one per runtime family and module style; all of them
//! share the same tracer configuration rendering so a given option bag produces
//! identical keys and values in every language, differing only in boolean
//! spelling and the key/value separator.

use crate::constants::tracer;
use crate::error::{Result, WrapError};
use crate::runtime::RuntimeFamily;

/// A pass-through tracer option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    /// Interprets a configured string, treating `true`/`false` in any case as booleans.
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        match value.to_lowercase().as_str() {
            "true" => OptionValue::Bool(true),
            "false" => OptionValue::Bool(false),
            _ => OptionValue::Text(value),
        }
    }
}

/// Tracer options forwarded verbatim into generated wrappers, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracerOptions {
    entries: Vec<(String, OptionValue)>,
}

impl TracerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: OptionValue) {
        self.entries.push((key.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Literal syntax of the target language for tracer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSyntax {
    /// `key: 'value'`, `key: true`
    JavaScript,
    /// `key='value'`, `key=True`
    Python,
}

impl ConfigSyntax {
    fn separator(self) -> &'static str {
        match self {
            ConfigSyntax::JavaScript => ": ",
            ConfigSyntax::Python => "=",
        }
    }

    fn boolean(self, value: bool) -> &'static str {
        match (self, value) {
            (ConfigSyntax::JavaScript, true) => "true",
            (ConfigSyntax::JavaScript, false) => "false",
            (ConfigSyntax::Python, true) => "True",
            (ConfigSyntax::Python, false) => "False",
        }
    }

    fn value(self, value: &OptionValue) -> String {
        match value {
            OptionValue::Bool(b) => self.boolean(*b).to_string(),
            OptionValue::Text(s) => quote(s),
        }
    }
}

// Single-quoted literal on one line; JavaScript and Python share these escapes.
fn quote(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c => literal.push(c),
        }
    }
    literal.push('\'');
    literal
}

/// Renders `token` followed by every option as a comma-separated argument list.
pub fn render_tracer_config(token: &str, options: &TracerOptions, syntax: ConfigSyntax) -> String {
    let sep = syntax.separator();
    std::iter::once(format!("token{}{}", sep, quote(token)))
        .chain(
            options
                .iter()
                .map(|(key, value)| format!("{}{}{}", key, sep, syntax.value(value))),
        )
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inputs shared by every template shape.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub token: Option<&'a str>,
    /// Node: slash path relative to the service root. Python: dotted module path.
    pub module_path: &'a str,
    pub symbol_name: &'a str,
    pub options: &'a TracerOptions,
}

/// The four wrapper shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperTemplate {
    /// `require` based CommonJS module.
    NodeCommonJs,
    /// Static `import` ES module; `extension` is appended to the import specifier.
    NodeEsModule { extension: String },
    /// Decorated forwarding function.
    Python,
    /// Same as `Python`, preceded by a best-effort `unzip_requirements` import.
    PythonZip,
}

impl WrapperTemplate {
    /// Picks the shape for `family` from the module style and packaging settings.
    pub fn select(family: RuntimeFamily, es_module_extension: Option<&str>, zipped: bool) -> Self {
        match (family, es_module_extension) {
            (RuntimeFamily::Node, Some(extension)) => WrapperTemplate::NodeEsModule {
                extension: extension.to_string(),
            },
            (RuntimeFamily::Node, None) => WrapperTemplate::NodeCommonJs,
            (RuntimeFamily::Python, _) if zipped => WrapperTemplate::PythonZip,
            (RuntimeFamily::Python, _) => WrapperTemplate::Python,
        }
    }

    pub fn family(&self) -> RuntimeFamily {
        match self {
            WrapperTemplate::NodeCommonJs | WrapperTemplate::NodeEsModule { .. } => {
                RuntimeFamily::Node
            }
            WrapperTemplate::Python | WrapperTemplate::PythonZip => RuntimeFamily::Python,
        }
    }

    /// File extension of the generated wrapper.
    pub fn file_extension(&self) -> &str {
        match self {
            WrapperTemplate::NodeCommonJs => "js",
            WrapperTemplate::NodeEsModule { extension } => extension,
            WrapperTemplate::Python | WrapperTemplate::PythonZip => "py",
        }
    }

    /// Produces the wrapper source. Fails when no tracer token is configured.
    pub fn render(&self, ctx: &TemplateContext<'_>) -> Result<String> {
        let token = ctx.token.ok_or(WrapError::MissingToken)?;

        let source = match self {
            WrapperTemplate::NodeCommonJs => {
                let config = render_tracer_config(token, ctx.options, ConfigSyntax::JavaScript);
                format!(
                    r#"const tracer = require("{package}")({{ {config} }});
const handler = require('../{module}').{symbol};

module.exports.{symbol} = tracer.trace(handler);
"#,
                    package = tracer::NODE_PACKAGE,
                    config = config,
                    module = ctx.module_path,
                    symbol = ctx.symbol_name,
                )
            }
            WrapperTemplate::NodeEsModule { extension } => {
                let config = render_tracer_config(token, ctx.options, ConfigSyntax::JavaScript);
                format!(
                    r#"import lumigo from '{package}';
import {{ {symbol} as originalHandler }} from '../{module}.{extension}';

const tracer = lumigo({{ {config} }});

export const {symbol} = tracer.trace(originalHandler);
"#,
                    package = tracer::NODE_PACKAGE,
                    config = config,
                    module = ctx.module_path,
                    extension = extension,
                    symbol = ctx.symbol_name,
                )
            }
            WrapperTemplate::Python => python_wrapper(token, ctx),
            WrapperTemplate::PythonZip => format!(
                r#"try:
    import unzip_requirements
except ImportError:
    pass

{}"#,
                python_wrapper(token, ctx)
            ),
        };

        Ok(source)
    }
}

// The module path is a runtime string, hence importlib rather than a `from .. import`.
fn python_wrapper(token: &str, ctx: &TemplateContext<'_>) -> String {
    let config = render_tracer_config(token, ctx.options, ConfigSyntax::Python);
    format!(
        r#"import importlib
from lumigo_tracer import lumigo_tracer

userHandler = getattr(importlib.import_module("{module}"), "{symbol}")


@lumigo_tracer({config})
def {symbol}(event, context):
    return userHandler(event, context)
"#,
        module = ctx.module_path,
        symbol = ctx.symbol_name,
        config = config,
    )
}
