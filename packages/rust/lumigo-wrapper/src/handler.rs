//! Handler path algebra.
//!
//! A serverless handler reference is `<module path>.<exported symbol>`, where the
//! module path may itself contain dots (`hello.world.handler`) and slash-separated
//! directories (`foo.bar/zoo.handler`). Everything after the final dot is the
//! symbol; everything before it is the module path.
//!
//! No normalization is performed: `..` segments and mixed separators are carried
//! through verbatim.

use crate::constants::output;
use crate::error::{Result, WrapError};
use std::path::PathBuf;

/// A handler reference split into module path and exported symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    module: String,
    symbol: String,
}

impl HandlerRef {
    /// Splits `handler` at its final dot.
    pub fn parse(handler: &str) -> Result<Self> {
        let (module, symbol) = handler
            .rsplit_once('.')
            .ok_or_else(|| WrapError::MalformedHandler(handler.to_string()))?;

        Ok(HandlerRef {
            module: module.to_string(),
            symbol: symbol.to_string(),
        })
    }

    /// Exported function name, e.g. `handler` for `foo/bar.baz.handler`.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Module path importable from node, slashes preserved: `foo/bar.baz`.
    pub fn node_module_path(&self) -> &str {
        &self.module
    }

    /// Dotted module path importable from python: `foo.bar.baz`.
    pub fn python_module_path(&self) -> String {
        self.module.replace('/', ".")
    }

    /// Directory holding the handler module, empty when it sits at the service root.
    pub fn directory(&self) -> &str {
        self.module
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }
}

/// Path of the generated wrapper for `local_name`, relative to the service root.
///
/// Named after the function's local name rather than its handler so two
/// functions sharing a handler still get distinct files.
pub fn wrapper_file(local_name: &str, extension: &str) -> PathBuf {
    PathBuf::from(output::FOLDER).join(format!("{}.{}", local_name, extension))
}

/// Handler reference pointing at the generated wrapper: `_lumigo/<local_name>.<symbol>`.
pub fn wrapped_handler(local_name: &str, symbol: &str) -> String {
    format!("{}/{}.{}", output::FOLDER, local_name, symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_handler() {
        let handler = HandlerRef::parse("hello.world").unwrap();
        assert_eq!(handler.symbol(), "world");
        assert_eq!(handler.node_module_path(), "hello");
        assert_eq!(handler.python_module_path(), "hello");
        assert_eq!(handler.directory(), "");
    }

    #[test]
    fn test_parse_dot_in_filename() {
        let handler = HandlerRef::parse("hello.world.handler").unwrap();
        assert_eq!(handler.symbol(), "handler");
        assert_eq!(handler.node_module_path(), "hello.world");
        assert_eq!(handler.python_module_path(), "hello.world");
    }

    #[test]
    fn test_parse_nested_directories() {
        let handler = HandlerRef::parse("foo/foo/bar.handler").unwrap();
        assert_eq!(handler.symbol(), "handler");
        assert_eq!(handler.node_module_path(), "foo/foo/bar");
        assert_eq!(handler.python_module_path(), "foo.foo.bar");
        assert_eq!(handler.directory(), "foo/foo");
    }

    #[test]
    fn test_parse_dot_in_directory_and_slash() {
        let handler = HandlerRef::parse("foo.bar/zoo.handler").unwrap();
        assert_eq!(handler.symbol(), "handler");
        assert_eq!(handler.node_module_path(), "foo.bar/zoo");
        assert_eq!(handler.python_module_path(), "foo.bar.zoo");
        assert_eq!(handler.directory(), "foo.bar");
    }

    #[test]
    fn test_parse_keeps_traversal_segments() {
        let handler = HandlerRef::parse("../shared/index.handler").unwrap();
        assert_eq!(handler.node_module_path(), "../shared/index");
        assert_eq!(handler.python_module_path(), "...shared.index");
    }

    #[test]
    fn test_parse_without_dot_is_rejected() {
        let err = HandlerRef::parse("functions/handler").unwrap_err();
        assert!(matches!(err, WrapError::MalformedHandler(h) if h == "functions/handler"));
    }

    #[test]
    fn test_wrapper_paths_follow_local_name() {
        assert_eq!(wrapper_file("pack", "js"), PathBuf::from("_lumigo/pack.js"));
        assert_eq!(
            wrapper_file("hello.world", "py"),
            PathBuf::from("_lumigo/hello.world.py")
        );
        assert_eq!(wrapped_handler("pack", "handler"), "_lumigo/pack.handler");

        // same handler, different local names
        assert_ne!(wrapper_file("foo", "js"), wrapper_file("bar", "js"));
    }
}
