//! Constants for the lumigo-wrapper package.
//!
//! Names, paths and identifiers that must stay stable across releases, since
//! both the generated wrappers and the published tracer layers depend on them.

/// Layout of the generated wrapper artifacts.
pub mod output {
    /// Directory (relative to the service root) holding generated wrappers.
    pub const FOLDER: &str = "_lumigo";

    /// Glob appended to each wrapped function's `package.include`.
    pub const INCLUDE_GLOB: &str = "_lumigo/*";
}

/// Tracer distribution names.
pub mod tracer {
    /// npm package providing the node tracer.
    pub const NODE_PACKAGE: &str = "@lumigo/tracer";

    /// Node manifest checked for a tracer the service already depends on.
    pub const NODE_MANIFEST: &str = "package.json";

    /// Version installed when `pinVersion` is not configured.
    pub const NODE_DEFAULT_VERSION: &str = "latest";

    /// Accepted spellings of the python tracer in a requirements file.
    pub const PYTHON_REQUIREMENT_MARKERS: [&str; 2] = ["lumigo_tracer", "lumigo-tracer"];

    /// Requirements file looked up when no override is configured.
    pub const PYTHON_REQUIREMENTS_FILE: &str = "requirements.txt";
}

/// Layer publishing coordinates.
pub mod layers {
    /// AWS account publishing the tracer layers.
    pub const PUBLISHER_ACCOUNT: &str = "114300393969";

    pub const NODE_LAYER_NAME: &str = "lumigo-node-tracer";
    pub const PYTHON_LAYER_NAME: &str = "lumigo-python-tracer";

    /// Version listing for the node layer.
    pub const NODE_VERSIONS_URL: &str =
        "https://raw.githubusercontent.com/lumigo-io/lumigo-node/master/layers/LAYERS.md";

    /// Version listing for the python layer.
    pub const PYTHON_VERSIONS_URL: &str =
        "https://raw.githubusercontent.com/lumigo-io/python_tracer/master/layers/LAYERS.md";

    /// Entry point the node layer exposes in place of the user handler.
    pub const NODE_HANDLER: &str = "lumigo-auto-instrument.handler";

    /// Entry point the python layer exposes in place of the user handler.
    pub const PYTHON_HANDLER: &str = "/opt/python/lumigo_tracer._handler";
}

/// Environment variables set on functions in layer mode.
pub mod env_vars {
    /// Original handler reference, restored by the layer at cold start.
    pub const ORIGINAL_HANDLER: &str = "LUMIGO_ORIGINAL_HANDLER";

    /// Tracer token read by the layer.
    pub const TRACER_TOKEN: &str = "LUMIGO_TRACER_TOKEN";
}

/// Other serverless plugins the wrapper reacts to.
pub mod plugins {
    /// Bundler that cannot see generated wrapper files; forces layer mode.
    pub const ESBUILD: &str = "serverless-esbuild";

    /// Suggested in the error raised for a missing requirements file.
    pub const PYTHON_REQUIREMENTS: &str = "serverless-python-requirements";
}

/// Default values for configuration parameters.
pub mod defaults {
    /// Region used when neither the CLI nor the provider names one.
    pub const REGION: &str = "us-east-1";

    /// File extension for node modules (wrapper file and ESM import specifier).
    pub const NODE_MODULE_FILE_EXTENSION: &str = "js";
}
