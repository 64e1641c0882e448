//! Typed fatal errors.
//!
//! Every fatal error aborts the run before any output file is written; a
//! partially generated CMakeLists.txt is never left behind. Non-fatal
//! conditions (a pattern matching nothing, a default third party without an
//! `include/` directory, a binary module without a resolvable main file)
//! are logged as warnings and leave the affected entry empty or skipped.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Which kind of component a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Module,
    ThirdParty,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Module => f.write_str("module"),
            ComponentKind::ThirdParty => f.write_str("third party"),
        }
    }
}

/// Fatal generation errors.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    /// A referenced module or third party has no descriptor.
    #[error("no descriptor found for {kind} `{name}`")]
    #[diagnostic(
        code(slipway::provider::missing_descriptor),
        help("every module needs a build.toml in its directory under sources/ or third_parties/")
    )]
    MissingDescriptor { kind: ComponentKind, name: String },

    /// Output kind, main file or hook presence differs between axes.
    #[error("module `{module}` declares a different `{field}` across configurations")]
    #[diagnostic(
        code(slipway::graph::inconsistent_shape),
        help("only dependencies, third-parties and system-libs may vary per configuration")
    )]
    InconsistentShape {
        module: String,
        field: &'static str,
    },

    /// A dependency or third-party name is used but absent from the
    /// resolved universe.
    #[error("module `{module}` references unknown {kind} `{reference}`")]
    #[diagnostic(code(slipway::graph::missing_reference))]
    MissingReference {
        module: String,
        kind: ComponentKind,
        reference: String,
    },

    /// The dependency graph contains a cycle.
    #[error("dependency cycle detected: {chain}")]
    #[diagnostic(
        code(slipway::graph::cycle),
        help("break the cycle by removing one of the dependencies")
    )]
    Cycle { chain: String },
}

impl GenerateError {
    pub fn missing_module(name: impl Into<String>) -> Self {
        GenerateError::MissingDescriptor {
            kind: ComponentKind::Module,
            name: name.into(),
        }
    }

    pub fn missing_third_party(name: impl Into<String>) -> Self {
        GenerateError::MissingDescriptor {
            kind: ComponentKind::ThirdParty,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GenerateError::missing_module("app");
        assert_eq!(err.to_string(), "no descriptor found for module `app`");

        let err = GenerateError::MissingReference {
            module: "app".to_string(),
            kind: ComponentKind::ThirdParty,
            reference: "zlib".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "module `app` references unknown third party `zlib`"
        );

        let err = GenerateError::Cycle {
            chain: "x -> y -> x".to_string(),
        };
        assert!(err.to_string().contains("x -> y -> x"));
    }
}
