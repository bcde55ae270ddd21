//! Decorator-class synthesis for JVM classfiles.
//!
//! Given a class or interface reachable through a [`TypeReader`], the
//! generator emits a loadable decorator class whose instances hold a delegate
//! in a `wrapped` field and forward every overridable method to it. An
//! optional template class contributes hand-written bodies that take
//! precedence over the generated delegation.

#![forbid(unsafe_code)]

mod assemble;
mod diag;
mod emit;
mod generator;
mod hierarchy;
mod merge;
mod policy;

use thiserror::Error;

pub use crate::assemble::assemble_plain;
pub use crate::diag::{DiagnosticsSink, SkipReason, SkippedMember};
pub use crate::emit::{constructor_body, delegation_body, Dispatch};
pub use crate::generator::DecoratorGenerator;
pub use crate::hierarchy::{walk, OBJECT};
pub use crate::merge::merge_template;
pub use crate::policy::{classify, effective_access, Action, GenerationState};

use jdecor_classfile::ClassFile;

/// Name of the synthetic field holding the delegate instance.
pub const DELEGATE_FIELD: &str = "wrapped";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed signature `{descriptor}` on {owner}.{name}: {source}")]
    MalformedSignature {
        owner: String,
        name: String,
        descriptor: String,
        source: jdecor_classfile::Error,
    },
    #[error("unable to resolve type {name}: {source}")]
    UnresolvedType {
        name: String,
        source: TypeReadError,
    },
    #[error("generated class failed structural verification:\n{0}")]
    InvalidArtifact(String),
    #[error("classfile error: {0}")]
    ClassFile(#[from] jdecor_classfile::Error),
}

/// Why a [`TypeReader`] could not produce a type.
#[derive(Debug, Error)]
pub enum TypeReadError {
    #[error("class {0} not found")]
    NotFound(String),
    #[error("io error reading {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    ClassFile(#[from] jdecor_classfile::Error),
}

/// Capability to resolve JVM internal names to type descriptions.
///
/// `read_class` feeds the hierarchy walk; `read_bytes` loads the raw bytes of
/// a template class for the merge pass.
pub trait TypeReader {
    fn read_class(&self, internal_name: &str) -> std::result::Result<ClassFile, TypeReadError>;
    fn read_bytes(&self, internal_name: &str) -> std::result::Result<Vec<u8>, TypeReadError>;
}

/// Capability to check a finished artifact.
///
/// Non-empty diagnostics are fatal; the generator surfaces them verbatim and
/// never attempts repair.
pub trait Verifier {
    fn verify(&self, bytes: &[u8]) -> String;
}

/// [`Verifier`] backed by [`jdecor_classfile::check_class`].
#[derive(Debug, Default)]
pub struct StructuralChecker;

impl Verifier for StructuralChecker {
    fn verify(&self, bytes: &[u8]) -> String {
        jdecor_classfile::check_class(bytes)
    }
}
