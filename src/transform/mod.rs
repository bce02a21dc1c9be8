//! Pluggable transforms
//!
//! A transform turns the text of one file into new text given the per-file
//! options. The filter never looks inside a transform; it only needs a
//! stable identity (name and version) for cache keys and a way to reject
//! options up front.

mod code_frame;
mod es;
mod lexer;
mod transformers;

use crate::config::TransformOptions;
use crate::error::BoxError;

pub use code_frame::code_frame;
pub use es::{EsTranspiler, SyntaxError};
pub use lexer::{tokenize, Token, TokenKind};
pub use transformers::{resolve_transformers, Transformer, TRANSFORMERS};

/// A source-to-source transform
pub trait Transform: Send + Sync {
    /// Name of the transform, part of every cache key
    fn name(&self) -> &str;

    /// Version of the transform, part of every cache key
    fn version(&self) -> &str;

    /// Reject options the transform cannot work with.
    ///
    /// Called once when a filter is constructed; an error here is fatal for
    /// the whole run rather than for a single file.
    fn validate(&self, _options: &TransformOptions) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Transform the content of one file
    fn transform(
        &self,
        content: &str,
        options: &TransformOptions,
    ) -> std::result::Result<String, BoxError>;
}

/// Adapts a plain function into a [`Transform`]
pub struct FnTransform<F> {
    name: String,
    version: String,
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&str, &TransformOptions) -> std::result::Result<String, BoxError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, version: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            f,
        }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&str, &TransformOptions) -> std::result::Result<String, BoxError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn transform(
        &self,
        content: &str,
        options: &TransformOptions,
    ) -> std::result::Result<String, BoxError> {
        (self.f)(content, options)
    }
}
