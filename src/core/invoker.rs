//! Invocation of the transform for one file

use crate::config::TransformOptions;
use crate::error::{FilterError, Result};
use crate::transform::Transform;

/// Run `transform` on `content` from `relative_path`.
///
/// The transform sees a per-call copy of `options` whose path fields name
/// this file; `options` itself is never modified. Transform failures are
/// wrapped with the path and passed on unchanged.
pub fn invoke(
    transform: &dyn Transform,
    options: &TransformOptions,
    relative_path: &str,
    content: &str,
) -> Result<String> {
    let per_file = options.for_file(relative_path);

    transform
        .transform(content, &per_file)
        .map_err(|source| FilterError::Transform {
            path: relative_path.to_string(),
            message: source.to_string(),
            source,
        })
}
