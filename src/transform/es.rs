//! Built-in ES transpiler

use crate::config::TransformOptions;
use crate::error::BoxError;
use crate::transform::code_frame::code_frame;
use crate::transform::lexer::{check_brackets, tokenize, LexError, Token, TokenKind};
use crate::transform::transformers::resolve_transformers;
use crate::transform::Transform;
use thiserror::Error;

/// Malformed input reported by [`EsTranspiler`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({line}:{column})")]
pub struct SyntaxError {
    pub message: String,
    /// 1-indexed line of the error
    pub line: usize,
    /// 1-indexed column of the error
    pub column: usize,
    /// Source excerpt with a caret under the error
    pub frame: String,
}

impl SyntaxError {
    fn from_lex(err: LexError, source: &str, highlight: bool) -> Self {
        let frame = code_frame(source, err.line, err.column, highlight);
        Self {
            message: err.message,
            line: err.line,
            column: err.column,
            frame,
        }
    }
}

/// Token-level ES transpiler.
///
/// Checks that the input is lexically well formed with balanced brackets,
/// runs the selected transformers and re-emits the source with trailing
/// whitespace trimmed and a single final newline.
#[derive(Debug, Default, Clone, Copy)]
pub struct EsTranspiler;

impl EsTranspiler {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for EsTranspiler {
    fn name(&self) -> &str {
        "es-transpiler"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn validate(&self, options: &TransformOptions) -> std::result::Result<(), String> {
        resolve_transformers(options).map(|_| ())
    }

    fn transform(
        &self,
        content: &str,
        options: &TransformOptions,
    ) -> std::result::Result<String, BoxError> {
        let source = content.replace("\r\n", "\n");

        let mut tokens = tokenize(&source, options.non_standard)
            .map_err(|e| SyntaxError::from_lex(e, &source, options.highlight_code))?;
        check_brackets(&tokens)
            .map_err(|e| SyntaxError::from_lex(e, &source, options.highlight_code))?;

        for transformer in resolve_transformers(options)? {
            transformer.run(&mut tokens);
        }

        if !options.comments {
            strip_comments(&mut tokens);
        }

        let mut output = emit(&tokens);

        if options.source_url {
            if let Some(name) = &options.source_file_name {
                output.push_str("//# sourceURL=");
                output.push_str(name);
                output.push('\n');
            }
        }

        Ok(output)
    }
}

/// Remove comments without gluing neighbouring tokens together
fn strip_comments(tokens: &mut Vec<Token<'_>>) {
    tokens.retain(|t| t.kind != TokenKind::LineComment);
    for tok in tokens.iter_mut() {
        if tok.kind == TokenKind::BlockComment {
            tok.kind = TokenKind::Whitespace;
            tok.text = if tok.text.contains('\n') { "\n" } else { " " };
        }
    }
}

/// Concatenate tokens, trimming trailing whitespace on every line.
///
/// Only whitespace tokens and line comments are trimmed, so multi-line
/// strings and templates keep their exact content.
fn emit(tokens: &[Token<'_>]) -> String {
    let end = tokens
        .iter()
        .rposition(|t| t.kind != TokenKind::Whitespace)
        .map_or(0, |i| i + 1);

    let mut output = String::new();
    // Adjacent whitespace tokens are trimmed as one run
    let mut whitespace = String::new();
    for tok in &tokens[..end] {
        if tok.kind == TokenKind::Whitespace {
            whitespace.push_str(tok.text);
            continue;
        }
        push_whitespace(&mut output, &whitespace);
        whitespace.clear();

        match tok.kind {
            TokenKind::LineComment => output.push_str(tok.text.trim_end()),
            _ => output.push_str(tok.text),
        }
    }

    if !output.is_empty() {
        output.push('\n');
    }
    output
}

fn push_whitespace(output: &mut String, run: &str) {
    let mut parts = run.split('\n').peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_some() {
            output.push_str(part.trim_end_matches([' ', '\t']));
            output.push('\n');
        } else {
            output.push_str(part);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn transpile(source: &str, options: &TransformOptions) -> Result<String, SyntaxError> {
        EsTranspiler::new()
            .transform(source, options)
            .map_err(|e| *e.downcast::<SyntaxError>().unwrap())
    }

    #[test]
    fn test_simple_declaration() {
        let output = transpile("const x = 1;", &TransformOptions::default()).unwrap();
        assert_eq!(output, "\"use strict\";\nvar x = 1;\n");
    }

    #[test]
    fn test_idempotent_output() {
        let source = "let a = [1, 2];\r\nfunction f() {   \r\n  return a;\r\n}\r\n\r\n";
        let options = TransformOptions::default();
        let first = transpile(source, &options).unwrap();
        let second = transpile(source, &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "\"use strict\";\nvar a = [1, 2];\nfunction f() {\n  return a;\n}\n"
        );
    }

    #[test]
    fn test_trailing_whitespace_in_template_is_kept() {
        let mut options = TransformOptions::default();
        options.whitelist.insert("strict".to_string());
        options.blacklist.insert("strict".to_string());
        let output = transpile("var t = `a  \nb`;  \n", &options).unwrap();
        assert_eq!(output, "var t = `a  \nb`;\n");
    }

    #[test]
    fn test_comments_removed_when_disabled() {
        let mut options = TransformOptions::default();
        options.comments = false;
        options.blacklist.insert("strict".to_string());
        let output = transpile("var a/* x */= 1; // note\n/*\n*/var b;", &options).unwrap();
        assert_eq!(output, "var a = 1;\n\nvar b;\n");
    }

    #[test]
    fn test_comments_kept_by_default() {
        let mut options = TransformOptions::default();
        options.blacklist.insert("strict".to_string());
        let output = transpile("// header\nvar a = 1;", &options).unwrap();
        assert_eq!(output, "// header\nvar a = 1;\n");
    }

    #[test]
    fn test_source_url_trailer() {
        let mut options = TransformOptions::default().for_file("lib/a.js");
        options.source_url = true;
        let output = transpile("var a;", &options).unwrap();
        assert!(output.ends_with("var a;\n//# sourceURL=lib/a.js\n"));
    }

    #[test]
    fn test_unbalanced_braces_report_position() {
        let mut options = TransformOptions::default();
        options.highlight_code = false;
        let err = transpile("function f() {\n  return 1;\n", &options).unwrap_err();
        assert_eq!(err.message, "Unclosed `{`");
        assert_eq!((err.line, err.column), (1, 14));
        assert_eq!(err.to_string(), "Unclosed `{` (1:14)");
        assert!(err.frame.contains("> 1 | function f() {"));
    }

    #[test]
    fn test_decorators_rejected_without_non_standard() {
        let mut options = TransformOptions::default();
        options.non_standard = false;
        options.highlight_code = false;
        let err = transpile("@observable\nclass A {}", &options).unwrap_err();
        assert_eq!(err.message, "Unexpected character '@'");

        options.non_standard = true;
        assert!(transpile("@observable\nclass A {}", &options).is_ok());
    }

    #[test]
    fn test_empty_input_without_transformers() {
        let mut options = TransformOptions::default();
        options.blacklist.insert("strict".to_string());
        assert_eq!(transpile("   \n\n", &options).unwrap(), "");
    }

    #[test]
    fn test_validate_rejects_unknown_transformer() {
        let mut options = TransformOptions::default();
        options.optional.insert("es7.decorators".to_string());
        assert!(EsTranspiler::new().validate(&options).is_err());
    }
}
