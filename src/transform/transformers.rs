//! Named rewrite steps of the ES transpiler and their selection rules

use crate::config::TransformOptions;
use crate::transform::lexer::{Token, TokenKind};

/// A named token-level rewrite
pub struct Transformer {
    /// Name used in whitelist / blacklist / optional
    pub name: &'static str,
    /// Off unless listed in `optional`
    pub optional: bool,
    run: fn(&mut Vec<Token<'_>>),
}

impl Transformer {
    pub fn run(&self, tokens: &mut Vec<Token<'_>>) {
        (self.run)(tokens)
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .finish()
    }
}

/// All transformers in the order they run
pub static TRANSFORMERS: &[Transformer] = &[
    Transformer {
        name: "es6.blockScoping",
        optional: false,
        run: block_scoping,
    },
    Transformer {
        name: "minification.removeDebugger",
        optional: true,
        run: remove_debugger,
    },
    Transformer {
        name: "strict",
        optional: false,
        run: use_strict,
    },
];

/// Work out which transformers run for `options`.
///
/// A non-empty whitelist restricts the set to the listed names, the
/// blacklist removes names, and optional transformers only run when named in
/// `optional`. Any name that is not a known transformer is an error.
pub fn resolve_transformers(
    options: &TransformOptions,
) -> Result<Vec<&'static Transformer>, String> {
    for (list, names) in [
        ("whitelist", &options.whitelist),
        ("blacklist", &options.blacklist),
        ("optional", &options.optional),
    ] {
        if let Some(unknown) = names
            .iter()
            .find(|name| !TRANSFORMERS.iter().any(|t| t.name == name.as_str()))
        {
            return Err(format!("Unknown transformer '{}' in {}", unknown, list));
        }
    }

    Ok(TRANSFORMERS
        .iter()
        .filter(|t| options.whitelist.is_empty() || options.whitelist.contains(t.name))
        .filter(|t| !options.blacklist.contains(t.name))
        .filter(|t| !t.optional || options.optional.contains(t.name))
        .collect())
}

fn prev_significant(tokens: &[Token<'_>], index: usize) -> Option<usize> {
    (0..index).rev().find(|&i| !tokens[i].is_trivia())
}

fn next_significant(tokens: &[Token<'_>], index: usize) -> Option<usize> {
    (index + 1..tokens.len()).find(|&i| !tokens[i].is_trivia())
}

/// `x.let` and `x.debugger` are property names, not keywords
fn is_member_name(tokens: &[Token<'_>], index: usize) -> bool {
    prev_significant(tokens, index).is_some_and(|i| tokens[i].is_punct("."))
}

/// Keywords whose parenthesized head is followed by a block, not a function body
const BLOCK_HEAD_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "with"];

/// What a `{` opens, as far as `let` / `const` scoping is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BraceScope {
    /// Function or method body: bindings behave like `var` at this level
    Function,
    /// Statement block, class body or object literal
    Block,
}

/// Whether the `let` / `const` at `index` starts a declaration
fn is_declaration(tokens: &[Token<'_>], index: usize) -> bool {
    if is_member_name(tokens, index) {
        return false;
    }
    next_significant(tokens, index).is_some_and(|j| {
        let next = &tokens[j];
        match next.kind {
            TokenKind::Identifier => !matches!(next.text, "in" | "instanceof" | "of"),
            TokenKind::Punct => matches!(next.text, "[" | "{"),
            _ => false,
        }
    })
}

/// Scope opened by the `{` at `index`, given whether the most recent `)`
/// closed the head of a block statement
fn brace_scope(
    tokens: &[Token<'_>],
    index: usize,
    last_paren_was_block_head: bool,
) -> BraceScope {
    let Some(p) = prev_significant(tokens, index) else {
        return BraceScope::Block;
    };
    let prev = &tokens[p];
    // `(x) => {`: the lexer splits `=>` into `=` and `>`
    let arrow = prev.is_punct(">") && p > 0 && tokens[p - 1].is_punct("=");
    if arrow || (prev.is_punct(")") && !last_paren_was_block_head) {
        BraceScope::Function
    } else {
        BraceScope::Block
    }
}

/// Rewrite `let` / `const` declarations to `var` where that keeps the
/// program's meaning.
///
/// Only declarations made directly at the top level or directly in a
/// function body are rewritten; there a `var` binds the same name over the
/// same code. Declarations inside blocks, loop heads and `switch` bodies are
/// left alone, so shadowed names and per-iteration loop bindings keep their
/// behaviour.
fn block_scoping(tokens: &mut Vec<Token<'_>>) {
    // Open braces with the paren depth at which each was opened
    let mut braces: Vec<(BraceScope, usize)> = Vec::new();
    // One entry per open `(`: whether it is a block statement head
    let mut parens: Vec<bool> = Vec::new();
    let mut last_paren_was_block_head = false;
    let mut rewrite = Vec::new();

    for i in 0..tokens.len() {
        let tok = tokens[i];
        match tok.kind {
            TokenKind::Punct => match tok.text {
                "(" => {
                    let block_head = prev_significant(tokens, i).is_some_and(|p| {
                        tokens[p].kind == TokenKind::Identifier
                            && BLOCK_HEAD_KEYWORDS.contains(&tokens[p].text)
                    });
                    parens.push(block_head);
                }
                ")" => last_paren_was_block_head = parens.pop().unwrap_or(false),
                "{" => {
                    let scope = brace_scope(tokens, i, last_paren_was_block_head);
                    braces.push((scope, parens.len()));
                }
                "}" => {
                    braces.pop();
                }
                _ => {}
            },
            TokenKind::Identifier if matches!(tok.text, "let" | "const") => {
                let function_level = match braces.last() {
                    None => parens.is_empty(),
                    Some(&(scope, depth)) => {
                        scope == BraceScope::Function && parens.len() == depth
                    }
                };
                if function_level && is_declaration(tokens, i) {
                    rewrite.push(i);
                }
            }
            _ => {}
        }
    }

    for i in rewrite {
        tokens[i].text = "var";
    }
}

/// Drop `debugger` statements
fn remove_debugger(tokens: &mut Vec<Token<'_>>) {
    let mut i = 0;
    while i < tokens.len() {
        if !tokens[i].is_ident("debugger") || is_member_name(tokens, i) {
            i += 1;
            continue;
        }

        // `if (x) debugger;` still needs a statement in the body
        let needs_empty_statement = prev_significant(tokens, i).is_some_and(|p| {
            tokens[p].is_punct(")") || tokens[p].is_ident("else") || tokens[p].is_ident("do")
        });

        let mut end = i + 1;
        if let Some(j) = next_significant(tokens, i) {
            if tokens[j].is_punct(";") {
                end = j + 1;
            }
        }

        let (line, column) = (tokens[i].line, tokens[i].column);
        if needs_empty_statement {
            tokens.splice(i..end, [Token::new(TokenKind::Punct, ";", line, column)]);
            i += 1;
        } else {
            tokens.drain(i..end);
        }
    }
}

/// Prepend a `"use strict";` directive unless one is already present
fn use_strict(tokens: &mut Vec<Token<'_>>) {
    let first = tokens.iter().find(|t| !t.is_trivia());
    if let Some(tok) = first {
        if tok.kind == TokenKind::String && matches!(tok.text, "\"use strict\"" | "'use strict'") {
            return;
        }
    }

    let directive = [
        Token::new(TokenKind::String, "\"use strict\"", 1, 1),
        Token::new(TokenKind::Punct, ";", 1, 1),
    ];

    match tokens.first() {
        Some(tok) if tok.kind == TokenKind::Hashbang => {
            let mut inserted = vec![Token::new(TokenKind::Whitespace, "\n", 1, 1)];
            inserted.extend(directive);
            tokens.splice(1..1, inserted);
        }
        _ => {
            let mut inserted = directive.to_vec();
            inserted.push(Token::new(TokenKind::Whitespace, "\n", 1, 1));
            tokens.splice(0..0, inserted);
        }
    }
}
