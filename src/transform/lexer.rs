//! Lossless JavaScript tokenizer
//!
//! Every byte of the input ends up in exactly one token, so concatenating
//! token texts reproduces the source. Only as much of the grammar is
//! recognised as is needed to find strings, templates, comments and regex
//! literals reliably; everything else is an identifier, number or
//! punctuator. Punctuators are single characters except `++` and `--`.

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Run of whitespace, including newlines
    Whitespace,
    /// `// ...` up to (not including) the newline
    LineComment,
    /// `/* ... */`
    BlockComment,
    /// `#!...` on the first line
    Hashbang,
    /// Single or double quoted string
    String,
    /// Template literal, including any `${}` substitutions
    Template,
    /// Regular expression literal with flags
    Regex,
    Number,
    /// Identifier or keyword
    Identifier,
    /// Single punctuator character, or `++` / `--`
    Punct,
}

/// A token borrowing its text from the source (or a static replacement)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// 1-indexed line of the first character
    pub line: usize,
    /// 1-indexed column of the first character
    pub column: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, line: usize, column: usize) -> Self {
        Self {
            kind,
            text,
            line,
            column,
        }
    }

    /// Whitespace and comments
    #[inline]
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::Hashbang
        )
    }

    #[inline]
    pub fn is_punct(&self, c: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == c
    }

    #[inline]
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }
}

/// Position and description of a lexical error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Keywords after which a `/` starts a regular expression
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    #[inline]
    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>, line: usize, column: usize) -> LexError {
        LexError {
            message: message.into(),
            line,
            column,
        }
    }

    /// Scan a quoted string; the opening quote has not been consumed
    fn scan_string(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let quote = self.bump();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error("Unterminated string constant", line, column))
                }
                Some('\\') => {
                    self.bump();
                }
                Some(c) if Some(c) == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    /// Scan a template literal; the opening backtick has not been consumed
    fn scan_template(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        loop {
            match self.bump() {
                None => return Err(self.error("Unterminated template", line, column)),
                Some('\\') => {
                    self.bump();
                }
                Some('`') => return Ok(()),
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    self.scan_substitution(line, column)?;
                }
                Some(_) => {}
            }
        }
    }

    /// Scan a `${ ... }` body up to and including its closing brace
    fn scan_substitution(&mut self, line: usize, column: usize) -> Result<(), LexError> {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated template", line, column)),
                Some('\'') | Some('"') => self.scan_string()?,
                Some('`') => self.scan_template()?,
                Some('/') if self.peek_second() == Some('*') => self.scan_block_comment()?,
                Some('/') if self.peek_second() == Some('/') => self.eat_while(|c| c != '\n'),
                Some('{') => {
                    depth += 1;
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn scan_block_comment(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                None => return Err(self.error("Unterminated comment", line, column)),
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    /// Scan a regex literal; the opening slash has not been consumed
    fn scan_regex(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error("Unterminated regular expression", line, column))
                }
                Some('\\') => {
                    self.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        self.eat_while(is_ident_continue);
        Ok(())
    }
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c == '\\' || c == '#' || c.is_alphabetic()
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c == '\\' || c.is_alphanumeric()
}

/// Keywords whose parenthesized head is followed by a statement
const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Whether a `/` following `prev` starts a regular expression.
///
/// `closes_control_head` is set when `prev` is the `)` ending the head of
/// an `if` / `while` / `for` / `with`, where a statement (and so a regex)
/// may follow.
fn regex_allowed(prev: Option<&Token<'_>>, closes_control_head: bool) -> bool {
    match prev {
        None => true,
        Some(tok) => match tok.kind {
            TokenKind::Identifier => REGEX_PRECEDING_KEYWORDS.contains(&tok.text),
            TokenKind::Punct => match tok.text {
                ")" => closes_control_head,
                // Postfix `i++ / 2`; a prefix `++` can never precede a regex
                "]" | "}" | "++" | "--" => false,
                _ => true,
            },
            _ => false,
        },
    }
}

/// Split `source` into tokens.
///
/// `@` is only accepted when `non_standard` is set (decorator syntax).
pub fn tokenize(source: &str, non_standard: bool) -> Result<Vec<Token<'_>>, LexError> {
    let mut cursor = Cursor::new(source);
    let mut tokens: Vec<Token<'_>> = Vec::new();
    // Index of the last non-trivia token, for the regex heuristic
    let mut last_significant: Option<usize> = None;
    // One entry per open `(`: whether it starts a control statement head
    let mut parens: Vec<bool> = Vec::new();
    let mut closes_control_head = false;

    if source.starts_with("#!") {
        cursor.eat_while(|c| c != '\n');
        tokens.push(Token::new(TokenKind::Hashbang, &source[..cursor.pos], 1, 1));
    }

    while let Some(c) = cursor.peek() {
        let start = cursor.pos;
        let (line, column) = (cursor.line, cursor.column);

        let kind = if c.is_whitespace() {
            cursor.eat_while(char::is_whitespace);
            TokenKind::Whitespace
        } else if c == '/' && cursor.peek_second() == Some('/') {
            cursor.eat_while(|c| c != '\n');
            TokenKind::LineComment
        } else if c == '/' && cursor.peek_second() == Some('*') {
            cursor.scan_block_comment()?;
            TokenKind::BlockComment
        } else if c == '/'
            && regex_allowed(last_significant.map(|i| &tokens[i]), closes_control_head)
        {
            cursor.scan_regex()?;
            TokenKind::Regex
        } else if c == '\'' || c == '"' {
            cursor.scan_string()?;
            TokenKind::String
        } else if c == '`' {
            cursor.scan_template()?;
            TokenKind::Template
        } else if c.is_ascii_digit()
            || (c == '.' && cursor.peek_second().is_some_and(|d| d.is_ascii_digit()))
        {
            cursor.bump();
            let mut prev = c;
            while let Some(d) = cursor.peek() {
                let exponent_sign = (d == '+' || d == '-') && matches!(prev, 'e' | 'E');
                if d.is_alphanumeric() || d == '.' || d == '_' || exponent_sign {
                    prev = d;
                    cursor.bump();
                } else {
                    break;
                }
            }
            TokenKind::Number
        } else if is_ident_start(c) {
            cursor.bump();
            cursor.eat_while(is_ident_continue);
            TokenKind::Identifier
        } else if c == '@' && !non_standard {
            return Err(cursor.error("Unexpected character '@'", line, column));
        } else {
            cursor.bump();
            if (c == '+' || c == '-') && cursor.peek() == Some(c) {
                cursor.bump();
            }
            TokenKind::Punct
        };

        let tok = Token::new(kind, &source[start..cursor.pos], line, column);
        if !tok.is_trivia() {
            closes_control_head = false;
            if tok.is_punct("(") {
                let control = last_significant.is_some_and(|i| {
                    tokens[i].kind == TokenKind::Identifier
                        && CONTROL_KEYWORDS.contains(&tokens[i].text)
                });
                parens.push(control);
            } else if tok.is_punct(")") {
                closes_control_head = parens.pop().unwrap_or(false);
            }
            last_significant = Some(tokens.len());
        }
        tokens.push(tok);
    }

    Ok(tokens)
}

/// Verify that `()`, `[]` and `{}` nest properly
pub fn check_brackets(tokens: &[Token<'_>]) -> Result<(), LexError> {
    let mut stack: Vec<&Token<'_>> = Vec::new();

    for tok in tokens.iter().filter(|t| t.kind == TokenKind::Punct) {
        match tok.text {
            "(" | "[" | "{" => stack.push(tok),
            ")" | "]" | "}" => {
                let expected = match stack.pop() {
                    Some(open) => closing_for(open.text),
                    None => {
                        return Err(LexError {
                            message: format!("Unexpected token `{}`", tok.text),
                            line: tok.line,
                            column: tok.column,
                        })
                    }
                };
                if expected != tok.text {
                    return Err(LexError {
                        message: format!(
                            "Unexpected token `{}`, expected `{}`",
                            tok.text, expected
                        ),
                        line: tok.line,
                        column: tok.column,
                    });
                }
            }
            _ => {}
        }
    }

    match stack.pop() {
        Some(open) => Err(LexError {
            message: format!("Unclosed `{}`", open.text),
            line: open.line,
            column: open.column,
        }),
        None => Ok(()),
    }
}

fn closing_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, true)
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokens_reproduce_source() {
        let source = "#!/usr/bin/env node\nconst s = `a ${ {b: 'c'}.b } d`; // done\n/* x */ let r = /[/]+/g;\n";
        let tokens = tokenize(source, true).unwrap();
        let joined: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(joined, source);
        assert_eq!(tokens[0].kind, TokenKind::Hashbang);
    }

    #[test]
    fn test_regex_versus_division() {
        assert_eq!(
            kinds("a = b / c / d"),
            vec![
                TokenKind::Identifier,
                TokenKind::Punct,
                TokenKind::Identifier,
                TokenKind::Punct,
                TokenKind::Identifier,
                TokenKind::Punct,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(
            kinds("return /ab+c/i"),
            vec![TokenKind::Identifier, TokenKind::Regex]
        );
    }

    #[test]
    fn test_division_after_postfix_increment() {
        let tokens = tokenize("var y = i++ / 2; z = a-- / b;", true).unwrap();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Regex));
        assert!(tokens.iter().any(|t| t.is_punct("++")));
        assert!(tokens.iter().any(|t| t.is_punct("--")));
    }

    #[test]
    fn test_regex_after_control_head() {
        let tokens = tokenize("if (ok) /[(]/.test(s);", true).unwrap();
        let regex = tokens.iter().find(|t| t.kind == TokenKind::Regex).unwrap();
        assert_eq!(regex.text, "/[(]/");
        assert!(check_brackets(&tokens).is_ok());

        // A call's closing paren is still followed by division
        assert_eq!(
            kinds("f(x) / 2"),
            vec![
                TokenKind::Identifier,
                TokenKind::Punct,
                TokenKind::Identifier,
                TokenKind::Punct,
                TokenKind::Punct,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn test_braces_in_strings_are_ignored() {
        let tokens = tokenize("var s = '{'; var t = \"(\";", true).unwrap();
        assert!(check_brackets(&tokens).is_ok());
    }

    #[test]
    fn test_positions_are_one_indexed() {
        let tokens = tokenize("a\n  bc", true).unwrap();
        let bc = tokens.iter().find(|t| t.text == "bc").unwrap();
        assert_eq!((bc.line, bc.column), (2, 3));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("var s = 'abc;\n", true).unwrap_err();
        assert_eq!(err.message, "Unterminated string constant");
        assert_eq!((err.line, err.column), (1, 9));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("a /* never closed", true).unwrap_err();
        assert_eq!(err.message, "Unterminated comment");
    }

    #[test]
    fn test_unclosed_brace() {
        let tokens = tokenize("function f() {\n  return 1;\n", true).unwrap();
        let err = check_brackets(&tokens).unwrap_err();
        assert_eq!(err.message, "Unclosed `{`");
        assert_eq!((err.line, err.column), (1, 14));
    }

    #[test]
    fn test_mismatched_bracket() {
        let tokens = tokenize("foo(1, 2];", true).unwrap();
        let err = check_brackets(&tokens).unwrap_err();
        assert_eq!(err.message, "Unexpected token `]`, expected `)`");
    }

    #[test]
    fn test_stray_closing_brace() {
        let tokens = tokenize("}", true).unwrap();
        let err = check_brackets(&tokens).unwrap_err();
        assert_eq!(err.message, "Unexpected token `}`");
    }

    #[test]
    fn test_decorators_require_non_standard() {
        assert!(tokenize("@dec class A {}", true).is_ok());
        let err = tokenize("@dec class A {}", false).unwrap_err();
        assert_eq!(err.message, "Unexpected character '@'");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1.5e-3 0xff .5 10n"),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number
            ]
        );
    }
}
