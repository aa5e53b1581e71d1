//! Tokenizer for BSL and OneScript sources.
//!
//! Keywords are recognized in both the Russian and the English spelling,
//! case-insensitively. Comments and preprocessor lines are not tokens; they
//! are collected as [`Trivia`] so allow directives can be looked up later.

use super::ParseError;

/// Reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Keyword {
    If,
    Then,
    ElsIf,
    Else,
    EndIf,
    For,
    Each,
    In,
    To,
    Do,
    EndDo,
    While,
    Procedure,
    EndProcedure,
    Function,
    EndFunction,
    Var,
    Export,
    Val,
    Return,
    Try,
    Except,
    EndTry,
    Raise,
    Continue,
    Break,
    And,
    Or,
    Not,
    True,
    False,
    Undefined,
    Null,
    New,
    Goto,
    Execute,
    AddHandler,
    RemoveHandler,
    Async,
    Await,
}

/// Lowercased spellings, Russian first.
const KEYWORDS: &[(&str, Keyword)] = &[
    ("если", Keyword::If),
    ("if", Keyword::If),
    ("тогда", Keyword::Then),
    ("then", Keyword::Then),
    ("иначеесли", Keyword::ElsIf),
    ("elsif", Keyword::ElsIf),
    ("иначе", Keyword::Else),
    ("else", Keyword::Else),
    ("конецесли", Keyword::EndIf),
    ("endif", Keyword::EndIf),
    ("для", Keyword::For),
    ("for", Keyword::For),
    ("каждого", Keyword::Each),
    ("each", Keyword::Each),
    ("из", Keyword::In),
    ("in", Keyword::In),
    ("по", Keyword::To),
    ("to", Keyword::To),
    ("цикл", Keyword::Do),
    ("do", Keyword::Do),
    ("конеццикла", Keyword::EndDo),
    ("enddo", Keyword::EndDo),
    ("пока", Keyword::While),
    ("while", Keyword::While),
    ("процедура", Keyword::Procedure),
    ("procedure", Keyword::Procedure),
    ("конецпроцедуры", Keyword::EndProcedure),
    ("endprocedure", Keyword::EndProcedure),
    ("функция", Keyword::Function),
    ("function", Keyword::Function),
    ("конецфункции", Keyword::EndFunction),
    ("endfunction", Keyword::EndFunction),
    ("перем", Keyword::Var),
    ("var", Keyword::Var),
    ("экспорт", Keyword::Export),
    ("export", Keyword::Export),
    ("знач", Keyword::Val),
    ("val", Keyword::Val),
    ("возврат", Keyword::Return),
    ("return", Keyword::Return),
    ("попытка", Keyword::Try),
    ("try", Keyword::Try),
    ("исключение", Keyword::Except),
    ("except", Keyword::Except),
    ("конецпопытки", Keyword::EndTry),
    ("endtry", Keyword::EndTry),
    ("вызватьисключение", Keyword::Raise),
    ("raise", Keyword::Raise),
    ("продолжить", Keyword::Continue),
    ("continue", Keyword::Continue),
    ("прервать", Keyword::Break),
    ("break", Keyword::Break),
    ("и", Keyword::And),
    ("and", Keyword::And),
    ("или", Keyword::Or),
    ("or", Keyword::Or),
    ("не", Keyword::Not),
    ("not", Keyword::Not),
    ("истина", Keyword::True),
    ("true", Keyword::True),
    ("ложь", Keyword::False),
    ("false", Keyword::False),
    ("неопределено", Keyword::Undefined),
    ("undefined", Keyword::Undefined),
    ("null", Keyword::Null),
    ("новый", Keyword::New),
    ("new", Keyword::New),
    ("перейти", Keyword::Goto),
    ("goto", Keyword::Goto),
    ("выполнить", Keyword::Execute),
    ("execute", Keyword::Execute),
    ("добавитьобработчик", Keyword::AddHandler),
    ("addhandler", Keyword::AddHandler),
    ("удалитьобработчик", Keyword::RemoveHandler),
    ("removehandler", Keyword::RemoveHandler),
    ("асинх", Keyword::Async),
    ("async", Keyword::Async),
    ("ждать", Keyword::Await),
    ("await", Keyword::Await),
];

impl Keyword {
    /// Looks up a keyword by its spelling in either language.
    #[must_use]
    pub fn lookup(word: &str) -> Option<Self> {
        let lowered = word.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == lowered)
            .map(|(_, kw)| *kw)
    }
}

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    Number,
    String,
    Date,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Question,
    Ampersand,
    Tilde,
}

/// A token with its position in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number in characters (1-indexed).
    pub column: usize,
}

impl Token {
    /// Byte offset one past the last character.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Kind of a non-token source fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaKind {
    /// `// ...` line comment.
    Comment,
    /// `#If ... Then`, `#Region ...` and other preprocessor lines.
    Preprocessor,
}

/// A comment or preprocessor line, kept outside of the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia {
    /// Trivia kind.
    pub kind: TriviaKind,
    /// Byte offset of the first character.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    /// Line number (1-indexed).
    pub line: usize,
}

/// Output of [`tokenize`].
#[derive(Debug, Default)]
pub struct Lexed {
    /// Significant tokens in source order.
    pub tokens: Vec<Token>,
    /// Comments and preprocessor lines in source order.
    pub trivia: Vec<Trivia>,
}

struct Cursor<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    line_has_token: bool,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.line_has_token = false;
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

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line, self.column)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits source text into tokens and trivia.
///
/// # Errors
///
/// Returns an error for unterminated string or date literals and for
/// characters that cannot start any token.
pub fn tokenize(source: &str) -> Result<Lexed, ParseError> {
    let mut cursor = Cursor {
        source,
        offset: 0,
        line: 1,
        column: 1,
        line_has_token: false,
    };
    let mut lexed = Lexed::default();

    while let Some(c) = cursor.peek() {
        if c.is_whitespace() || c == '\u{feff}' {
            cursor.bump();
            continue;
        }

        let start = cursor.offset;
        let line = cursor.line;
        let column = cursor.column;

        if c == '/' && cursor.peek_second() == Some('/') {
            cursor.eat_while(|c| c != '\n');
            lexed.trivia.push(Trivia {
                kind: TriviaKind::Comment,
                offset: start,
                len: cursor.offset - start,
                line,
            });
            continue;
        }

        if c == '#' && !cursor.line_has_token {
            cursor.eat_while(|c| c != '\n');
            lexed.trivia.push(Trivia {
                kind: TriviaKind::Preprocessor,
                offset: start,
                len: cursor.offset - start,
                line,
            });
            continue;
        }

        let kind = if is_ident_start(c) {
            cursor.eat_while(is_ident_continue);
            Keyword::lookup(&source[start..cursor.offset])
                .map_or(TokenKind::Identifier, TokenKind::Keyword)
        } else if c.is_ascii_digit() {
            cursor.eat_while(|c| c.is_ascii_digit());
            if cursor.peek() == Some('.') && cursor.peek_second().is_some_and(|c| c.is_ascii_digit())
            {
                cursor.bump();
                cursor.eat_while(|c| c.is_ascii_digit());
            }
            TokenKind::Number
        } else if c == '"' {
            lex_string(&mut cursor)?;
            TokenKind::String
        } else if c == '\'' {
            cursor.bump();
            cursor.eat_while(|c| c != '\'' && c != '\n');
            if cursor.bump() != Some('\'') {
                return Err(ParseError::new("unterminated date literal", line, column));
            }
            TokenKind::Date
        } else {
            cursor.bump();
            match c {
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '=' => TokenKind::Eq,
                '<' => match cursor.peek() {
                    Some('>') => {
                        cursor.bump();
                        TokenKind::NotEq
                    }
                    Some('=') => {
                        cursor.bump();
                        TokenKind::LessEq
                    }
                    _ => TokenKind::Less,
                },
                '>' => {
                    if cursor.peek() == Some('=') {
                        cursor.bump();
                        TokenKind::GreaterEq
                    } else {
                        TokenKind::Greater
                    }
                }
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                ':' => TokenKind::Colon,
                '.' => TokenKind::Dot,
                '?' => TokenKind::Question,
                '&' => TokenKind::Ampersand,
                '~' => TokenKind::Tilde,
                other => {
                    return Err(ParseError::new(
                        format!("unexpected character '{other}'"),
                        line,
                        column,
                    ))
                }
            }
        };

        cursor.line_has_token = true;
        lexed.tokens.push(Token {
            kind,
            offset: start,
            len: cursor.offset - start,
            line,
            column,
        });
    }

    Ok(lexed)
}

/// Consumes a string literal. `""` is an escaped quote; a literal may span
/// lines (continuation lines start with `|`).
fn lex_string(cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
    let opening = cursor.error("unterminated string literal");
    cursor.bump();
    loop {
        match cursor.bump() {
            Some('"') => {
                if cursor.peek() == Some('"') {
                    cursor.bump();
                } else {
                    return Ok(());
                }
            }
            Some(_) => {}
            None => return Err(opening),
        }
    }
}
