//! Command Line Tokenizer
//!
//! Splits a command line on ASCII whitespace. Double quotes group a token
//! that contains spaces; the quotes themselves are dropped.

/// One token and the byte offset where it starts in the source line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub offset: usize,
}

/// Tokenizes a command line
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_ascii_whitespace() {
            chars.next();
            continue;
        }

        let mut text = String::new();
        let mut quoted = false;
        while let Some(&(_, c)) = chars.peek() {
            if c == '"' {
                quoted = !quoted;
            } else if c.is_ascii_whitespace() && !quoted {
                break;
            } else {
                text.push(c);
            }
            chars.next();
        }
        tokens.push(Token { text, offset });
    }

    tokens
}

/// Untokenized remainder of `line` starting at token `index`
pub fn remainder<'a>(line: &'a str, tokens: &[Token], index: usize) -> Option<&'a str> {
    let token = tokens.get(index)?;
    let rest = line[token.offset..].trim_end();
    (!rest.is_empty()).then_some(rest)
}
