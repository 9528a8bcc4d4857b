//! Tokenizer for ISC dhcpd configuration lines.

/// Token types for dhcpd config lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Quoted(String),
    LeftBrace,
    RightBrace,
    Semicolon,
}

impl Token {
    /// Text of a word or quoted string
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Word(text) | Token::Quoted(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_word(&self, expected: &str) -> bool {
        matches!(self, Token::Word(word) if word == expected)
    }
}

/// Simple lexer over a single line. Commas separate values like whitespace.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            chars: line.chars().peekable(),
        }
    }

    fn read_quoted(&mut self) -> Option<String> {
        let mut result = String::new();
        self.chars.next(); // opening quote

        while let Some(ch) = self.chars.next() {
            match ch {
                '"' => return Some(result),
                '\\' => {
                    if let Some(escaped) = self.chars.next() {
                        result.push(escaped);
                    }
                }
                _ => result.push(ch),
            }
        }

        None
    }

    fn read_word(&mut self) -> String {
        let mut result = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || matches!(ch, '{' | '}' | ';' | ',' | '"' | '#') {
                break;
            }
            result.push(ch);
            self.chars.next();
        }

        result
    }

    /// Tokenize the whole line. None if a quoted string is left open.
    pub fn tokenize(mut self) -> Option<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(&ch) = self.chars.peek() {
            match ch {
                '#' => break,
                '{' => {
                    self.chars.next();
                    tokens.push(Token::LeftBrace);
                }
                '}' => {
                    self.chars.next();
                    tokens.push(Token::RightBrace);
                }
                ';' => {
                    self.chars.next();
                    tokens.push(Token::Semicolon);
                }
                '"' => tokens.push(Token::Quoted(self.read_quoted()?)),
                ch if ch.is_whitespace() || ch == ',' => {
                    self.chars.next();
                }
                _ => tokens.push(Token::Word(self.read_word())),
            }
        }

        Some(tokens)
    }
}

/// Tokenize one line
pub fn tokenize(line: &str) -> Option<Vec<Token>> {
    Lexer::new(line).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Token {
        Token::Word(text.to_string())
    }

    #[test]
    fn test_subnet_header() {
        let tokens = tokenize("subnet 192.168.194.0 netmask 255.255.255.0 {").unwrap();
        assert_eq!(
            tokens,
            vec![
                word("subnet"),
                word("192.168.194.0"),
                word("netmask"),
                word("255.255.255.0"),
                Token::LeftBrace,
            ]
        );
    }

    #[test]
    fn test_statement_with_quotes_and_commas() {
        let tokens = tokenize("  option domain-name \"local domain\";").unwrap();
        assert_eq!(
            tokens,
            vec![
                word("option"),
                word("domain-name"),
                Token::Quoted("local domain".to_string()),
                Token::Semicolon,
            ]
        );

        let tokens = tokenize("option routers 10.0.0.1,10.0.0.2 ;").unwrap();
        assert_eq!(
            tokens,
            vec![
                word("option"),
                word("routers"),
                word("10.0.0.1"),
                word("10.0.0.2"),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines() {
        assert_eq!(tokenize("# Written at: 01/01/2024").unwrap(), vec![]);
        assert_eq!(tokenize("   ").unwrap(), vec![]);
        assert_eq!(
            tokenize("default-lease-time 1800; # 30 minutes").unwrap(),
            vec![word("default-lease-time"), word("1800"), Token::Semicolon]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(tokenize("option domain-name \"oops;").is_none());
    }

    #[test]
    fn test_closing_brace() {
        assert_eq!(tokenize("  }  ").unwrap(), vec![Token::RightBrace]);
    }
}
