//! 搜索查询文本的词法分析器

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取双引号包围的字符串字面量
    /// 注意：开始的引号已经被调用者消费
    fn read_string(&mut self, start: usize) -> Token<'a> {
        let content_start = self.position;
        while let Some(c) = self.peek() {
            if c == '"' {
                let content = &self.input[content_start..self.position];
                self.bump(); // 消费结束引号
                return Token {
                    kind: TokenKind::String(content),
                    span: Span::new(start, self.position),
                };
            }
            self.bump();
        }

        // 没有结束引号，吞掉剩余输入
        Token {
            kind: TokenKind::Unterminated,
            span: Span::new(start, self.position),
        }
    }

    /// 读取裸词（键名或未加引号的值）
    /// 裸词在空白、运算符、冒号、逗号或引号处结束
    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if is_word_char(c) {
                self.bump();
            } else {
                break;
            }
        }
        Token {
            kind: TokenKind::Word(&self.input[start..self.position]),
            span: Span::new(start, self.position),
        }
    }
}

/// 能出现在裸词中的字符
pub(crate) fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ':' | ',' | '<' | '>' | '!' | '=' | '"')
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            return None; // 到达输入末尾
        };

        let token = match c {
            ':' => Token { kind: TokenKind::Colon, span: Span::new(start, self.position) },
            ',' => Token { kind: TokenKind::Comma, span: Span::new(start, self.position) },
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Token { kind: TokenKind::Lte, span: Span::new(start, self.position) }
                } else {
                    Token { kind: TokenKind::Lt, span: Span::new(start, self.position) }
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Token { kind: TokenKind::Gte, span: Span::new(start, self.position) }
                } else {
                    Token { kind: TokenKind::Gt, span: Span::new(start, self.position) }
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Token { kind: TokenKind::NotEq, span: Span::new(start, self.position) }
                } else {
                    Token { kind: TokenKind::Illegal, span: Span::new(start, self.position) }
                }
            }
            '"' => self.read_string(start),
            c if is_word_char(c) => self.read_word(start),
            _ => Token { kind: TokenKind::Illegal, span: Span::new(start, self.position) },
        };
        Some(token)
    }
}
