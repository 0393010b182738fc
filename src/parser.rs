//! 搜索查询的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   └─ 循环 parse_clause()，直到输入结束
//!        ├─ 带引号字符串 → 自由文本 (keyword eq "...")
//!        ├─ 裸词后无运算符 → 自由文本 (keyword eq word)
//!        └─ 裸词 + 运算符 → parse_keyed_clause()
//!             ├─ 根键 (type/status/sortBy/sortOrder/policyID)
//!             │    └─ 只允许 ':'，单个值 → 写入 RootFields
//!             ├─ 可选的显式运算符 `key:eq:value`
//!             └─ parse_value_list() → 多值折叠为 or（!= 折叠为 and）
//! ```
//!
//! 所有过滤子句按出现顺序左折叠为 `and` 树。
//!
//! ## 支持的语法结构
//!
//! - **根键**: `type:expense status:all sortBy:date sortOrder:desc policyID:ABC`
//! - **比较操作**: `:`, `!=`, `>`, `<`, `>=`, `<=`
//! - **显式运算符**: `category:eq:Travel`
//! - **多值 (OR)**: `category:Travel,"Meals and Entertainment"`
//! - **自由文本**: `coffee` 或 `"blue bottle"`
//!
//! ## 解析示例
//!
//! ```text
//! type:expense status:all date<2024-01-01 amount>=100
//! category:Travel,Meals merchant!="Blue Bottle"
//! ```

use crate::ast::{AstNode, Operator, ParsedQuery, RootFields, RootKey, Value};
use crate::lexer::Lexer;
use crate::sort::{SortColumn, SortOrder};
use crate::token::{Span, Token, TokenKind};
use thiserror::Error;

/// 自由文本子句使用的字段名
pub const KEYWORD_FIELD: &str = "keyword";

/// 值会被解析为数字的字段
const NUMERIC_FIELDS: &[&str] = &["amount"];

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    fn at_position(message: String, span: Span) -> Self {
        Self { message, span: Some(span) }
    }
}

/// 单个子句的解析结果
enum Clause {
    Root(RootKey, String),
    Filter(AstNode),
}

/// 对查询文本做词法和语法分析
pub fn parse(input: &str) -> Result<ParsedQuery, ParseError> {
    let tokens: Vec<_> = Lexer::new(input).collect();
    Parser::new(&tokens).parse()
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position)
    }

    /// 返回当前位置之后第 n 个 token
    fn peek_nth(&self, n: usize) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position + n)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_token(&self, kind: &TokenKind) -> bool {
        if let Some(token) = self.peek() {
            std::mem::discriminant(&token.kind) == std::mem::discriminant(kind)
        } else {
            false
        }
    }

    /// 检查当前 token 是否为比较运算符
    fn is_comparison_operator(&self) -> bool {
        if let Some(token) = self.peek() {
            matches!(
                token.kind,
                TokenKind::Colon | TokenKind::NotEq | TokenKind::Gt |
                TokenKind::Lt | TokenKind::Gte | TokenKind::Lte
            )
        } else {
            false
        }
    }

    pub fn parse(&mut self) -> Result<ParsedQuery, ParseError> {
        let mut root = RootFields::default();
        let mut filters: Option<AstNode> = None;

        while self.peek().is_some() {
            match self.parse_clause()? {
                Clause::Root(key, value) => root.set(key, value),
                Clause::Filter(node) => {
                    filters = Some(match filters {
                        Some(previous) => AstNode::logical(Operator::And, previous, node),
                        None => node,
                    });
                }
            }
        }

        // 未出现的根键使用语法默认值
        let defaults = RootFields::with_defaults();
        for key in RootKey::ALL {
            if root.get(key).is_none() {
                if let Some(value) = defaults.get(key) {
                    root.set(key, value);
                }
            }
        }

        Ok(ParsedQuery { root, filters })
    }

    fn parse_clause(&mut self) -> Result<Clause, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::new("Unexpected end of input".to_string(), None));
        };

        match &token.kind {
            TokenKind::String(text) => Ok(Clause::Filter(AstNode::comparison(
                Operator::Eq,
                KEYWORD_FIELD,
                Value::Text(text.to_string()),
            ))),
            TokenKind::Word(word) => {
                if self.is_comparison_operator() {
                    self.parse_keyed_clause(word, token.span)
                } else {
                    Ok(Clause::Filter(AstNode::comparison(
                        Operator::Eq,
                        KEYWORD_FIELD,
                        Value::Text(word.to_string()),
                    )))
                }
            }
            other => Err(unexpected(other, token.span)),
        }
    }

    /// 解析 `key OP values` 形式的子句，当前位置在运算符上
    fn parse_keyed_clause(&mut self, key: &str, key_span: Span) -> Result<Clause, ParseError> {
        let op_token = self.advance().ok_or_else(|| {
            ParseError::new("Expected operator, but reached end of input".to_string(), None)
        })?;
        let mut operator = comparison_operator(&op_token.kind).ok_or_else(|| {
            ParseError::at_position(
                format!("Expected comparison operator, found {:?}", op_token.kind),
                op_token.span,
            )
        })?;

        if let Some(root_key) = RootKey::from_name(key) {
            if operator != Operator::Eq {
                return Err(ParseError::at_position(
                    format!("Root key '{}' only supports ':'", key),
                    op_token.span,
                ));
            }
            let (value, value_span) = self.parse_value(key)?;
            if self.match_token(&TokenKind::Comma) {
                return Err(ParseError::at_position(
                    format!("Root key '{}' takes a single value", key),
                    key_span,
                ));
            }
            let value = value.to_string();
            validate_root_value(root_key, &value, value_span)?;
            return Ok(Clause::Root(root_key, value));
        }

        // 显式运算符：key:op:value
        if operator == Operator::Eq {
            if let (Some(name_token), Some(colon)) = (self.peek(), self.peek_nth(1)) {
                if let (TokenKind::Word(name), TokenKind::Colon) = (&name_token.kind, &colon.kind) {
                    operator = Operator::comparison_from_name(name).ok_or_else(|| {
                        ParseError::at_position(
                            format!("Unknown operator '{}'", name),
                            name_token.span,
                        )
                    })?;
                    self.advance();
                    self.advance();
                }
            }
        }

        let values = self.parse_value_list(key)?;
        let combinator = if operator == Operator::Neq { Operator::And } else { Operator::Or };
        let node = values
            .into_iter()
            .map(|value| AstNode::comparison(operator, key, value))
            .reduce(|left, right| AstNode::logical(combinator, left, right))
            .ok_or_else(|| ParseError::at_position(format!("Missing value for '{}'", key), key_span))?;

        Ok(Clause::Filter(node))
    }

    /// 解析逗号分隔的值列表
    ///
    /// 语法: `value (',' value)*`
    fn parse_value_list(&mut self, key: &str) -> Result<Vec<Value>, ParseError> {
        let mut values = vec![self.parse_value(key)?.0];
        while self.match_token(&TokenKind::Comma) {
            self.advance(); // 消费 ','
            values.push(self.parse_value(key)?.0);
        }
        Ok(values)
    }

    fn parse_value(&mut self, key: &str) -> Result<(Value, Span), ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::new(
                format!("Expected value for '{}', but reached end of input", key),
                None,
            ));
        };

        match &token.kind {
            TokenKind::String(s) => Ok((Value::Text(s.to_string()), token.span)),
            TokenKind::Word(w) => {
                if NUMERIC_FIELDS.contains(&key) {
                    if let Ok(n) = w.parse::<i64>() {
                        return Ok((Value::Number(n), token.span));
                    }
                }
                Ok((Value::Text(w.to_string()), token.span))
            }
            other => Err(unexpected(other, token.span)),
        }
    }
}

fn comparison_operator(kind: &TokenKind) -> Option<Operator> {
    match kind {
        TokenKind::Colon => Some(Operator::Eq),
        TokenKind::NotEq => Some(Operator::Neq),
        TokenKind::Gt => Some(Operator::Gt),
        TokenKind::Gte => Some(Operator::Gte),
        TokenKind::Lt => Some(Operator::Lt),
        TokenKind::Lte => Some(Operator::Lte),
        _ => None,
    }
}

fn validate_root_value(key: RootKey, value: &str, span: Span) -> Result<(), ParseError> {
    let valid = match key {
        RootKey::SortOrder => SortOrder::from_name(value).is_some(),
        RootKey::SortBy => SortColumn::from_name(value).is_some(),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(ParseError::at_position(
            format!("Invalid value '{}' for '{}'", value, key.as_str()),
            span,
        ))
    }
}

fn unexpected(kind: &TokenKind, span: Span) -> ParseError {
    match kind {
        TokenKind::Unterminated => ParseError::at_position("Unterminated string literal".to_string(), span),
        TokenKind::Illegal => ParseError::at_position("Illegal character".to_string(), span),
        other => ParseError::at_position(format!("Unexpected token: {:?}", other), span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operand;

    fn field_of(node: &AstNode) -> &str {
        match &node.left {
            Operand::Field(f) => f,
            other => panic!("Expected field operand, found {:?}", other),
        }
    }

    fn child(operand: &Operand) -> &AstNode {
        match operand {
            Operand::Node(node) => node,
            other => panic!("Expected node operand, found {:?}", other),
        }
    }

    #[test]
    fn test_empty_query_has_defaults() {
        let result = parse("").unwrap();
        assert_eq!(result.root, RootFields::with_defaults());
        assert!(result.filters.is_none());
    }

    #[test]
    fn test_root_keys_override_defaults() {
        let result = parse("type:invoice sortOrder:asc policyID:ABC").unwrap();
        assert_eq!(result.root.get(RootKey::Type), Some("invoice"));
        assert_eq!(result.root.get(RootKey::Status), Some("all"));
        assert_eq!(result.root.get(RootKey::SortOrder), Some("asc"));
        assert_eq!(result.root.get(RootKey::PolicyId), Some("ABC"));
        assert!(result.filters.is_none());
    }

    #[test]
    fn test_simple_comparison() {
        let result = parse("date<2024-01-01").unwrap();
        let node = result.filters.unwrap();
        assert_eq!(node.operator, Operator::Lt);
        assert_eq!(field_of(&node), "date");
        assert_eq!(node.right, Operand::Value(Value::Text("2024-01-01".to_string())));
    }

    #[test]
    fn test_amount_is_numeric() {
        let node = parse("amount>=1500").unwrap().filters.unwrap();
        assert_eq!(node.operator, Operator::Gte);
        assert_eq!(node.right, Operand::Value(Value::Number(1500)));
    }

    #[test]
    fn test_value_list_becomes_or_chain() {
        let node = parse("category:A,B,C").unwrap().filters.unwrap();
        assert_eq!(node.operator, Operator::Or);
        let left = child(&node.left);
        assert_eq!(left.operator, Operator::Or);
        assert_eq!(child(&left.left).right, Operand::Value(Value::Text("A".to_string())));
        assert_eq!(child(&left.right).right, Operand::Value(Value::Text("B".to_string())));
        assert_eq!(child(&node.right).right, Operand::Value(Value::Text("C".to_string())));
    }

    #[test]
    fn test_not_equal_list_becomes_and_chain() {
        let node = parse("merchant!=Uber,Lyft").unwrap().filters.unwrap();
        assert_eq!(node.operator, Operator::And);
        assert_eq!(child(&node.left).operator, Operator::Neq);
    }

    #[test]
    fn test_explicit_operator() {
        let explicit = parse("category:eq:A,B").unwrap();
        let implicit = parse("category:A,B").unwrap();
        assert_eq!(explicit, implicit);

        let node = parse("amount:gt:10").unwrap().filters.unwrap();
        assert_eq!(node.operator, Operator::Gt);
    }

    #[test]
    fn test_clauses_are_and_folded() {
        let node = parse("date>2023-01-01 category:Travel coffee").unwrap().filters.unwrap();
        assert_eq!(node.operator, Operator::And);
        let right = child(&node.right);
        assert_eq!(field_of(right), KEYWORD_FIELD);
        assert_eq!(right.right, Operand::Value(Value::Text("coffee".to_string())));
        let left = child(&node.left);
        assert_eq!(left.operator, Operator::And);
        assert_eq!(field_of(child(&left.left)), "date");
        assert_eq!(field_of(child(&left.right)), "category");
    }

    #[test]
    fn test_quoted_free_text() {
        let node = parse(r#""blue bottle""#).unwrap().filters.unwrap();
        assert_eq!(field_of(&node), KEYWORD_FIELD);
        assert_eq!(node.right, Operand::Value(Value::Text("blue bottle".to_string())));
    }

    #[test]
    fn test_dangling_operator_is_error() {
        let err = parse("date<").unwrap_err();
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn test_trailing_comma_is_error() {
        assert!(parse("category:A,").is_err());
    }

    #[test]
    fn test_unbalanced_quote_is_error() {
        let err = parse(r#"merchant:"Blue"#).unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.span, Some(Span::new(9, 14)));
    }

    #[test]
    fn test_unknown_operator_is_error() {
        assert!(parse("amount:about:10").is_err());
        assert!(parse("amount=10").is_err());
        assert!(parse("amount!10").is_err());
    }

    #[test]
    fn test_root_key_restrictions() {
        assert!(parse("type!=expense").is_err());
        assert!(parse("status:a,b").is_err());
        assert!(parse("sortOrder:sideways").is_err());
        assert!(parse("sortBy:nonsense").is_err());
        assert!(parse("sortBy:amount").is_ok());
    }
}
