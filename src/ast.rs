use serde::Serialize;
use std::fmt;

/// 解析后查询的过滤树节点
///
/// 比较节点的左侧是字段名、右侧是值；逻辑节点（and / or）的两侧都是子节点。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstNode {
    pub operator: Operator,
    pub left: Operand,
    pub right: Operand,
}

impl AstNode {
    pub fn comparison(operator: Operator, field: &str, value: Value) -> Self {
        Self {
            operator,
            left: Operand::Field(field.to_string()),
            right: Operand::Value(value),
        }
    }

    pub fn logical(operator: Operator, left: AstNode, right: AstNode) -> Self {
        Self {
            operator,
            left: Operand::Node(Box::new(left)),
            right: Operand::Node(Box::new(right)),
        }
    }
}

/// 节点的操作数
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Node(Box<AstNode>),
    Field(String),
    Value(Value),
}

/// 字面量值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(i64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

/// 运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,  // :
    Neq, // !=
    Gt,  // >
    Gte, // >=
    Lt,  // <
    Lte, // <=
    And,
    Or,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::And => "and",
            Operator::Or => "or",
        }
    }

    /// 按名称查找比较运算符，用于 `key:op:value` 形式
    pub fn comparison_from_name(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Operator::Eq),
            "neq" => Some(Operator::Neq),
            "gt" => Some(Operator::Gt),
            "gte" => Some(Operator::Gte),
            "lt" => Some(Operator::Lt),
            "lte" => Some(Operator::Lte),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 根键：查询的顶层属性，不进入过滤树
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RootKey {
    Type,
    Status,
    SortBy,
    SortOrder,
    PolicyId,
}

impl RootKey {
    /// 规范化输出时的固定顺序
    pub const ALL: [RootKey; 5] = [
        RootKey::Type,
        RootKey::Status,
        RootKey::SortBy,
        RootKey::SortOrder,
        RootKey::PolicyId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RootKey::Type => "type",
            RootKey::Status => "status",
            RootKey::SortBy => "sortBy",
            RootKey::SortOrder => "sortOrder",
            RootKey::PolicyId => "policyID",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

/// 每个根键对应的可选值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RootFields {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "sortBy", skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder", skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
    #[serde(rename = "policyID", skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
}

impl RootFields {
    /// 语法在未给出根键时填入的默认值
    pub fn with_defaults() -> Self {
        Self {
            data_type: Some("expense".to_string()),
            status: Some("all".to_string()),
            sort_by: Some("date".to_string()),
            sort_order: Some("desc".to_string()),
            policy_id: None,
        }
    }

    pub fn get(&self, key: RootKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    pub fn set(&mut self, key: RootKey, value: impl Into<String>) {
        *self.slot_mut(key) = Some(value.into());
    }

    fn slot(&self, key: RootKey) -> &Option<String> {
        match key {
            RootKey::Type => &self.data_type,
            RootKey::Status => &self.status,
            RootKey::SortBy => &self.sort_by,
            RootKey::SortOrder => &self.sort_order,
            RootKey::PolicyId => &self.policy_id,
        }
    }

    fn slot_mut(&mut self, key: RootKey) -> &mut Option<String> {
        match key {
            RootKey::Type => &mut self.data_type,
            RootKey::Status => &mut self.status,
            RootKey::SortBy => &mut self.sort_by,
            RootKey::SortOrder => &mut self.sort_order,
            RootKey::PolicyId => &mut self.policy_id,
        }
    }
}

/// 语法分析的直接产物：根键加可选的过滤树
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedQuery {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<AstNode>,
}

/// 附带原始文本和哈希的结构化查询
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub input_query: String,
    pub hash: u32,
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<AstNode>,
}

impl SearchQuery {
    pub fn from_parsed(parsed: ParsedQuery, input_query: &str, hash: u32) -> Self {
        Self {
            input_query: input_query.to_string(),
            hash,
            root: parsed.root,
            filters: parsed.filters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_key_round_trip_names() {
        for key in RootKey::ALL {
            assert_eq!(RootKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(RootKey::from_name("category"), None);
    }

    #[test]
    fn test_root_fields_get_set() {
        let mut root = RootFields::default();
        assert_eq!(root.get(RootKey::PolicyId), None);
        root.set(RootKey::PolicyId, "ABC123");
        assert_eq!(root.get(RootKey::PolicyId), Some("ABC123"));
        assert_eq!(RootFields::with_defaults().get(RootKey::SortOrder), Some("desc"));
    }

    #[test]
    fn test_search_query_serializes_flat() {
        let query = SearchQuery {
            input_query: "type:expense".to_string(),
            hash: 7,
            root: RootFields::with_defaults(),
            filters: Some(AstNode::comparison(Operator::Gt, "amount", Value::Number(100))),
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["inputQuery"], "type:expense");
        assert_eq!(json["sortBy"], "date");
        assert_eq!(json["filters"]["operator"], "gt");
        assert_eq!(json["filters"]["left"], "amount");
        assert_eq!(json["filters"]["right"], 100);
        assert!(json.get("policyID").is_none());
    }
}
