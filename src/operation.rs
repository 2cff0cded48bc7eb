//! Operation definitions
//!
//! A GraphQL operation as the interceptor and the store see it: kind, variables, and
//! the selection tree used to normalize responses into records and to read them back.
//! Document parsing and validation happen elsewhere; this is the compiled shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Key of the root record that the operation's top-level fields live on
    pub fn root_key(&self) -> &'static str {
        match self {
            OperationKind::Query => "QUERY_ROOT",
            OperationKind::Mutation => "MUTATION_ROOT",
            OperationKind::Subscription => "SUBSCRIPTION_ROOT",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
            OperationKind::Subscription => write!(f, "subscription"),
        }
    }
}

/// A selected field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Schema field name
    pub name: String,
    /// Response key, if aliased
    #[serde(default)]
    pub alias: Option<String>,
    /// Arguments with variables already resolved
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Custom scalar type name, used to look up a scalar adapter
    #[serde(default)]
    pub scalar: Option<String>,
    /// Sub-selections; empty for leaf fields
    #[serde(default)]
    pub selections: Vec<Field>,
}

impl Field {
    /// Leaf field with no arguments
    pub fn scalar(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            alias: None,
            arguments: Map::new(),
            scalar: None,
            selections: Vec::new(),
        }
    }

    /// Object field with sub-selections
    pub fn object(name: impl Into<String>, selections: Vec<Field>) -> Self {
        Field {
            selections,
            ..Field::scalar(name)
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_custom_scalar(mut self, scalar: impl Into<String>) -> Self {
        self.scalar = Some(scalar.into());
        self
    }

    /// Key under which the field appears in response data
    pub fn response_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Key under which the field is stored on a record.
    ///
    /// Arguments are part of the key so `hero(id: "1")` and `hero(id: "2")` do not
    /// overwrite each other. Arguments are sorted by name so the key is stable.
    pub fn cache_key(&self) -> String {
        if self.arguments.is_empty() {
            return self.name.clone();
        }
        let sorted: BTreeMap<&String, &Value> = self.arguments.iter().collect();
        let arguments = serde_json::to_string(&sorted).unwrap_or_default();
        format!("{}({})", self.name, arguments)
    }

    pub fn is_leaf(&self) -> bool {
        self.selections.is_empty()
    }
}

/// A compiled GraphQL operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub kind: OperationKind,
    /// Source document, forwarded to the transport untouched
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
    pub selections: Vec<Field>,
}

impl Operation {
    pub fn new(name: impl Into<String>, kind: OperationKind, selections: Vec<Field>) -> Self {
        Operation {
            name: name.into(),
            kind,
            document: String::new(),
            variables: Map::new(),
            selections,
        }
    }

    pub fn query(name: impl Into<String>, selections: Vec<Field>) -> Self {
        Self::new(name, OperationKind::Query, selections)
    }

    pub fn mutation(name: impl Into<String>, selections: Vec<Field>) -> Self {
        Self::new(name, OperationKind::Mutation, selections)
    }

    pub fn subscription(name: impl Into<String>, selections: Vec<Field>) -> Self {
        Self::new(name, OperationKind::Subscription, selections)
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn root_key(&self) -> &'static str {
        self.kind.root_key()
    }
}

/// Error entry of a GraphQL response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphqlError {
            message: message.into(),
            path: Vec::new(),
            extensions: None,
        }
    }
}
