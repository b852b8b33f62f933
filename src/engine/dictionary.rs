//! @dose
//! purpose: Builds the token dictionary for one build from an ordered file list. Walks each
//!     DTCG-style JSON tree, turns `$value` nodes into Tokens, and indexes them by path and
//!     by canonical name.
//!
//! when-editing:
//!     - !Group `$type` is inherited by every descendant that does not set its own
//!     - !Redefining a path in a later file overrides in place and records a warning
//!     - Reference checks only follow references; they never compute final values
//!
//! invariants:
//!     - Tokens keep first-insertion order across all files
//!     - Canonical names are unique within one dictionary
//!
//! gotchas:
//!     - A non-object child of a group is malformed input, not an empty group

use super::EngineError;
use crate::reference::references_in;
use crate::types::{Token, TokenPath};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default)]
pub struct Dictionary {
    tokens: Vec<Token>,
    /// dotted path -> index into tokens
    by_path: HashMap<String, usize>,
    /// canonical name -> index into tokens
    by_name: HashMap<String, usize>,
    warnings: Vec<String>,
    /// paths whose whole reference subtree already checked out
    verified: RefCell<HashSet<String>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and merge every file in order
    pub fn load(files: &[PathBuf]) -> Result<Self, EngineError> {
        let mut dictionary = Self::new();
        for file in files {
            let content = fs::read_to_string(file).map_err(|source| EngineError::Read {
                path: file.clone(),
                source,
            })?;
            dictionary.add_source(file, &content)?;
        }
        Ok(dictionary)
    }

    /// Merge one file's JSON content
    pub fn add_source(&mut self, file: &Path, content: &str) -> Result<(), EngineError> {
        let root: Value = serde_json::from_str(content).map_err(|e| EngineError::Parse {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;

        let Value::Object(map) = root else {
            return Err(EngineError::Parse {
                path: file.to_path_buf(),
                message: "top level must be an object".to_string(),
            });
        };

        let inherited = map.get("$type").and_then(Value::as_str).map(str::to_string);
        self.walk_group(&map, &TokenPath::new(Vec::new()), inherited.as_deref(), file)
    }

    fn walk_group(
        &mut self,
        group: &Map<String, Value>,
        path: &TokenPath,
        inherited_type: Option<&str>,
        file: &Path,
    ) -> Result<(), EngineError> {
        for (key, child) in group {
            if key.starts_with('$') {
                continue;
            }

            let child_path = path.child(key);
            let Value::Object(node) = child else {
                return Err(EngineError::Parse {
                    path: file.to_path_buf(),
                    message: format!("{} is neither a token nor a group", child_path),
                });
            };

            let node_type = node
                .get("$type")
                .and_then(Value::as_str)
                .or(inherited_type);

            if let Some(value) = node.get("$value") {
                self.insert(Token {
                    path: child_path,
                    token_type: node_type.map(str::to_string),
                    value: value.clone(),
                    description: node
                        .get("$description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    file: file.to_path_buf(),
                })?;
            } else {
                self.walk_group(node, &child_path, node_type, file)?;
            }
        }
        Ok(())
    }

    /// Add a token, overriding an earlier definition of the same path
    pub fn insert(&mut self, token: Token) -> Result<(), EngineError> {
        self.verified.get_mut().clear();
        let key = token.path.to_string();
        let name = token.name();

        if let Some(&index) = self.by_path.get(&key) {
            let previous = &self.tokens[index];
            let message = format!(
                "Token collision: {} from {} overrides the definition in {}",
                key,
                token.file.display(),
                previous.file.display()
            );
            warn!("{}", message);
            self.warnings.push(message);
            self.tokens[index] = token;
            return Ok(());
        }

        if let Some(&index) = self.by_name.get(&name) {
            return Err(EngineError::NameCollision {
                name,
                first: self.tokens[index].path.to_string(),
                second: key,
            });
        }

        let index = self.tokens.len();
        self.by_path.insert(key, index);
        self.by_name.insert(name, index);
        self.tokens.push(token);
        Ok(())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, path: &TokenPath) -> Option<&Token> {
        self.lookup(&path.to_string())
    }

    /// Look a token up by its dotted path
    pub fn lookup(&self, dotted: &str) -> Option<&Token> {
        self.by_path.get(dotted).map(|&i| &self.tokens[i])
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Verify every reference reachable from `token` exists and no chain loops back.
    /// Subtrees that already passed are not walked again.
    pub fn check_references(&self, token: &Token) -> Result<(), EngineError> {
        let mut stack = vec![token.path.to_string()];
        self.check_value(&token.value, &mut stack)
    }

    fn check_value(&self, value: &Value, stack: &mut Vec<String>) -> Result<(), EngineError> {
        for reference in references_in(value) {
            let key = TokenPath::parse(&reference).to_string();

            if let Some(start) = stack.iter().position(|p| p == &key) {
                let mut chain = stack[start..].to_vec();
                chain.push(key);
                return Err(EngineError::CircularReference { chain });
            }

            let Some(target) = self.lookup(&key) else {
                return Err(EngineError::BrokenReference {
                    token: stack[0].clone(),
                    reference,
                });
            };

            if self.verified.borrow().contains(&key) {
                continue;
            }

            stack.push(key);
            self.check_value(&target.value, stack)?;
            if let Some(done) = stack.pop() {
                self.verified.borrow_mut().insert(done);
            }
        }
        Ok(())
    }
}
