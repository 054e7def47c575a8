use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use augur_core::{FactContext, RuleCode, RuleRecord, RuleType, normalize_rule_types};
use serde::Serialize;
use tracing::{debug, warn};

use super::eval::evaluate;
use crate::error::RuleError;
use crate::ir::rule::CompiledRule;

/// A stored rule that could not be compiled and was left out of the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedRule {
    pub id: i64,
    pub code: String,
    pub reason: String,
}

/// One immutable generation of compiled rules.
///
/// Built from the enabled rows of a single store read and never mutated
/// afterwards; a newer version replaces the whole index.
#[derive(Debug, Default)]
pub struct RuleIndex {
    version: u64,
    rules: Vec<Arc<CompiledRule>>,
    by_type: BTreeMap<RuleType, Vec<Arc<CompiledRule>>>,
    by_code: HashMap<RuleCode, Arc<CompiledRule>>,
    malformed: Vec<MalformedRule>,
}

impl RuleIndex {
    /// An index with no rules, tagged with `version`.
    #[must_use]
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Compile `records` into an index.
    ///
    /// Disabled rows are skipped. Rows whose condition or content fails to
    /// compile, and rows reusing the code of a lower-id row, are recorded in
    /// [`malformed`](Self::malformed) and logged; the rest of the batch is
    /// still indexed.
    #[must_use]
    pub fn build(version: u64, mut records: Vec<RuleRecord>) -> Self {
        records.sort_by_key(|r| r.id);

        let mut index = Self::empty(version);
        let mut seen_codes: HashSet<RuleCode> = HashSet::new();

        for record in records.into_iter().filter(|r| r.enabled) {
            let id = record.id;
            let code = record.code.clone();

            let compiled = if seen_codes.contains(&code) {
                Err(RuleError::DuplicateCode(code.to_string()))
            } else {
                CompiledRule::compile(record)
            };

            match compiled {
                Ok(rule) => {
                    seen_codes.insert(code.clone());
                    let rule = Arc::new(rule);
                    index
                        .by_type
                        .entry(rule.rule_type().clone())
                        .or_default()
                        .push(Arc::clone(&rule));
                    index.by_code.insert(code, Arc::clone(&rule));
                    index.rules.push(rule);
                }
                Err(e) => {
                    warn!(rule_id = id, code = %code, error = %e, "excluding malformed rule");
                    index.malformed.push(MalformedRule {
                        id,
                        code: code.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            version,
            rules = index.rules.len(),
            malformed = index.malformed.len(),
            "built rule index"
        );
        index
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of indexed (enabled, well-formed) rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All indexed rules in id order.
    #[must_use]
    pub fn rules(&self) -> &[Arc<CompiledRule>] {
        &self.rules
    }

    #[must_use]
    pub fn malformed(&self) -> &[MalformedRule] {
        &self.malformed
    }

    #[must_use]
    pub fn rule_by_code(&self, code: &str) -> Option<&Arc<CompiledRule>> {
        self.by_code.get(&RuleCode::new(code))
    }

    /// Distinct rule types present in the index.
    pub fn rule_types(&self) -> impl Iterator<Item = &RuleType> {
        self.by_type.keys()
    }

    /// Rules of the requested types; `None` or an empty filter means all types.
    #[must_use]
    pub fn candidates(&self, rule_types: Option<&[RuleType]>) -> Vec<Arc<CompiledRule>> {
        match normalize_rule_types(rule_types) {
            None => self.rules.clone(),
            Some(types) => types
                .iter()
                .filter_map(|t| self.by_type.get(t))
                .flatten()
                .cloned()
                .collect(),
        }
    }

    /// Candidates whose condition evaluates to `true` for `facts`.
    #[must_use]
    pub fn matching(
        &self,
        rule_types: Option<&[RuleType]>,
        facts: &FactContext,
    ) -> Vec<Arc<CompiledRule>> {
        self.candidates(rule_types)
            .into_iter()
            .filter(|rule| {
                let hit = evaluate(&rule.condition, facts);
                if hit {
                    debug!(code = %rule.code(), "rule matched");
                }
                hit
            })
            .collect()
    }
}
