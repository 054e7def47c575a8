use augur_core::{RuleCode, RuleRecord, RuleType};

use super::condition::Condition;
use super::content::RuleContent;
use crate::error::RuleError;

/// A rule whose condition tree and content have been compiled.
///
/// The original record is kept alongside so that ranking attributes and
/// display fields can be read without duplicating them.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub record: RuleRecord,
    pub condition: Condition,
    pub content: RuleContent,
}

impl CompiledRule {
    /// Compile a stored rule.
    pub fn compile(record: RuleRecord) -> Result<Self, RuleError> {
        let condition = Condition::compile(&record.conditions)?;
        let content = RuleContent::compile(&record.content)?;
        Ok(Self {
            record,
            condition,
            content,
        })
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.record.id
    }

    #[must_use]
    pub fn code(&self) -> &RuleCode {
        &self.record.code
    }

    #[must_use]
    pub fn rule_type(&self) -> &RuleType {
        &self.record.rule_type
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.record.priority
    }

    #[must_use]
    pub fn confidence_prior(&self) -> f64 {
        self.record.confidence_prior
    }

    #[must_use]
    pub fn exclusive_group(&self) -> Option<&str> {
        self.record.mutually_exclusive_group.as_deref()
    }

    /// Ids this rule must not co-occur with.
    #[must_use]
    pub fn contradicted_ids(&self) -> &[i64] {
        &self.record.contradicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compile_keeps_record() {
        let record = RuleRecord::new(
            9,
            "DYNAMIC_RIZHU_GENDER",
            "marriage_day_pillar",
            json!({"all": [{"day_pillar": "*"}, {"gender": "*"}]}),
            json!({"type": "dynamic", "query_adapter": "rizhu_gender", "method": "analyze"}),
        )
        .with_contradicts(vec![3]);
        let rule = CompiledRule::compile(record).unwrap();
        assert_eq!(rule.id(), 9);
        assert_eq!(rule.code().as_str(), "DYNAMIC_RIZHU_GENDER");
        assert!(rule.content.is_dynamic());
        assert!(rule.contradicted_ids().contains(&3));
        assert!(!rule.contradicted_ids().contains(&4));
    }

    #[test]
    fn compile_fails_on_bad_condition() {
        let record = RuleRecord::new(1, "BAD", "career", json!({"any": 3}), json!(null));
        assert!(CompiledRule::compile(record).is_err());
    }
}
