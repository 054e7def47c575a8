//! Selection and ranking of matched rules.
//!
//! Candidates are ordered by `(priority desc, confidence_prior desc, code asc)`
//! and walked greedily: a candidate is dropped when its mutual-exclusion group
//! is already occupied, then when it contradicts (or is contradicted by) a
//! rule already chosen. Ranked selection re-orders the survivors by a
//! weighted score.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ir::rule::CompiledRule;

/// Weights of the ranked score.
///
/// `score = priority*w1 + confidence_prior*w2 + history_score*w3 + biz_impact_weight*w4`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub priority: f64,
    pub confidence: f64,
    pub history: f64,
    pub biz_impact: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            priority: 1.0,
            confidence: 10.0,
            history: 5.0,
            biz_impact: 5.0,
        }
    }
}

/// Options for a single selection pass.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// Re-order survivors by weighted score.
    pub ranked: bool,
    /// Audience segment whose multiplier applies to the score.
    pub segment: Option<String>,
    pub weights: RankingWeights,
}

impl SelectOptions {
    /// Plain priority ordering.
    #[must_use]
    pub fn filtered() -> Self {
        Self::default()
    }

    /// Weighted ordering with the given weights.
    #[must_use]
    pub fn ranked(weights: RankingWeights) -> Self {
        Self {
            ranked: true,
            segment: None,
            weights,
        }
    }

    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }
}

/// A rule that survived selection.
#[derive(Debug, Clone)]
pub struct Selected {
    pub rule: Arc<CompiledRule>,
    /// Weighted score; `None` for plain selection.
    pub score: Option<f64>,
}

/// Compute the weighted score of a rule.
#[must_use]
pub fn score(rule: &CompiledRule, weights: &RankingWeights, segment: Option<&str>) -> f64 {
    let r = &rule.record;
    let base = f64::from(r.priority) * weights.priority
        + r.confidence_prior * weights.confidence
        + r.history_score * weights.history
        + r.biz_impact_weight * weights.biz_impact;
    let multiplier = segment
        .and_then(|s| r.segment_weights.get(s).copied())
        .unwrap_or(1.0);
    base * multiplier
}

fn base_order(a: &CompiledRule, b: &CompiledRule) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| b.confidence_prior().total_cmp(&a.confidence_prior()))
        .then_with(|| a.code().cmp(b.code()))
}

/// Select the applicable subset of `candidates`.
///
/// The input slice is not modified. Output order is deterministic for a given
/// input set regardless of the input order.
#[must_use]
pub fn select(candidates: &[Arc<CompiledRule>], options: &SelectOptions) -> Vec<Selected> {
    let mut ordered: Vec<&Arc<CompiledRule>> = candidates.iter().collect();
    ordered.sort_by(|a, b| base_order(a, b));

    let mut groups: HashSet<&str> = HashSet::new();
    // Ids of chosen rules, and ids that some chosen rule contradicts.
    let mut chosen_ids: HashSet<i64> = HashSet::new();
    let mut excluded: HashSet<i64> = HashSet::new();
    let mut chosen: Vec<&Arc<CompiledRule>> = Vec::with_capacity(ordered.len());

    for rule in ordered {
        if let Some(group) = rule.exclusive_group()
            && groups.contains(group)
        {
            tracing::debug!(code = %rule.code(), group, "dropped by mutual exclusion");
            continue;
        }
        if excluded.contains(&rule.id())
            || rule
                .contradicted_ids()
                .iter()
                .any(|id| chosen_ids.contains(id))
        {
            tracing::debug!(code = %rule.code(), "dropped by contradiction");
            continue;
        }
        if let Some(group) = rule.exclusive_group() {
            groups.insert(group);
        }
        chosen_ids.insert(rule.id());
        excluded.extend(rule.contradicted_ids().iter().copied());
        chosen.push(rule);
    }

    if !options.ranked {
        return chosen
            .into_iter()
            .map(|rule| Selected {
                rule: Arc::clone(rule),
                score: None,
            })
            .collect();
    }

    let segment = options.segment.as_deref();
    let mut scored: Vec<Selected> = chosen
        .into_iter()
        .map(|rule| Selected {
            score: Some(score(rule, &options.weights, segment)),
            rule: Arc::clone(rule),
        })
        .collect();
    scored.sort_by(|a, b| {
        let (sa, sb) = (a.score.unwrap_or(0.0), b.score.unwrap_or(0.0));
        sb.total_cmp(&sa)
            .then_with(|| a.rule.code().cmp(b.rule.code()))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_core::RuleRecord;
    use serde_json::json;

    fn rule(id: i64, code: &str, priority: i32) -> RuleRecord {
        RuleRecord::new(id, code, "career", json!({}), json!({"text": code}))
            .with_priority(priority)
    }

    fn compile(records: Vec<RuleRecord>) -> Vec<Arc<CompiledRule>> {
        records
            .into_iter()
            .map(|r| Arc::new(CompiledRule::compile(r).unwrap()))
            .collect()
    }

    fn codes(selected: &[Selected]) -> Vec<String> {
        selected.iter().map(|s| s.rule.code().to_string()).collect()
    }

    #[test]
    fn orders_by_priority_then_code() {
        let rules = compile(vec![rule(1, "B", 10), rule(2, "A", 10), rule(3, "C", 50)]);
        let out = select(&rules, &SelectOptions::filtered());
        assert_eq!(codes(&out), ["C", "A", "B"]);
        assert!(out.iter().all(|s| s.score.is_none()));
    }

    #[test]
    fn confidence_breaks_priority_ties_before_code() {
        let rules = compile(vec![
            rule(1, "A", 10).with_confidence_prior(0.2),
            rule(2, "B", 10).with_confidence_prior(0.9),
        ]);
        assert_eq!(codes(&select(&rules, &SelectOptions::filtered())), ["B", "A"]);
    }

    #[test]
    fn mutual_exclusion_keeps_highest_priority() {
        let rules = compile(vec![
            rule(1, "LOW", 1).with_exclusive_group("G"),
            rule(2, "HIGH", 100).with_exclusive_group("G"),
            rule(3, "OTHER", 50),
        ]);
        assert_eq!(
            codes(&select(&rules, &SelectOptions::filtered())),
            ["HIGH", "OTHER"]
        );
    }

    #[test]
    fn contradiction_is_symmetric() {
        let forward = compile(vec![rule(1, "X", 10).with_contradicts(vec![2]), rule(2, "Y", 5)]);
        assert_eq!(codes(&select(&forward, &SelectOptions::filtered())), ["X"]);

        let backward = compile(vec![rule(1, "X", 10), rule(2, "Y", 5).with_contradicts(vec![1])]);
        assert_eq!(codes(&select(&backward, &SelectOptions::filtered())), ["X"]);
    }

    #[test]
    fn contradiction_chains_only_block_chosen_rules() {
        // A drops B; B is never chosen, so its contradiction of C is void.
        let rules = compile(vec![
            rule(1, "A", 30).with_contradicts(vec![2]),
            rule(2, "B", 20).with_contradicts(vec![3]),
            rule(3, "C", 10),
            rule(4, "D", 5).with_contradicts(vec![1, 9]),
        ]);
        assert_eq!(codes(&select(&rules, &SelectOptions::filtered())), ["A", "C"]);
    }

    #[test]
    fn large_contradiction_fan_out() {
        let odd: Vec<i64> = (1..500).step_by(2).collect();
        let mut records = vec![rule(0, "ROOT", 1_000).with_contradicts(odd)];
        records.extend((1..500).map(|i| rule(i, &format!("R{i:03}"), 1)));
        let out = select(&compile(records), &SelectOptions::filtered());
        assert_eq!(out.len(), 1 + 249);
        assert!(out.iter().skip(1).all(|s| s.rule.id() % 2 == 0));
    }

    #[test]
    fn exclusion_is_resolved_before_contradiction() {
        // B loses its group to A, so its contradiction of C never applies.
        let rules = compile(vec![
            rule(1, "A", 100).with_exclusive_group("G"),
            rule(2, "B", 90).with_exclusive_group("G").with_contradicts(vec![3]),
            rule(3, "C", 10),
        ]);
        assert_eq!(codes(&select(&rules, &SelectOptions::filtered())), ["A", "C"]);
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = compile(vec![rule(1, "A", 1), rule(2, "B", 2), rule(3, "C", 2)]);
        let mut b = a.clone();
        b.reverse();
        let opts = SelectOptions::filtered();
        assert_eq!(codes(&select(&a, &opts)), codes(&select(&b, &opts)));
    }

    #[test]
    fn ranked_reorders_by_score() {
        let rules = compile(vec![
            rule(1, "PRIO", 10).with_history_score(0.0),
            rule(2, "HIST", 5).with_history_score(3.0),
        ]);
        let out = select(&rules, &SelectOptions::ranked(RankingWeights::default()));
        // PRIO: 10 + 5 + 0 + 5 = 20, HIST: 5 + 5 + 15 + 5 = 30
        assert_eq!(codes(&out), ["HIST", "PRIO"]);
        assert_eq!(out[0].score, Some(30.0));
    }

    #[test]
    fn segment_weight_multiplies_score() {
        let rules = compile(vec![
            rule(1, "A", 10),
            rule(2, "B", 10).with_segment_weight("vip", 2.0),
        ]);
        let opts = SelectOptions::ranked(RankingWeights::default()).with_segment("vip");
        let out = select(&rules, &opts);
        assert_eq!(codes(&out), ["B", "A"]);
        assert_eq!(out[0].score, Some(40.0));
        assert_eq!(out[1].score, Some(20.0));
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert!(select(&[], &SelectOptions::filtered()).is_empty());
    }
}
