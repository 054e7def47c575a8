use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use augur_core::{FactContext, RuleRecord, RuleType};
use augur_rules::{
    CompiledRule, Condition, RankingWeights, RuleIndex, SelectOptions, evaluate, select,
};

const PILLARS: [&str; 6] = ["甲子", "乙丑", "丙寅", "丁卯", "戊辰", "己巳"];

fn facts() -> FactContext {
    FactContext::new()
        .with("day_pillar", "甲子")
        .with("day_branch", "子")
        .with("gender", "male")
        .with("score", 87)
}

fn complex_condition() -> Condition {
    Condition::compile(&json!({
        "all": [
            {"gender": ["male", "男"]},
            {"any": [
                {"day_pillar": "乙丑"},
                {"day_branch": ["子", "午", "卯", "酉"]}
            ]},
            {"score": "*"}
        ]
    }))
    .expect("valid condition")
}

fn records(n: usize) -> Vec<RuleRecord> {
    (0..n)
        .map(|i| {
            let id = i64::try_from(i).expect("small index");
            let pillar = PILLARS[i % PILLARS.len()];
            let mut rule = RuleRecord::new(
                id,
                format!("RULE_{i:04}"),
                if i % 2 == 0 { "career" } else { "marriage" },
                json!({"all": [{"day_pillar": pillar}, {"gender": "*"}]}),
                json!({"text": pillar}),
            )
            .with_priority(i32::try_from(i % 17).expect("small priority"));
            if i % 5 == 0 {
                rule = rule.with_exclusive_group(format!("G{}", i % 3));
            }
            rule
        })
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let facts = facts();
    let simple = Condition::compile(&json!({"day_pillar": "甲子"})).expect("valid condition");
    let complex = complex_condition();

    c.bench_function("evaluate_simple", |b| {
        b.iter(|| black_box(evaluate(black_box(&simple), &facts)));
    });
    c.bench_function("evaluate_complex", |b| {
        b.iter(|| black_box(evaluate(black_box(&complex), &facts)));
    });
}

fn bench_index_matching(c: &mut Criterion) {
    let index = RuleIndex::build(1, records(1_000));
    let facts = facts();
    let types = [RuleType::new("career")];

    c.bench_function("index_matching_1000_rules", |b| {
        b.iter(|| black_box(index.matching(Some(&types), black_box(&facts))));
    });
}

fn bench_select(c: &mut Criterion) {
    let candidates: Vec<Arc<CompiledRule>> = records(200)
        .into_iter()
        .map(|r| Arc::new(CompiledRule::compile(r).expect("valid rule")))
        .collect();
    let filtered = SelectOptions::filtered();
    let ranked = SelectOptions::ranked(RankingWeights::default());

    c.bench_function("select_200_filtered", |b| {
        b.iter(|| black_box(select(black_box(&candidates), &filtered)));
    });
    c.bench_function("select_200_ranked", |b| {
        b.iter(|| black_box(select(black_box(&candidates), &ranked)));
    });
}

criterion_group!(benches, bench_evaluate, bench_index_matching, bench_select);
criterion_main!(benches);
