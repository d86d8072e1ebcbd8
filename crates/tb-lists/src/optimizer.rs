use std::collections::HashSet;

/// Drop repeated rules, keeping first occurrence order. Returns how many
/// were removed.
pub fn dedupe_rules(rules: &mut Vec<String>) -> usize {
    let before = rules.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(rules.len());
    rules.retain(|rule| seen.insert(rule.clone()));
    before - rules.len()
}

/// Combine several parsed lists into one rule set, removing rules repeated
/// across lists.
pub fn merge_rule_sets<I>(lists: I) -> (Vec<String>, usize)
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut merged: Vec<String> = lists.into_iter().flatten().collect();
    let deduped = dedupe_rules(&mut merged);
    (merged, deduped)
}
