//! Building blocks for flow functions.
//!
//! Flow functions map one incoming fact to the facts holding afterwards
//! (`D → 2^D`). These helpers cover the shapes most problems are made of.

/// `f(d) = {d}`
pub fn identity<D: Clone>(source: &D) -> Vec<D> {
    vec![source.clone()]
}

/// `f(d) = ∅`
pub fn kill_all<D>() -> Vec<D> {
    vec![]
}

/// Keeps `source` and, if it equals `trigger`, adds `generated`.
pub fn generate<D, I>(source: &D, trigger: &D, generated: I) -> Vec<D>
where
    D: Clone + PartialEq,
    I: IntoIterator<Item = D>,
{
    let mut facts = vec![source.clone()];
    if source == trigger {
        facts.extend(generated.into_iter().filter(|fact| fact != source));
    }
    facts
}

/// Drops `source` if it is one of `killed`, keeps it otherwise.
pub fn kill<D: Clone + PartialEq>(source: &D, killed: &[D]) -> Vec<D> {
    if killed.contains(source) {
        vec![]
    } else {
        vec![source.clone()]
    }
}

/// Maps `source` to every `to` paired with it in `mapping`; facts without a
/// pair do not flow. Used for parameter and result binding.
pub fn transfer<D: Clone + PartialEq>(source: &D, mapping: &[(D, D)]) -> Vec<D> {
    mapping
        .iter()
        .filter(|(from, _)| from == source)
        .map(|(_, to)| to.clone())
        .collect()
}

/// Attaches the same edge function to every fact.
pub fn with_weight<D, W: Clone>(facts: Vec<D>, weight: W) -> Vec<(D, W)> {
    facts.into_iter().map(|fact| (fact, weight.clone())).collect()
}
