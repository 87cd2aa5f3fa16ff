//! Summary statistics over history slices.

use std::collections::BTreeMap;

use serde::Serialize;

/// Arithmetic mean; `None` for an empty slice.
#[inline]
pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

/// Mean with 0 for an empty slice, the convention used by exported summaries.
#[inline]
pub fn mean_or_zero(xs: &[f64]) -> f64 {
    mean(xs).unwrap_or(0.0)
}

/// Mean of `f(x)` over an iterator, 0 when empty.
pub fn mean_by<T>(items: impl IntoIterator<Item = T>, f: impl Fn(T) -> f64) -> f64 {
    let (sum, n) = items.into_iter().fold((0.0, 0usize), |(s, n), x| (s + f(x), n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Fraction of items satisfying `pred`, 0 when empty.
pub fn rate_by<T>(items: impl IntoIterator<Item = T>, pred: impl Fn(&T) -> bool) -> f64 {
    let (hits, n) = items
        .into_iter()
        .fold((0usize, 0usize), |(h, n), x| (h + usize::from(pred(&x)), n + 1));
    if n == 0 { 0.0 } else { hits as f64 / n as f64 }
}

/// Count / sum / mean of one group in a categorical breakdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
}

/// Group `(key, value)` pairs and report count/total/mean per key, ordered by key.
pub fn breakdown<K: Ord>(pairs: impl IntoIterator<Item = (K, f64)>) -> BTreeMap<K, Group> {
    let mut out: BTreeMap<K, Group> = BTreeMap::new();
    for (k, v) in pairs {
        let g = out.entry(k).or_default();
        g.count += 1;
        g.total += v;
    }
    for g in out.values_mut() {
        g.mean = g.total / g.count as f64;
    }
    out
}

/// Distinct choices in the last `window` picks divided by the number of
/// options; 1 until at least `min_history` picks exist.
pub fn exploration_rate(picks: &[usize], options: usize, window: usize, min_history: usize) -> f64 {
    if picks.len() < min_history || options == 0 {
        return 1.0;
    }
    let start = picks.len().saturating_sub(window);
    let mut seen = vec![false; options];
    for &p in &picks[start..] {
        if let Some(s) = seen.get_mut(p) {
            *s = true;
        }
    }
    seen.iter().filter(|s| **s).count() as f64 / options as f64
}

/// Share of the last `window` picks taken by the most frequent option,
/// in percent; 0 until at least `min_history` picks exist.
pub fn consistency(picks: &[usize], window: usize, min_history: usize) -> f64 {
    if picks.len() < min_history || picks.is_empty() {
        return 0.0;
    }
    let recent = &picks[picks.len().saturating_sub(window)..];
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &p in recent {
        *counts.entry(p).or_default() += 1;
    }
    let top = counts.values().copied().max().unwrap_or(0);
    (top as f64 / recent.len() as f64 * 100.0).round()
}

/// Percent improvement of the second half's mean over the first half's,
/// floored at 0; 0 for fewer than `min_len` rewards or a zero first half.
pub fn learning_gain(rewards: &[f64], min_len: usize) -> f64 {
    if rewards.len() < min_len || rewards.len() < 2 {
        return 0.0;
    }
    let (first, second) = rewards.split_at(rewards.len() / 2);
    let a = mean_or_zero(first);
    if a == 0.0 {
        return 0.0;
    }
    (((mean_or_zero(second) - a) / a) * 100.0).round().max(0.0)
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
