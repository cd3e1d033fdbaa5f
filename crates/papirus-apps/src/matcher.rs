//! Candidate matching against the target theme's icon index.
//!
//! Tiers are tried in order and the first tier that yields anything wins:
//!
//! 1. exact name (verbatim, lower-cased, or separator-free form present as-is)
//! 2. equal after normalization (separators removed, lower-cased)
//! 3. one normalized name contained in the other
//! 4. Jaccard similarity of name tokens
//! 5. generic icon for the application's kind
//!
//! Within a tier candidates are ranked by score, then by shorter name, then
//! lexically, so the result is fully deterministic.

use crate::categories::{CategoryMap, LauncherHints};
use crate::config::MatcherConfig;
use crate::icons::IconIndex;
use crate::reference::IconReference;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

const SEPARATORS: [char; 4] = ['-', '_', '.', ' '];

/// Lower-case and drop separators: "Org.Gnome_Text-Editor" -> "orggnometexteditor".
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split on separators, case changes and letter/digit boundaries.
///
/// "org.gnome.TextEditor" -> {org, gnome, text, editor};
/// "HTTPServer2" -> {http, server, 2}.
pub fn tokenize(name: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();

    for chunk in name.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;

        for i in 1..chars.len() {
            let (prev, cur) = (chars[i - 1], chars[i]);
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            let boundary = (prev.is_lowercase() && cur.is_uppercase())
                || (prev.is_uppercase() && cur.is_uppercase() && next_is_lower)
                || (prev.is_alphabetic() && cur.is_numeric())
                || (prev.is_numeric() && cur.is_alphabetic());

            if boundary {
                push_token(&mut tokens, &chars[start..i]);
                start = i;
            }
        }
        push_token(&mut tokens, &chars[start..]);
    }

    tokens
}

fn push_token(tokens: &mut BTreeSet<String>, chars: &[char]) {
    if !chars.is_empty() {
        tokens.insert(chars.iter().flat_map(|c| c.to_lowercase()).collect());
    }
}

/// Which matching stage produced a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Normalized,
    Containment,
    TokenOverlap,
    Category,
}

impl MatchTier {
    pub fn number(&self) -> u8 {
        match self {
            MatchTier::Exact => 1,
            MatchTier::Normalized => 2,
            MatchTier::Containment => 3,
            MatchTier::TokenOverlap => 4,
            MatchTier::Category => 5,
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchTier::Exact => "exact",
            MatchTier::Normalized => "normalized",
            MatchTier::Containment => "containment",
            MatchTier::TokenOverlap => "token overlap",
            MatchTier::Category => "category",
        };
        write!(f, "{label}")
    }
}

/// A proposed substitute icon.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub name: String,
    pub tier: MatchTier,
    /// Orders candidates within one tier; not comparable across tiers.
    pub score: f64,
}

impl MatchCandidate {
    fn new(name: impl Into<String>, tier: MatchTier, score: f64) -> Self {
        Self {
            name: name.into(),
            tier,
            score,
        }
    }
}

fn rank(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.name.len().cmp(&b.name.len()))
        .then_with(|| a.name.cmp(&b.name))
}

/// Finds target-theme substitutes for icon references.
#[derive(Clone, Debug, Default)]
pub struct CandidateMatcher {
    config: MatcherConfig,
    categories: CategoryMap,
}

impl CandidateMatcher {
    pub fn new(config: MatcherConfig, categories: CategoryMap) -> Self {
        Self { config, categories }
    }

    /// Ranked substitutes from the first tier that matches; empty if none does.
    pub fn suggest(
        &self,
        reference: &IconReference,
        hints: &LauncherHints,
        index: &IconIndex,
    ) -> Vec<MatchCandidate> {
        let tiers: [&dyn Fn() -> Vec<MatchCandidate>; 5] = [
            &|| self.exact(reference, index),
            &|| self.normalized(reference, index),
            &|| self.containment(reference, index),
            &|| self.token_overlap(reference, index),
            &|| self.category(hints, index),
        ];

        for tier in tiers {
            let mut candidates = tier();
            if candidates.is_empty() {
                continue;
            }
            candidates.sort_by(rank);
            candidates.dedup_by(|a, b| a.name == b.name);
            candidates.truncate(self.config.max_candidates.max(1));
            return candidates;
        }

        Vec::new()
    }

    /// Convenience for the best candidate only.
    pub fn best(
        &self,
        reference: &IconReference,
        hints: &LauncherHints,
        index: &IconIndex,
    ) -> Option<MatchCandidate> {
        self.suggest(reference, hints, index).into_iter().next()
    }

    fn exact(&self, reference: &IconReference, index: &IconIndex) -> Vec<MatchCandidate> {
        let Some(name) = reference.lookup_name() else {
            return Vec::new();
        };

        [name.to_string(), name.to_lowercase(), normalize(name)]
            .into_iter()
            .find(|candidate| index.contains(candidate))
            .map(|found| vec![MatchCandidate::new(found, MatchTier::Exact, 1.0)])
            .unwrap_or_default()
    }

    fn normalized(&self, reference: &IconReference, index: &IconIndex) -> Vec<MatchCandidate> {
        let Some(wanted) = reference.lookup_name().map(normalize) else {
            return Vec::new();
        };
        if wanted.is_empty() {
            return Vec::new();
        }

        index
            .entries()
            .filter(|entry| entry.normalized == wanted)
            .map(|entry| MatchCandidate::new(&entry.name, MatchTier::Normalized, 0.9))
            .collect()
    }

    fn containment(&self, reference: &IconReference, index: &IconIndex) -> Vec<MatchCandidate> {
        let Some(wanted) = reference.lookup_name().map(normalize) else {
            return Vec::new();
        };

        index
            .entries()
            .filter_map(|entry| {
                let score = self.containment_score(&wanted, &entry.normalized)?;
                Some(MatchCandidate::new(&entry.name, MatchTier::Containment, score))
            })
            .collect()
    }

    /// Length ratio of the contained string to the containing one, weighted
    /// by where it sits: prefix 1.0, suffix 0.95, elsewhere 0.9.
    fn containment_score(&self, a: &str, b: &str) -> Option<f64> {
        if a == b {
            return None;
        }
        let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
        let short_len = short.chars().count();
        if short_len < self.config.min_substring_len || !long.contains(short) {
            return None;
        }

        let weight = if long.starts_with(short) {
            1.0
        } else if long.ends_with(short) {
            0.95
        } else {
            0.9
        };
        let score = weight * short_len as f64 / long.chars().count() as f64;

        (score >= self.config.min_containment_score).then_some(score)
    }

    fn token_overlap(&self, reference: &IconReference, index: &IconIndex) -> Vec<MatchCandidate> {
        let Some(name) = reference.lookup_name() else {
            return Vec::new();
        };
        let wanted = tokenize(name);
        if wanted.is_empty() {
            return Vec::new();
        }

        index
            .entries()
            .filter_map(|entry| {
                let shared = wanted.intersection(&entry.tokens).count();
                if shared == 0 {
                    return None;
                }
                let union = wanted.union(&entry.tokens).count();
                let score = shared as f64 / union as f64;
                (score >= self.config.min_jaccard)
                    .then(|| MatchCandidate::new(&entry.name, MatchTier::TokenOverlap, score))
            })
            .collect()
    }

    fn category(&self, hints: &LauncherHints, index: &IconIndex) -> Vec<MatchCandidate> {
        self.categories
            .fallback_icon(hints, index)
            .map(|icon| vec![MatchCandidate::new(icon, MatchTier::Category, 0.1)])
            .unwrap_or_default()
    }
}
