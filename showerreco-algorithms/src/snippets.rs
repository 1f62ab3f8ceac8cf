//! Grouping of hits found on the same readout snippet.
//!
//! A hit finder can fit several pulses to one snippet of charge on a wire.
//! For calorimetry only one hit per snippet should be used, or all of them
//! summed. Hits sharing `(start tick, end tick, wire)` on a plane are grouped
//! and the one with the largest integral is chosen as the primary.

use std::collections::{BTreeMap, HashMap};

use showerreco_core::{Hit, HitId, PlaneId, SnippetKey};

/// Hits found on one snippet.
#[derive(Clone, Debug, PartialEq)]
pub struct Snippet {
    /// Hit with the largest integral.
    pub primary: Hit,
    /// All other hits on the snippet, in discovery order.
    pub secondaries: Vec<Hit>,
}

impl Snippet {
    fn new(primary: Hit) -> Self {
        Self {
            primary,
            secondaries: Vec::new(),
        }
    }

    fn insert(&mut self, hit: Hit) {
        if hit.integral > self.primary.integral {
            let previous = std::mem::replace(&mut self.primary, hit);
            self.secondaries.push(previous);
        } else {
            self.secondaries.push(hit);
        }
    }

    /// Sum of the integrals of every hit on the snippet.
    #[must_use]
    pub fn total_integral(&self) -> f64 {
        self.primary.integral + self.secondaries.iter().map(|hit| hit.integral).sum::<f64>()
    }
}

/// Snippets keyed by the identity of their primary hit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitSnippets {
    snippets: BTreeMap<HitId, Snippet>,
}

impl HitSnippets {
    /// Returns the snippet whose primary is `hit`, if `hit` is a primary.
    #[must_use]
    pub fn get(&self, hit: &Hit) -> Option<&Snippet> {
        self.snippets.get(&hit.id)
    }

    /// Returns true if `hit` was selected as a primary.
    #[must_use]
    pub fn is_primary(&self, hit: &Hit) -> bool {
        self.snippets.contains_key(&hit.id)
    }

    /// Number of snippets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    /// Returns true if there are no snippets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// Iterates over snippets ordered by primary hit id.
    pub fn iter(&self) -> impl Iterator<Item = &Snippet> {
        self.snippets.values()
    }
}

/// Groups hits by readout snippet, plane by plane.
///
/// Every input hit ends up either as a primary or as a secondary of exactly
/// one snippet.
#[must_use]
pub fn organize_hits(hits: &[Hit]) -> HitSnippets {
    let mut per_plane: HashMap<PlaneId, Vec<(SnippetKey, Snippet)>> = HashMap::new();

    for hit in hits {
        let groups = per_plane.entry(hit.plane_id()).or_default();
        let key = hit.snippet_key();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, snippet)) => snippet.insert(*hit),
            None => groups.push((key, Snippet::new(*hit))),
        }
    }

    let snippets = per_plane
        .into_values()
        .flatten()
        .map(|(_, snippet)| (snippet.primary.id, snippet))
        .collect();
    HitSnippets { snippets }
}
