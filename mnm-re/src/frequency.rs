//! Term frequency map
//!
//! Counts how many times each term was supplied across all participants.
//! An empty map means "no signal" for that facet: every score derived from
//! it is 0. Empty terms are never counted.

use std::collections::BTreeMap;

/// Term → occurrence count, iterated in term order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyMap {
    counts: BTreeMap<String, u32>,
}

impl FrequencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count terms, skipping empty ones
    pub fn from_terms<'a, I>(terms: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut map = Self::new();
        for term in terms {
            map.add(term);
        }
        map
    }

    pub fn add(&mut self, term: &str) {
        if term.is_empty() {
            return;
        }
        *self.counts.entry(term.to_string()).or_insert(0) += 1;
    }

    /// Count for a term (0 when absent)
    pub fn get(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of counts for the given terms (repeats count every time)
    pub fn overlap<'a, I>(&self, terms: I) -> u32
    where
        I: IntoIterator<Item = &'a String>,
    {
        terms.into_iter().map(|t| self.get(t)).sum()
    }

    /// Every term repeated by its count, joined with spaces
    ///
    /// This is the weighted query text fed to the text similarity index.
    pub fn weighted_query(&self) -> String {
        let mut words = Vec::new();
        for (term, count) in self.iter() {
            for _ in 0..count {
                words.push(term);
            }
        }
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_across_inputs() {
        let map = FrequencyMap::from_terms(["chinese", "thai", "chinese"]);
        assert_eq!(map.get("chinese"), 2);
        assert_eq!(map.get("thai"), 1);
        assert_eq!(map.get("italian"), 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_empty_terms_carry_no_signal() {
        let map = FrequencyMap::from_terms(["", ""]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_overlap_sums_counts() {
        let map = FrequencyMap::from_terms(["chinese", "chinese", "thai"]);
        let tags = vec!["chinese".to_string(), "thai".to_string(), "momos".to_string()];
        assert_eq!(map.overlap(&tags), 3);
    }

    #[test]
    fn test_weighted_query_repeats_terms() {
        let map = FrequencyMap::from_terms(["pasta", "biryani", "pasta"]);
        assert_eq!(map.weighted_query(), "biryani pasta pasta");
    }
}
