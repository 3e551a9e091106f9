use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::BuildError;

/// Draws phrases uniformly at random from a non-empty list.
#[derive(Debug, Clone)]
pub struct PhrasePicker {
    phrases: Vec<String>,
    rng: StdRng,
}

impl PhrasePicker {
    pub fn new(phrases: Vec<String>) -> Result<Self, BuildError> {
        Self::with_rng(phrases, StdRng::from_entropy())
    }

    /// Deterministic picker for tests and replays.
    pub fn seeded(phrases: Vec<String>, seed: u64) -> Result<Self, BuildError> {
        Self::with_rng(phrases, StdRng::seed_from_u64(seed))
    }

    fn with_rng(phrases: Vec<String>, rng: StdRng) -> Result<Self, BuildError> {
        if phrases.is_empty() {
            return Err(BuildError::NoPhrases);
        }
        Ok(Self { phrases, rng })
    }

    pub fn pick(&mut self) -> &str {
        let i = self.rng.gen_range(0..self.phrases.len());
        &self.phrases[i]
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_rejected() {
        assert_eq!(PhrasePicker::new(Vec::new()).unwrap_err(), BuildError::NoPhrases);
    }

    #[test]
    fn picks_come_from_the_list_and_cover_it() {
        let list = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut picker = PhrasePicker::seeded(list.clone(), 7).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let p = picker.pick().to_string();
            assert!(list.contains(&p));
            seen.insert(p);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn same_seed_same_sequence() {
        let list: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let mut a = PhrasePicker::seeded(list.clone(), 42).unwrap();
        let mut b = PhrasePicker::seeded(list, 42).unwrap();
        for _ in 0..20 {
            assert_eq!(a.pick(), b.pick());
        }
    }
}
