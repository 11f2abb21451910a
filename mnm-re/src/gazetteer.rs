//! Location name → coordinate lookup
//!
//! Names are matched case-insensitively after trimming.

use std::collections::HashMap;

use mnm_common::normalize::normalize_location;
use mnm_common::{Coordinates, LocationInput};

/// Static place-name gazetteer
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: HashMap<String, Coordinates>,
}

impl Gazetteer {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Coordinates)>,
        S: AsRef<str>,
    {
        let places = entries
            .into_iter()
            .map(|(name, coords)| (normalize_location(name.as_ref()), coords))
            .collect();
        Self { places }
    }

    pub fn lookup(&self, name: &str) -> Option<Coordinates> {
        self.places.get(&normalize_location(name)).copied()
    }

    /// Resolve a participant location
    ///
    /// Explicit coordinates resolve when they are finite and on the globe.
    pub fn resolve(&self, location: &LocationInput) -> Option<Coordinates> {
        match location {
            LocationInput::Named(name) => self.lookup(name),
            LocationInput::Coordinates(c) => {
                let valid = c.lat.is_finite()
                    && c.lng.is_finite()
                    && (-90.0..=90.0).contains(&c.lat)
                    && (-180.0..=180.0).contains(&c.lng);
                valid.then_some(*c)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::new(vec![
            ("HSR", Coordinates::new(12.91, 77.64)),
            ("BTM ", Coordinates::new(12.90, 77.61)),
        ])
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let g = gazetteer();
        assert_eq!(g.lookup("hsr"), Some(Coordinates::new(12.91, 77.64)));
        assert_eq!(g.lookup("  Btm"), Some(Coordinates::new(12.90, 77.61)));
        assert_eq!(g.lookup("Atlantis"), None);
    }

    #[test]
    fn test_resolve_explicit_coordinates() {
        let g = gazetteer();
        let here = Coordinates::new(12.95, 77.60);
        assert_eq!(g.resolve(&LocationInput::Coordinates(here)), Some(here));

        let off_globe = Coordinates::new(123.0, 77.0);
        assert_eq!(g.resolve(&LocationInput::Coordinates(off_globe)), None);

        let nan = Coordinates::new(f64::NAN, 77.0);
        assert_eq!(g.resolve(&LocationInput::Coordinates(nan)), None);
    }

    #[test]
    fn test_resolve_named_location() {
        let g = gazetteer();
        assert!(g.resolve(&LocationInput::Named("HSR".into())).is_some());
        assert!(g.resolve(&LocationInput::Named("Nowhere".into())).is_none());
    }
}
