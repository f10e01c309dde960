use log::debug;
use std::collections::HashMap;

use crate::config::PollErrors;

/// Internal handle of a registered candidate. Ids are handed out in
/// registration order, starting at zero.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub(crate) u32);

impl CandidateId {
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Optional information about a candidate. It is carried through to the output
/// tables untouched.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CandidateMetadata {
    /// Designer or manufacturer.
    pub designer: Option<String>,
    pub year: Option<String>,
    /// Link to an external ride database.
    pub link: Option<String>,
}

/// A rankable item.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    /// Globally unique key, for example `Millennium Force - Cedar Point - OH`.
    pub key: String,
    pub abbreviation: String,
    pub metadata: CandidateMetadata,
}

/// The three parts of a key written as `Name - Park - Location`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct KeyParts {
    pub name: String,
    pub park: String,
    pub location: String,
}

impl KeyParts {
    /// Splits a key into name, park and location. Keys that do not have
    /// exactly three dash-separated parts return `None`.
    pub fn split(key: &str) -> Option<KeyParts> {
        let parts: Vec<&str> = key.split('-').map(|s| s.trim()).collect();
        match parts.as_slice() {
            [name, park, location] => Some(KeyParts {
                name: name.to_string(),
                park: park.to_string(),
                location: location.to_string(),
            }),
            _ => None,
        }
    }
}

impl Candidate {
    pub fn key_parts(&self) -> Option<KeyParts> {
        KeyParts::split(&self.key)
    }
}

/// Owns every candidate that may appear on a ballot.
///
/// The registry is built once before any ballot is read and never shrinks.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    candidates: Vec<Candidate>,
    by_key: HashMap<String, CandidateId>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register(
        &mut self,
        key: &str,
        abbreviation: &str,
        metadata: CandidateMetadata,
    ) -> Result<&Candidate, PollErrors> {
        if self.by_key.contains_key(key) {
            return Err(PollErrors::DuplicateCandidate(key.to_string()));
        }
        let cid = CandidateId(self.candidates.len() as u32);
        debug!("register: {:?} -> {:?}", key, cid);
        self.by_key.insert(key.to_string(), cid);
        self.candidates.push(Candidate {
            key: key.to_string(),
            abbreviation: abbreviation.to_string(),
            metadata,
        });
        Ok(&self.candidates[cid.index()])
    }

    pub fn lookup(&self, key: &str) -> Option<&Candidate> {
        self.by_key.get(key).map(|cid| &self.candidates[cid.index()])
    }

    pub fn size(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub(crate) fn id_of(&self, key: &str) -> Option<CandidateId> {
        self.by_key.get(key).cloned()
    }

    pub(crate) fn get(&self, cid: CandidateId) -> &Candidate {
        &self.candidates[cid.index()]
    }

    /// All the candidates with their ids, in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (CandidateId, &Candidate)> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| (CandidateId(idx as u32), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut reg = Registry::new();
        reg.register("Fury 325 - Carowinds - NC", "Fury", CandidateMetadata::default())
            .unwrap();
        reg.register("Boulder Dash - Lake Compounce - CT", "BDash", CandidateMetadata::default())
            .unwrap();
        assert_eq!(reg.size(), 2);
        let c = reg.lookup("Boulder Dash - Lake Compounce - CT").unwrap();
        assert_eq!(c.abbreviation, "BDash");
        assert_eq!(reg.id_of("Fury 325 - Carowinds - NC"), Some(CandidateId(0)));
        assert!(reg.lookup("Phoenix - Knoebels - PA").is_none());
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut reg = Registry::new();
        reg.register("A", "a", CandidateMetadata::default()).unwrap();
        let res = reg.register("A", "other", CandidateMetadata::default());
        assert_eq!(res.err(), Some(PollErrors::DuplicateCandidate("A".to_string())));
        assert_eq!(reg.size(), 1);
    }

    #[test]
    fn key_parts() {
        let c = Candidate {
            key: "Voyage - Holiday World - IN".to_string(),
            abbreviation: "Voyage".to_string(),
            metadata: CandidateMetadata::default(),
        };
        let parts = c.key_parts().unwrap();
        assert_eq!(parts.name, "Voyage");
        assert_eq!(parts.park, "Holiday World");
        assert_eq!(parts.location, "IN");

        let c2 = Candidate {
            key: "Voyage".to_string(),
            ..c
        };
        assert_eq!(c2.key_parts(), None);
    }
}
