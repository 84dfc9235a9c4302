//! The Person registry: a separate owner from the Memory Vault. Records
//! carry people by name only; this registry resolves those names to
//! canonical [`Person`] records at read time, never the other way around.

use parking_lot::RwLock;
use remind_core::Person;

#[derive(Default)]
pub struct PersonRegistry {
    people: RwLock<Vec<Person>>,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new Person or overwrites the existing one with the same
    /// canonical `name`. Ingestion's S2 (name mapping) and S5 (voice-clone
    /// provisioning) are the only expected callers.
    pub fn upsert(&self, person: Person) {
        let mut people = self.people.write();
        if let Some(existing) = people.iter_mut().find(|p| p.name == person.name) {
            *existing = person;
        } else {
            people.push(person);
        }
    }

    pub fn get(&self, name: &str) -> Option<Person> {
        let key = name.to_lowercase();
        self.people.read().iter().find(|p| p.name == key).cloned()
    }

    pub fn all(&self) -> Vec<Person> {
        self.people.read().clone()
    }

    /// Every registered Person whose canonical name appears as a substring
    /// of `utterance` (case-insensitive), voice-clone-capable people first.
    /// Used by the Patient Query Runtime's agent-mode target resolution and
    /// by the Classifier's agent heuristic.
    pub fn mentioned_in(&self, utterance: &str) -> Vec<Person> {
        let utterance_lower = utterance.to_lowercase();
        let mut matches: Vec<Person> = self
            .people
            .read()
            .iter()
            .filter(|p| utterance_lower.contains(&p.name))
            .cloned()
            .collect();
        matches.sort_by_key(|p| !p.has_voice_clone());
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, voice_clone: bool) -> Person {
        let mut p = Person::new(name, vec![format!("https://example/{name}.jpg")]);
        if voice_clone {
            p.voice_clone_id = Some(format!("{name}-vc"));
        }
        p
    }

    #[test]
    fn upsert_is_idempotent_on_canonical_name() {
        let registry = PersonRegistry::new();
        registry.upsert(person("Steve", false));
        registry.upsert(person("Steve", true));
        assert_eq!(registry.all().len(), 1);
        assert!(registry.get("steve").unwrap().has_voice_clone());
    }

    #[test]
    fn mentioned_in_prefers_voice_clone_capable_people() {
        let registry = PersonRegistry::new();
        registry.upsert(person("Steve", false));
        registry.upsert(person("Maria", true));
        let mentioned = registry.mentioned_in("I want to talk to Steve and Maria");
        assert_eq!(mentioned.len(), 2);
        assert_eq!(mentioned[0].name, "maria");
    }

    #[test]
    fn get_is_case_insensitive() {
        let registry = PersonRegistry::new();
        registry.upsert(person("Steve", false));
        assert!(registry.get("STEVE").is_some());
    }
}
