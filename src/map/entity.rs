// src/map/entity.rs
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::utils::util::parse_vec3;

/// Classnames of invisible brush volumes (drawn only with `SPECIAL_ENTITIES`).
const SPECIAL_CLASS_PREFIXES: [&str; 4] = ["trigger_", "func_clip", "func_ladder", "func_buyzone"];

/// An entity from the entity lump: an ordered list of key/value pairs.
///
/// Key order is preserved because it is what the raw keyvalue editor shows and
/// edits by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub keyvalues: Vec<(String, String)>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an entity from `(key, value)` pairs, keeping their order.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Entity {
            keyvalues: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.keyvalues
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.keyvalues.iter().position(|(k, _)| k == key)
    }

    /// Sets `key` to `value`, appending it when missing. Returns the old value.
    pub fn set(&mut self, key: &str, value: &str) -> Option<String> {
        match self.keyvalues.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => Some(std::mem::replace(v, value.to_string())),
            None => {
                self.keyvalues.push((key.to_string(), value.to_string()));
                None
            }
        }
    }

    /// Removes `key`, returning its position and value.
    pub fn remove(&mut self, key: &str) -> Option<(usize, String)> {
        let index = self.position_of(key)?;
        let (_, value) = self.keyvalues.remove(index);
        Some((index, value))
    }

    /// Inserts a pair at `index` (clamped to the end).
    pub fn insert_at(&mut self, index: usize, key: &str, value: &str) {
        let index = index.min(self.keyvalues.len());
        self.keyvalues
            .insert(index, (key.to_string(), value.to_string()));
    }

    /// Renames the key at `index`, returning the previous name.
    pub fn rename_key(&mut self, index: usize, new_key: &str) -> Option<String> {
        let (key, _) = self.keyvalues.get_mut(index)?;
        Some(std::mem::replace(key, new_key.to_string()))
    }

    pub fn classname(&self) -> &str {
        self.get("classname").unwrap_or("")
    }

    pub fn is_worldspawn(&self) -> bool {
        self.classname() == "worldspawn"
    }

    /// The brush model this entity draws: 0 for worldspawn, N for `"*N"`.
    pub fn bsp_model_index(&self) -> Option<usize> {
        if self.is_worldspawn() {
            return Some(0);
        }
        self.get("model")?.strip_prefix('*')?.parse().ok()
    }

    /// Entity origin; brush entity vertices are drawn offset by it.
    pub fn origin(&self) -> Vec3 {
        self.get("origin").and_then(parse_vec3).unwrap_or(Vec3::ZERO)
    }

    /// Trigger-like volumes that are normally hidden.
    pub fn is_special(&self) -> bool {
        let class = self.classname();
        SPECIAL_CLASS_PREFIXES.iter().any(|p| class.starts_with(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_index() {
        let world = Entity::from_pairs(&[("classname", "worldspawn")]);
        let door = Entity::from_pairs(&[("classname", "func_door"), ("model", "*3")]);
        let light = Entity::from_pairs(&[("classname", "light"), ("origin", "0 0 0")]);
        let studio = Entity::from_pairs(&[("classname", "cycler"), ("model", "models/x.mdl")]);
        assert_eq!(world.bsp_model_index(), Some(0));
        assert_eq!(door.bsp_model_index(), Some(3));
        assert_eq!(light.bsp_model_index(), None);
        assert_eq!(studio.bsp_model_index(), None);
    }

    #[test]
    fn test_set_keeps_order() {
        let mut ent = Entity::from_pairs(&[("classname", "light"), ("origin", "1 2 3")]);
        assert_eq!(ent.set("origin", "4 5 6"), Some("1 2 3".to_string()));
        assert_eq!(ent.set("_light", "255 255 255 200"), None);
        let keys: Vec<&str> = ent.keyvalues.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["classname", "origin", "_light"]);
        assert_eq!(ent.origin(), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_remove_and_reinsert() {
        let mut ent = Entity::from_pairs(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let (idx, value) = ent.remove("b").unwrap();
        assert_eq!((idx, value.as_str()), (1, "2"));
        ent.insert_at(idx, "b", &value);
        assert_eq!(ent.keyvalues[1], ("b".to_string(), "2".to_string()));
    }

    #[test]
    fn test_rename_key() {
        let mut ent = Entity::from_pairs(&[("classname", "func_wall"), ("modle", "*1")]);
        assert_eq!(ent.bsp_model_index(), None);
        assert_eq!(ent.rename_key(1, "model"), Some("modle".to_string()));
        assert_eq!(ent.bsp_model_index(), Some(1));
        assert_eq!(ent.rename_key(9, "x"), None);
    }

    #[test]
    fn test_special_classes() {
        assert!(Entity::from_pairs(&[("classname", "trigger_once")]).is_special());
        assert!(!Entity::from_pairs(&[("classname", "func_door")]).is_special());
    }
}
