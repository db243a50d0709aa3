// src/editor/commands.rs

use crate::error::{Result, ViewerError};
use crate::map::{Entity, Level};

pub trait Command: Send + Sync + std::fmt::Debug {
    fn execute(&mut self, level: &mut Level) -> Result<()>;
    fn unexecute(&mut self, level: &mut Level) -> Result<()>;

    /// Entity touched by the command.
    fn entity(&self) -> usize;

    fn undo(&mut self, level: &mut Level) -> Result<()> {
        self.unexecute(level)
    }
}

fn entity_mut(level: &mut Level, index: usize) -> Result<&mut Entity> {
    let len = level.entities.len();
    level.entities.get_mut(index).ok_or(ViewerError::IndexOutOfRange {
        kind: "entity",
        index,
        len,
    })
}

/// Raw keyvalue edits.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandType {
    SetKeyValue {
        entity: usize,
        key: String,
        value: String,
        /// Filled on execute; `None` when the key was added.
        previous: Option<String>,
    },
    RenameKey {
        entity: usize,
        index: usize,
        new_key: String,
        old_key: Option<String>,
    },
    RemoveKeyValue {
        entity: usize,
        key: String,
        removed: Option<(usize, String)>,
    },
}

impl CommandType {
    pub fn set_keyvalue(entity: usize, key: &str, value: &str) -> Self {
        CommandType::SetKeyValue {
            entity,
            key: key.to_string(),
            value: value.to_string(),
            previous: None,
        }
    }

    pub fn rename_key(entity: usize, index: usize, new_key: &str) -> Self {
        CommandType::RenameKey {
            entity,
            index,
            new_key: new_key.to_string(),
            old_key: None,
        }
    }

    pub fn remove_keyvalue(entity: usize, key: &str) -> Self {
        CommandType::RemoveKeyValue {
            entity,
            key: key.to_string(),
            removed: None,
        }
    }
}

impl Command for CommandType {
    fn execute(&mut self, level: &mut Level) -> Result<()> {
        match self {
            CommandType::SetKeyValue { entity, key, value, previous } => {
                *previous = entity_mut(level, *entity)?.set(key, value);
                Ok(())
            }
            CommandType::RenameKey { entity, index, new_key, old_key } => {
                let ent = entity_mut(level, *entity)?;
                let len = ent.keyvalues.len();
                let old = ent.rename_key(*index, new_key).ok_or(ViewerError::IndexOutOfRange {
                    kind: "keyvalue",
                    index: *index,
                    len,
                })?;
                *old_key = Some(old);
                Ok(())
            }
            CommandType::RemoveKeyValue { entity, key, removed } => {
                let index = *entity;
                let pair = entity_mut(level, index)?
                    .remove(key)
                    .ok_or_else(|| ViewerError::MissingKey {
                        entity: index,
                        key: key.clone(),
                    })?;
                *removed = Some(pair);
                Ok(())
            }
        }
    }

    fn unexecute(&mut self, level: &mut Level) -> Result<()> {
        match self {
            CommandType::SetKeyValue { entity, key, previous, .. } => {
                let ent = entity_mut(level, *entity)?;
                match previous {
                    Some(old) => {
                        ent.set(key, old);
                    }
                    None => {
                        ent.remove(key);
                    }
                }
                Ok(())
            }
            CommandType::RenameKey { entity, index, old_key, .. } => {
                if let Some(old) = old_key {
                    let ent = entity_mut(level, *entity)?;
                    let len = ent.keyvalues.len();
                    ent.rename_key(*index, old).ok_or(ViewerError::IndexOutOfRange {
                        kind: "keyvalue",
                        index: *index,
                        len,
                    })?;
                }
                Ok(())
            }
            CommandType::RemoveKeyValue { entity, key, removed } => {
                if let Some((index, value)) = removed {
                    entity_mut(level, *entity)?.insert_at(*index, key, value);
                }
                Ok(())
            }
        }
    }

    fn entity(&self) -> usize {
        match self {
            CommandType::SetKeyValue { entity, .. }
            | CommandType::RenameKey { entity, .. }
            | CommandType::RemoveKeyValue { entity, .. } => *entity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> Level {
        let mut level = Level::new("cmd");
        level.entities.push(Entity::from_pairs(&[("classname", "worldspawn")]));
        level.entities.push(Entity::from_pairs(&[
            ("classname", "light"),
            ("origin", "0 0 0"),
            ("_light", "255 255 255 200"),
        ]));
        level
    }

    #[test]
    fn test_set_existing_and_undo() {
        let mut level = level();
        let mut cmd = CommandType::set_keyvalue(1, "origin", "16 0 0");
        cmd.execute(&mut level).unwrap();
        assert_eq!(level.entities[1].get("origin"), Some("16 0 0"));
        cmd.undo(&mut level).unwrap();
        assert_eq!(level.entities[1].get("origin"), Some("0 0 0"));
    }

    #[test]
    fn test_set_new_key_undo_removes_it() {
        let mut level = level();
        let before = level.clone();
        let mut cmd = CommandType::set_keyvalue(1, "targetname", "lamp");
        cmd.execute(&mut level).unwrap();
        assert_eq!(level.entities[1].keyvalues.len(), 4);
        cmd.unexecute(&mut level).unwrap();
        assert_eq!(level, before);
    }

    #[test]
    fn test_rename_round_trip() {
        let mut level = level();
        let before = level.clone();
        let mut cmd = CommandType::rename_key(1, 2, "light");
        cmd.execute(&mut level).unwrap();
        assert_eq!(level.entities[1].keyvalues[2].0, "light");
        cmd.unexecute(&mut level).unwrap();
        assert_eq!(level, before);

        let mut bad = CommandType::rename_key(1, 9, "x");
        assert!(matches!(
            bad.execute(&mut level),
            Err(ViewerError::IndexOutOfRange { kind: "keyvalue", .. })
        ));
    }

    #[test]
    fn test_rename_undo_after_key_vanished() {
        let mut level = level();
        let mut cmd = CommandType::rename_key(1, 2, "light");
        cmd.execute(&mut level).unwrap();
        level.entities[1].keyvalues.truncate(2);
        assert!(matches!(
            cmd.unexecute(&mut level),
            Err(ViewerError::IndexOutOfRange { kind: "keyvalue", index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_remove_restores_position() {
        let mut level = level();
        let before = level.clone();
        let mut cmd = CommandType::remove_keyvalue(1, "origin");
        cmd.execute(&mut level).unwrap();
        assert_eq!(level.entities[1].get("origin"), None);
        cmd.unexecute(&mut level).unwrap();
        assert_eq!(level, before);

        let mut missing = CommandType::remove_keyvalue(1, "nope");
        assert!(matches!(missing.execute(&mut level), Err(ViewerError::MissingKey { .. })));
    }

    #[test]
    fn test_missing_entity() {
        let mut level = level();
        let mut cmd = CommandType::set_keyvalue(7, "a", "b");
        assert!(matches!(
            cmd.execute(&mut level),
            Err(ViewerError::IndexOutOfRange { kind: "entity", index: 7, len: 2 })
        ));
        assert_eq!(cmd.entity(), 7);
    }
}
