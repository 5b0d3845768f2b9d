//! Pending writes.
//!
//! A [`Changeset`] pairs the current field values of a record with the set of
//! proposed changes and any errors collected while preparing them. It is a
//! plain value: every operation consumes the changeset and returns the next
//! one, so a persistence hook is a function from one changeset to another.
//! Hooks only ever see the changes; the record data itself is read-only.

use crate::error::PersistenceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A named column of a persisted record.
pub trait Field: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    /// The serialized name of the field.
    fn name(self) -> &'static str;
}

/// A record type that can be staged in a [`Changeset`].
pub trait Schema: Clone + Serialize + DeserializeOwned + Send + Sync {
    type Field: Field;

    /// Every field a changeset may touch.
    const FIELDS: &'static [Self::Field];
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError<F> {
    pub field: F,
    pub message: String,
}

impl<F: Field> fmt::Display for FieldError<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field.name(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Changeset<S: Schema> {
    data: S,
    changes: BTreeMap<S::Field, Value>,
    errors: Vec<FieldError<S::Field>>,
}

impl<S: Schema> Changeset<S> {
    /// A changeset with no changes over `data`.
    pub fn new(data: S) -> Self {
        Changeset {
            data,
            changes: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// Stages `changes` over `data`, keeping only the values that differ
    /// from what `data` already holds.
    pub fn change<I>(data: S, changes: I) -> Self
    where
        I: IntoIterator<Item = (S::Field, Value)>,
    {
        let current = serde_json::to_value(&data).unwrap_or(Value::Null);
        let changes = changes
            .into_iter()
            .filter(|(field, value)| current.get(field.name()) != Some(value))
            .collect();

        Changeset {
            data,
            changes,
            errors: Vec::new(),
        }
    }

    /// Promotes every populated field of `data` into the changes.
    ///
    /// A record being inserted has no stored state, so everything it carries
    /// is new and must pass through `dump`. Explicit changes win.
    pub fn into_insert(mut self) -> Self {
        let current = serde_json::to_value(&self.data).unwrap_or(Value::Null);
        for &field in S::FIELDS {
            if self.changes.contains_key(&field) {
                continue;
            }
            match current.get(field.name()) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    self.changes.insert(field, value.clone());
                }
            }
        }
        self
    }

    /// Moves the changes and errors over `data`.
    ///
    /// Used to stage a caller's changes over the stored record, which may
    /// differ from the copy the caller read back through `load`.
    pub fn rebase(self, data: S) -> Self {
        Changeset {
            data,
            changes: self.changes,
            errors: self.errors,
        }
    }

    /// Records a change unconditionally, replacing any previous change to
    /// the same field.
    pub fn put_change(mut self, field: S::Field, value: impl Into<Value>) -> Self {
        self.changes.insert(field, value.into());
        self
    }

    pub fn delete_change(mut self, field: S::Field) -> Self {
        self.changes.remove(&field);
        self
    }

    pub fn data(&self) -> &S {
        &self.data
    }

    pub fn changes(&self) -> &BTreeMap<S::Field, Value> {
        &self.changes
    }

    pub fn get_change(&self, field: S::Field) -> Option<&Value> {
        self.changes.get(&field)
    }

    pub fn is_changed(&self, field: S::Field) -> bool {
        self.changes.contains_key(&field)
    }

    /// The value the field will have once applied: the change if there is
    /// one, the current data otherwise.
    pub fn get_field(&self, field: S::Field) -> Option<Value> {
        if let Some(value) = self.changes.get(&field) {
            return Some(value.clone());
        }
        serde_json::to_value(&self.data)
            .ok()?
            .get(field.name())
            .cloned()
    }

    pub fn add_error(mut self, field: S::Field, message: impl Into<String>) -> Self {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
        self
    }

    pub fn errors(&self) -> &[FieldError<S::Field>] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Rewrites a string change with `transform`.
    ///
    /// Fields without a change and fields changed to null are returned
    /// untouched. If `transform` fails, the original change is kept and the
    /// failure is attached as an error on `field`, which invalidates the
    /// changeset.
    pub fn update_string_change<F, E>(self, field: S::Field, transform: F) -> Self
    where
        F: FnOnce(&str) -> Result<String, E>,
        E: fmt::Display,
    {
        let current = match self.changes.get(&field) {
            None | Some(Value::Null) => return self,
            Some(Value::String(value)) => value.clone(),
            Some(_) => return self.add_error(field, "expected a string"),
        };

        match transform(&current) {
            Ok(transformed) => self.put_change(field, transformed),
            Err(err) => self.add_error(field, err.to_string()),
        }
    }

    /// Merges the changes into the data.
    ///
    /// Fails with every attached error when the changeset is invalid, so an
    /// invalid changeset can never reach storage.
    pub fn apply(self) -> Result<S, PersistenceError> {
        if !self.errors.is_empty() {
            return Err(PersistenceError::InvalidChangeset(
                self.errors.iter().map(ToString::to_string).collect(),
            ));
        }

        let mut record = serde_json::to_value(&self.data)?;
        let fields = record.as_object_mut().ok_or_else(|| {
            PersistenceError::Serialization("record is not a JSON object".to_string())
        })?;
        for (field, value) in self.changes {
            fields.insert(field.name().to_string(), value);
        }

        Ok(serde_json::from_value(record)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        title: String,
        body: Option<String>,
        stars: u32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum NoteField {
        Title,
        Body,
        Stars,
    }

    impl Field for NoteField {
        fn name(self) -> &'static str {
            match self {
                NoteField::Title => "title",
                NoteField::Body => "body",
                NoteField::Stars => "stars",
            }
        }
    }

    impl Schema for Note {
        type Field = NoteField;
        const FIELDS: &'static [NoteField] = &[NoteField::Title, NoteField::Body, NoteField::Stars];
    }

    fn note() -> Note {
        Note {
            title: "draft".to_string(),
            body: None,
            stars: 1,
        }
    }

    #[test]
    fn test_change_drops_values_equal_to_data() {
        let changeset = Changeset::change(
            note(),
            [
                (NoteField::Title, json!("draft")),
                (NoteField::Stars, json!(3)),
            ],
        );
        assert!(!changeset.is_changed(NoteField::Title));
        assert_eq!(changeset.get_change(NoteField::Stars), Some(&json!(3)));
    }

    #[test]
    fn test_put_change_always_records() {
        let changeset = Changeset::new(note()).put_change(NoteField::Title, "draft");
        assert!(changeset.is_changed(NoteField::Title));
    }

    #[test]
    fn test_get_field_prefers_change() {
        let changeset = Changeset::new(note()).put_change(NoteField::Stars, 5);
        assert_eq!(changeset.get_field(NoteField::Stars), Some(json!(5)));
        assert_eq!(changeset.get_field(NoteField::Title), Some(json!("draft")));
        assert_eq!(changeset.get_field(NoteField::Body), Some(Value::Null));
    }

    #[test]
    fn test_update_string_change_skips_absent_and_null() {
        let untouched = Changeset::new(note())
            .put_change(NoteField::Body, Value::Null)
            .update_string_change(NoteField::Body, |_| Err::<String, _>("boom"))
            .update_string_change(NoteField::Title, |_| Err::<String, _>("boom"));
        assert!(untouched.is_valid());
        assert_eq!(untouched.get_change(NoteField::Body), Some(&Value::Null));
        assert!(!untouched.is_changed(NoteField::Title));
    }

    #[test]
    fn test_update_string_change_transforms_value() {
        let changeset = Changeset::new(note())
            .put_change(NoteField::Body, "hello")
            .update_string_change(NoteField::Body, |body| {
                Ok::<_, PersistenceError>(body.to_uppercase())
            });
        assert_eq!(changeset.get_change(NoteField::Body), Some(&json!("HELLO")));
    }

    #[test]
    fn test_failed_transform_blocks_apply() {
        let changeset = Changeset::new(note())
            .put_change(NoteField::Body, "hello")
            .update_string_change(NoteField::Body, |_| {
                Err::<String, _>(PersistenceError::KeyUnavailable)
            });
        assert!(!changeset.is_valid());
        assert_eq!(
            changeset.apply(),
            Err(PersistenceError::InvalidChangeset(vec![
                "body: encryption key unavailable".to_string()
            ]))
        );
    }

    #[test]
    fn test_non_string_change_is_an_error() {
        let changeset = Changeset::new(note())
            .put_change(NoteField::Title, 42)
            .update_string_change(NoteField::Title, |title| {
                Ok::<_, PersistenceError>(title.to_string())
            });
        assert_eq!(changeset.errors()[0].message, "expected a string");
    }

    #[test]
    fn test_apply_merges_changes() {
        let applied = Changeset::change(
            note(),
            [
                (NoteField::Body, json!("text")),
                (NoteField::Stars, json!(4)),
            ],
        )
        .apply()
        .unwrap();
        assert_eq!(
            applied,
            Note {
                title: "draft".to_string(),
                body: Some("text".to_string()),
                stars: 4,
            }
        );
    }

    #[test]
    fn test_into_insert_promotes_populated_fields() {
        let changeset = Changeset::change(note(), [(NoteField::Stars, json!(2))]).into_insert();
        assert_eq!(changeset.get_change(NoteField::Title), Some(&json!("draft")));
        assert_eq!(changeset.get_change(NoteField::Stars), Some(&json!(2)));
        assert!(!changeset.is_changed(NoteField::Body));
    }

    #[test]
    fn test_rebase_keeps_changes_and_errors() {
        let stored = Note {
            body: Some("stored".to_string()),
            ..note()
        };
        let changeset = Changeset::new(note())
            .put_change(NoteField::Stars, 9)
            .rebase(stored.clone());
        assert_eq!(changeset.data(), &stored);
        assert_eq!(
            changeset.apply().unwrap(),
            Note {
                stars: 9,
                ..stored
            }
        );
    }

    #[test]
    fn test_apply_rejects_mistyped_change() {
        let result = Changeset::new(note())
            .put_change(NoteField::Stars, "many")
            .apply();
        assert!(matches!(result, Err(PersistenceError::Serialization(_))));
    }
}
