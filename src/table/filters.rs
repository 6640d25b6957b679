use serde::Serialize;

use super::TableError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchRule {
    /// Case-insensitive substring search over the string form of the field.
    Contains,
    /// Verbatim equality with the string form of the field.
    Exact,
}

impl MatchRule {
    pub fn accepts(self, field_text: Option<&str>, value: &str) -> bool {
        if value.is_empty() {
            return true;
        }
        let Some(text) = field_text else {
            return false;
        };
        match self {
            MatchRule::Contains => text.to_lowercase().contains(&value.to_lowercase()),
            MatchRule::Exact => text == value,
        }
    }
}

/// A record that can be narrowed by a [`FilterSet`].
///
/// `FILTER_FIELDS` lists the field names a table offers together with the rule
/// each one is matched with. `field_text` returns the string form of a field,
/// or `None` when the record has no value for it (an unsaved identifier, an
/// unassigned role).
pub trait Filterable {
    const FILTER_FIELDS: &'static [(&'static str, MatchRule)];

    fn field_text(&self, field: &str) -> Option<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldFilter {
    pub field: String,
    pub rule: MatchRule,
    pub value: String,
}

impl FieldFilter {
    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn matches<T: Filterable>(&self, record: &T) -> bool {
        if !self.is_active() {
            return true;
        }
        let text = record.field_text(&self.field);
        self.rule.accepts(text.as_deref(), &self.value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterSet {
    filters: Vec<FieldFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter set for `T` from `(field, value)` pairs, taking each
    /// field's rule from `T::FILTER_FIELDS`.
    pub fn for_record<T: Filterable>(
        pairs: impl IntoIterator<Item = (impl AsRef<str>, impl Into<String>)>,
    ) -> Result<Self, TableError> {
        let mut set = Self::new();
        for (field, value) in pairs {
            set.set::<T>(field.as_ref(), value)?;
        }
        Ok(set)
    }

    /// Sets (or replaces) the value for one field. Setting an empty value
    /// keeps the field in the set but makes it a pass-through.
    pub fn set<T: Filterable>(
        &mut self,
        field: &str,
        value: impl Into<String>,
    ) -> Result<(), TableError> {
        let field = field.trim().to_lowercase();
        let rule = rule_for::<T>(&field)?;
        let value = value.into();
        match self.filters.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.value = value,
            None => self.filters.push(FieldFilter { field, rule, value }),
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn is_empty(&self) -> bool {
        !self.filters.iter().any(FieldFilter::is_active)
    }

    pub fn active(&self) -> impl Iterator<Item = &FieldFilter> {
        self.filters.iter().filter(|f| f.is_active())
    }

    pub fn matches<T: Filterable>(&self, record: &T) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    pub fn summary(&self) -> Option<String> {
        let parts: Vec<String> = self
            .active()
            .map(|f| format!("{}={}", f.field, f.value))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

fn rule_for<T: Filterable>(field: &str) -> Result<MatchRule, TableError> {
    T::FILTER_FIELDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, rule)| *rule)
        .ok_or_else(|| TableError::UnknownField {
            field: field.to_string(),
            known: T::FILTER_FIELDS
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Splits `FIELD=VALUE`. The value may itself contain `=` and may be empty.
pub fn parse_filter_pair(raw: &str) -> Result<(String, String), TableError> {
    let (field, value) = raw.split_once('=').ok_or_else(|| TableError::MalformedFilter {
        raw: raw.to_string(),
    })?;
    let field = field.trim();
    if field.is_empty() {
        return Err(TableError::MalformedFilter {
            raw: raw.to_string(),
        });
    }
    Ok((field.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        id: Option<u32>,
        name: &'static str,
        day: &'static str,
    }

    impl Filterable for Row {
        const FILTER_FIELDS: &'static [(&'static str, MatchRule)] = &[
            ("id", MatchRule::Contains),
            ("name", MatchRule::Contains),
            ("date", MatchRule::Exact),
        ];

        fn field_text(&self, field: &str) -> Option<String> {
            match field {
                "id" => self.id.map(|id| id.to_string()),
                "name" => Some(self.name.to_string()),
                "date" => Some(self.day.to_string()),
                _ => None,
            }
        }
    }

    fn row(id: Option<u32>, name: &'static str) -> Row {
        Row {
            id,
            name,
            day: "2024-03-01",
        }
    }

    #[test]
    fn contains_ignores_case_on_both_sides() {
        assert!(MatchRule::Contains.accepts(Some("Ana María"), "MAR"));
        assert!(!MatchRule::Contains.accepts(Some("Beto"), "ana"));
    }

    #[test]
    fn exact_is_verbatim() {
        assert!(MatchRule::Exact.accepts(Some("2024-03-01"), "2024-03-01"));
        assert!(!MatchRule::Exact.accepts(Some("2024-03-01"), "2024-03"));
    }

    #[test]
    fn empty_value_passes_even_without_field() {
        assert!(MatchRule::Contains.accepts(None, ""));
        assert!(!MatchRule::Contains.accepts(None, "1"));
    }

    #[test]
    fn filters_are_conjunctive() {
        let set = FilterSet::for_record::<Row>([("name", "an"), ("id", "1")]).unwrap();
        assert!(set.matches(&row(Some(12), "Ana")));
        assert!(!set.matches(&row(Some(3), "Ana")));
        assert!(!set.matches(&row(Some(1), "Beto")));
    }

    #[test]
    fn unsaved_id_never_matches_id_filter() {
        let set = FilterSet::for_record::<Row>([("id", "1")]).unwrap();
        assert!(!set.matches(&row(None, "Ana")));
    }

    #[test]
    fn set_replaces_previous_value_for_field() {
        let mut set = FilterSet::new();
        set.set::<Row>("name", "ana").unwrap();
        set.set::<Row>("NAME", "beto").unwrap();
        assert_eq!(set.summary().as_deref(), Some("name=beto"));
        set.set::<Row>("name", "").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn unknown_field_lists_known_fields() {
        let err = FilterSet::for_record::<Row>([("phone", "1")]).unwrap_err();
        assert_eq!(
            err,
            TableError::UnknownField {
                field: "phone".to_string(),
                known: "id, name, date".to_string(),
            }
        );
    }

    #[test]
    fn parse_filter_pair_keeps_value_verbatim() {
        assert_eq!(
            parse_filter_pair("name=Ana María").unwrap(),
            ("name".to_string(), "Ana María".to_string())
        );
        assert_eq!(
            parse_filter_pair("email=").unwrap(),
            ("email".to_string(), String::new())
        );
        assert!(parse_filter_pair("name").is_err());
        assert!(parse_filter_pair("=ana").is_err());
    }
}
