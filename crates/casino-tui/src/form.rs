use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use casino_core::format::{numeric, parse_list, to_iso};
use serde_json::Value;

/// Directory a lookup field draws its options from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    CashDesk,
    GameTable,
    Employee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Masked text.
    Secret,
    /// `YYYY-MM-DD HH:MM` local time, sent as RFC 3339 UTC.
    DateTime,
    /// `YYYY-MM-DD`, sent as typed.
    Date,
    Number,
    /// Comma separated items.
    List,
    Choice(&'static [&'static str]),
    /// Id picked from a loaded directory; free text while the directory is empty.
    Lookup(Lookup),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: &'static str,
}

impl FieldSpec {
    pub const fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
            default: "",
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default = value;
        self
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, FieldKind::Choice(_))
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::DateTime => Some("ГГГГ-ММ-ДД ЧЧ:ММ"),
            FieldKind::Date => Some("ГГГГ-ММ-ДД"),
            FieldKind::List => Some("через запятую"),
            _ => None,
        }
    }
}

/// One option of a lookup field: backend id plus what the operator sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOption {
    pub id: String,
    pub label: String,
}

/// Editable values of one form, one entry per field.
#[derive(Debug, Clone)]
pub struct FormState {
    pub fields: Vec<FieldSpec>,
    pub values: Vec<String>,
    pub focused: usize,
    pub cursor: usize,
    pub missing: Vec<&'static str>,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl FormState {
    pub fn new(fields: &[FieldSpec]) -> Self {
        let values: Vec<String> = fields
            .iter()
            .map(|field| match field.kind {
                // A required choice always holds one of its options.
                FieldKind::Choice(options) if field.required && field.default.is_empty() => {
                    options.first().map(|o| o.to_string()).unwrap_or_default()
                }
                _ => field.default.to_string(),
            })
            .collect();
        let cursor = values.first().map(|v| v.chars().count()).unwrap_or(0);
        Self {
            fields: fields.to_vec(),
            values,
            focused: 0,
            cursor,
            missing: Vec::new(),
        }
    }

    pub fn focused_field(&self) -> Option<&FieldSpec> {
        self.fields.get(self.focused)
    }

    pub fn value(&self, key: &str) -> &str {
        self.fields
            .iter()
            .position(|f| f.key == key)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_value(&mut self, key: &str, value: &str) {
        if let Some(i) = self.fields.iter().position(|f| f.key == key) {
            self.values[i] = value.to_string();
            if i == self.focused {
                self.cursor = value.chars().count();
            }
        }
    }

    fn focus(&mut self, index: usize) {
        if index < self.fields.len() {
            self.focused = index;
            self.cursor = self.values[index].chars().count();
        }
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus((self.focused + 1) % self.fields.len());
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            let len = self.fields.len();
            self.focus((self.focused + len - 1) % len);
        }
    }

    fn current(&mut self) -> Option<&mut String> {
        self.values.get_mut(self.focused)
    }

    /// Choice fields only change through `cycle`.
    fn is_locked(&self) -> bool {
        self.focused_field().map(FieldSpec::is_choice).unwrap_or(true)
    }

    pub fn insert_char(&mut self, c: char) {
        if self.is_locked() {
            return;
        }
        let cursor = self.cursor;
        if let Some(value) = self.current() {
            let byte_pos = char_to_byte_index(value, cursor);
            value.insert(byte_pos, c);
            self.cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 || self.is_locked() {
            return;
        }
        let cursor = self.cursor - 1;
        if let Some(value) = self.current() {
            let byte_pos = char_to_byte_index(value, cursor);
            if byte_pos < value.len() {
                value.remove(byte_pos);
            }
            self.cursor = cursor;
        }
    }

    pub fn delete(&mut self) {
        if self.is_locked() {
            return;
        }
        let cursor = self.cursor;
        if let Some(value) = self.current() {
            if cursor < value.chars().count() {
                let byte_pos = char_to_byte_index(value, cursor);
                value.remove(byte_pos);
            }
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let len = self.values.get(self.focused).map(|v| v.chars().count()).unwrap_or(0);
        self.cursor = (self.cursor + 1).min(len);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.values.get(self.focused).map(|v| v.chars().count()).unwrap_or(0);
    }

    /// Step a choice or lookup field through its options. Optional fields include "empty".
    pub fn cycle(&mut self, forward: bool, lookup_options: &[LookupOption]) {
        let Some(field) = self.focused_field().copied() else {
            return;
        };
        let mut options: Vec<String> = match field.kind {
            FieldKind::Choice(options) => options.iter().map(|o| o.to_string()).collect(),
            FieldKind::Lookup(_) if !lookup_options.is_empty() => {
                lookup_options.iter().map(|o| o.id.clone()).collect()
            }
            _ => return,
        };
        if !field.required {
            options.insert(0, String::new());
        }

        let current = &self.values[self.focused];
        let len = options.len();
        let next = match options.iter().position(|o| o == current) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.values[self.focused] = options[next].clone();
        self.cursor = self.values[self.focused].chars().count();
    }

    /// Presence check of required fields. Records and returns the labels that are blank.
    pub fn validate(&mut self) -> Result<FormValues, Vec<&'static str>> {
        self.missing = self
            .fields
            .iter()
            .zip(&self.values)
            .filter(|(field, value)| field.required && value.trim().is_empty())
            .map(|(field, _)| field.label)
            .collect();

        if self.missing.is_empty() {
            Ok(self.values())
        } else {
            Err(self.missing.clone())
        }
    }

    pub fn values(&self) -> FormValues {
        FormValues {
            values: self
                .fields
                .iter()
                .zip(&self.values)
                .map(|(field, value)| (field.key, value.clone()))
                .collect(),
        }
    }
}

/// Submitted form values keyed by field key, with conversions for request building.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    values: HashMap<&'static str, String>,
}

impl FormValues {
    pub fn from_pairs(pairs: &[(&'static str, &str)]) -> Self {
        Self {
            values: pairs.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        }
    }

    /// Trimmed value, empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.values.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    /// Trimmed value, `None` when blank.
    pub fn opt(&self, key: &str) -> Option<String> {
        Some(self.text(key)).filter(|v| !v.is_empty())
    }

    pub fn iso(&self, key: &str) -> String {
        to_iso(&self.text(key)).unwrap_or_default()
    }

    pub fn opt_iso(&self, key: &str) -> Option<String> {
        to_iso(&self.text(key))
    }

    pub fn number(&self, key: &str) -> Value {
        numeric(&self.text(key))
    }

    pub fn opt_number(&self, key: &str) -> Option<Value> {
        self.opt(key).map(|v| numeric(&v))
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        parse_list(&self.text(key))
    }

    pub fn choice<T: FromStr<Err = String>>(&self, key: &str) -> Result<T> {
        self.text(key).parse::<T>().map_err(|e| anyhow!(e))
    }

    pub fn opt_choice<T: FromStr<Err = String>>(&self, key: &str) -> Result<Option<T>> {
        self.opt(key)
            .map(|v| v.parse::<T>().map_err(|e| anyhow!(e)))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casino_core::api::IncidentType;

    const FIELDS: [FieldSpec; 4] = [
        FieldSpec::new("type", "Тип", FieldKind::Choice(IncidentType::VALUES)).required(),
        FieldSpec::new("location", "Локация", FieldKind::Text).required(),
        FieldSpec::new("participants", "Участники", FieldKind::List),
        FieldSpec::new("status", "Статус", FieldKind::Choice(&["OPEN", "CLOSED"])),
    ];

    #[test]
    fn test_required_choice_starts_on_first_option() {
        let form = FormState::new(&FIELDS);
        assert_eq!(form.value("type"), "THEFT");
        assert_eq!(form.value("status"), "");
    }

    #[test]
    fn test_validation_reports_blank_required_fields() {
        let mut form = FormState::new(&FIELDS);
        form.set_value("location", "   ");
        assert_eq!(form.validate().unwrap_err(), vec!["Локация"]);
        assert_eq!(form.missing, vec!["Локация"]);

        form.set_value("location", "Зал 1");
        let values = form.validate().unwrap();
        assert!(form.missing.is_empty());
        assert_eq!(values.text("location"), "Зал 1");
        assert_eq!(values.opt("participants"), None);
    }

    #[test]
    fn test_utf8_editing() {
        let mut form = FormState::new(&FIELDS);
        form.next_field();
        for c in "Зал".chars() {
            form.insert_char(c);
        }
        form.cursor_left();
        form.backspace();
        assert_eq!(form.value("location"), "Зл");
        form.cursor_home();
        form.delete();
        assert_eq!(form.value("location"), "л");
    }

    #[test]
    fn test_typing_into_choice_is_ignored() {
        let mut form = FormState::new(&FIELDS);
        form.insert_char('x');
        assert_eq!(form.value("type"), "THEFT");
    }

    #[test]
    fn test_deleting_from_choice_is_ignored() {
        let mut form = FormState::new(&FIELDS);
        form.cursor_end();
        form.backspace();
        assert_eq!(form.value("type"), "THEFT");
        form.cursor_home();
        form.delete();
        assert_eq!(form.value("type"), "THEFT");
    }

    #[test]
    fn test_cycle_optional_choice_passes_through_empty() {
        let mut form = FormState::new(&FIELDS);
        form.focus(3);
        form.cycle(true, &[]);
        assert_eq!(form.value("status"), "OPEN");
        form.cycle(true, &[]);
        assert_eq!(form.value("status"), "CLOSED");
        form.cycle(true, &[]);
        assert_eq!(form.value("status"), "");
        form.cycle(false, &[]);
        assert_eq!(form.value("status"), "CLOSED");
    }

    #[test]
    fn test_lookup_cycles_ids_or_stays_free_text() {
        let fields = [FieldSpec::new("desk", "Касса", FieldKind::Lookup(Lookup::CashDesk)).required()];
        let mut form = FormState::new(&fields);
        form.cycle(true, &[]);
        assert_eq!(form.value("desk"), "");

        let options = vec![
            LookupOption { id: "d1".to_string(), label: "Касса 1".to_string() },
            LookupOption { id: "d2".to_string(), label: "Касса 2".to_string() },
        ];
        form.cycle(true, &options);
        assert_eq!(form.value("desk"), "d1");
        form.cycle(true, &options);
        assert_eq!(form.value("desk"), "d2");
    }

    #[test]
    fn test_form_values_conversions() {
        let values = FormValues::from_pairs(&[
            ("amount", " 100 "),
            ("tags", "a, b"),
            ("type", "FIGHT"),
            ("empty", " "),
        ]);
        assert_eq!(values.number("amount"), serde_json::json!(100));
        assert_eq!(values.list("tags"), vec!["a", "b"]);
        assert_eq!(values.choice::<IncidentType>("type").unwrap(), IncidentType::Fight);
        assert_eq!(values.opt_choice::<IncidentType>("empty").unwrap(), None);
        assert_eq!(values.opt_iso("empty"), None);
    }
}
