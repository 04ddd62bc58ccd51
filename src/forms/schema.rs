//! Declarative field validation.
//!
//! A form schema is an ordered list of `(field, rule, message)` checks,
//! evaluated fully on `validate_all`. The first failing rule per field
//! wins; later checks on that field are skipped.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// A single validation rule.
pub enum Rule {
    /// Field must be a non-empty string.
    Required,
    /// Field must have a syntactically valid `local@domain` shape.
    Email,
    /// Field must be an ISO calendar date (`YYYY-MM-DD`).
    Date,
    /// Field must be one of the allowed values.
    OneOf(&'static [&'static str]),
}

impl Rule {
    /// Whether `value` passes this rule. Rules other than `Required` accept
    /// empty values; emptiness is `Required`'s concern.
    fn passes(&self, value: &str) -> bool {
        match self {
            Rule::Required => !value.is_empty(),
            Rule::Email => value.is_empty() || is_valid_email(value),
            Rule::Date => {
                value.is_empty() || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
            }
            Rule::OneOf(allowed) => value.is_empty() || allowed.contains(&value),
        }
    }
}

pub struct FieldCheck {
    pub field: &'static str,
    pub rule: Rule,
    pub message: &'static str,
}

/// Ordered validation checks for one form.
pub struct FormSchema {
    checks: &'static [FieldCheck],
}

impl FormSchema {
    pub const fn new(checks: &'static [FieldCheck]) -> Self {
        Self { checks }
    }

    /// Run every check, reporting each schema field as valid (`None`) or
    /// carrying its first failure message.
    pub fn validate_all(
        &self,
        values: &BTreeMap<&'static str, String>,
    ) -> ValidationOutcome {
        let mut fields: BTreeMap<&'static str, Option<&'static str>> = BTreeMap::new();
        for check in self.checks {
            fields.entry(check.field).or_insert(None);
        }
        for check in self.checks {
            let slot = fields.entry(check.field).or_insert(None);
            if slot.is_some() {
                continue;
            }
            let value = values.get(check.field).map(String::as_str).unwrap_or("");
            if !check.rule.passes(value) {
                *slot = Some(check.message);
            }
        }
        ValidationOutcome { fields }
    }

    /// Validate a single field in isolation, returning its first failure.
    pub fn validate_field(&self, field: &str, value: &str) -> Option<&'static str> {
        self.checks
            .iter()
            .filter(|c| c.field == field)
            .find(|c| !c.rule.passes(value))
            .map(|c| c.message)
    }
}

/// Result of a full validation pass; every schema field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    fields: BTreeMap<&'static str, Option<&'static str>>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.fields.values().all(Option::is_none)
    }

    pub fn error(&self, field: &str) -> Option<&'static str> {
        self.fields.get(field).copied().flatten()
    }

    /// Only the failing fields and their messages.
    pub fn errors(&self) -> BTreeMap<&'static str, &'static str> {
        self.fields
            .iter()
            .filter_map(|(field, message)| message.map(|m| (*field, m)))
            .collect()
    }
}

/// Minimal `local@domain` shape check: exactly one `@`, non-empty local
/// part, dotted domain, no whitespace.
fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
