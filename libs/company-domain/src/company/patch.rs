//! Merge-patch updates
//!
//! A patch is a list of typed field assignments checked against the known
//! company fields before anything touches the store. Unknown keys and
//! attempts to change the id are rejected instead of being merged blindly.

use serde_json::{Map, Value};

use crate::company::{
    entity::{validate_description, validate_name, Company, CompanyType},
    error::CompanyError,
};

/// A single "field set to value" operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Name(String),
    /// `None` clears the description
    Description(Option<String>),
    EmployeeCount(u32),
    IsRegistered(bool),
    Type(CompanyType),
}

impl FieldChange {
    /// Field name as it appears in JSON and in stored documents
    pub fn field(&self) -> &'static str {
        match self {
            FieldChange::Name(_) => "name",
            FieldChange::Description(_) => "description",
            FieldChange::EmployeeCount(_) => "employeeCount",
            FieldChange::IsRegistered(_) => "isRegistered",
            FieldChange::Type(_) => "type",
        }
    }

    fn apply_to(&self, company: &mut Company) {
        match self {
            FieldChange::Name(name) => company.set_name(name.clone()),
            FieldChange::Description(description) => company.set_description(description.clone()),
            FieldChange::EmployeeCount(count) => company.set_employee_count(*count),
            FieldChange::IsRegistered(registered) => company.set_registered(*registered),
            FieldChange::Type(company_type) => company.set_company_type(*company_type),
        }
    }

    fn validated(self) -> Result<Self, CompanyError> {
        match self {
            FieldChange::Name(name) => validate_name(&name).map(FieldChange::Name),
            FieldChange::Description(description) => {
                validate_description(description.as_deref())?;
                Ok(FieldChange::Description(description))
            }
            other => Ok(other),
        }
    }
}

/// A validated, non-empty set of field changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyPatch {
    changes: Vec<FieldChange>,
}

impl CompanyPatch {
    /// Build a patch from typed changes
    ///
    /// # Errors
    ///
    /// Returns `CompanyError::Validation` if the list is empty, names the
    /// same field twice, or carries a value that breaks a field constraint
    pub fn from_changes(changes: Vec<FieldChange>) -> Result<Self, CompanyError> {
        if changes.is_empty() {
            return Err(CompanyError::validation("update must change at least one field"));
        }

        let mut validated: Vec<FieldChange> = Vec::with_capacity(changes.len());
        for change in changes {
            if validated.iter().any(|c| c.field() == change.field()) {
                return Err(CompanyError::validation(format!(
                    "field '{}' appears more than once",
                    change.field()
                )));
            }
            validated.push(change.validated()?);
        }

        Ok(Self { changes: validated })
    }

    /// Build a patch from an unordered JSON object
    ///
    /// # Errors
    ///
    /// Returns `CompanyError::Validation` for unknown keys, an `id` key,
    /// values of the wrong JSON type, or an empty object
    pub fn from_json(object: &Map<String, Value>) -> Result<Self, CompanyError> {
        let changes = object
            .iter()
            .map(|(key, value)| parse_field(key, value))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_changes(changes)
    }

    /// Validated changes, at most one per field
    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// The new name, when this patch renames the company
    pub fn new_name(&self) -> Option<&str> {
        self.changes.iter().find_map(|c| match c {
            FieldChange::Name(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Merge the patch over a stored company; omitted fields keep their value
    pub fn apply(&self, company: &Company) -> Company {
        let mut merged = company.clone();
        for change in &self.changes {
            change.apply_to(&mut merged);
        }
        merged
    }
}

impl TryFrom<Map<String, Value>> for CompanyPatch {
    type Error = CompanyError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_json(&object)
    }
}

fn parse_field(key: &str, value: &Value) -> Result<FieldChange, CompanyError> {
    match key {
        "id" => Err(CompanyError::validation("id cannot be changed")),
        "name" => value
            .as_str()
            .map(|s| FieldChange::Name(s.to_string()))
            .ok_or_else(|| type_error(key, "a string")),
        "description" => match value {
            Value::Null => Ok(FieldChange::Description(None)),
            Value::String(s) => Ok(FieldChange::Description(Some(s.clone()))),
            _ => Err(type_error(key, "a string or null")),
        },
        "employeeCount" => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(FieldChange::EmployeeCount)
            .ok_or_else(|| type_error(key, "a non-negative integer")),
        "isRegistered" => value
            .as_bool()
            .map(FieldChange::IsRegistered)
            .ok_or_else(|| type_error(key, "a boolean")),
        "type" => value
            .as_str()
            .ok_or_else(|| type_error(key, "a string"))
            .and_then(|s| s.parse().map(FieldChange::Type)),
        other => Err(CompanyError::validation(format!("unknown field '{other}'"))),
    }
}

fn type_error(key: &str, expected: &str) -> CompanyError {
    CompanyError::validation(format!("field '{key}' must be {expected}"))
}
