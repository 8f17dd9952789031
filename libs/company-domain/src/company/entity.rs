//! Domain entities for the company lifecycle
//!
//! A Company is the single entity type managed by this service. Its id is
//! assigned by the system at creation and never changes; every other field
//! may be replaced through a merge patch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::company::{error::CompanyError, ids::CompanyId};

/// Maximum length of a company name, in characters
pub const NAME_MAX_LEN: usize = 128;

/// Maximum length of a company description, in characters
pub const DESCRIPTION_MAX_LEN: usize = 3000;

/// Closed set of company categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyType {
    Corporations,
    NonProfit,
    Cooperative,
    #[serde(rename = "Sole Proprietorship")]
    SoleProprietorship,
}

impl CompanyType {
    pub const ALL: [CompanyType; 4] = [
        CompanyType::Corporations,
        CompanyType::NonProfit,
        CompanyType::Cooperative,
        CompanyType::SoleProprietorship,
    ];

    /// Wire label of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyType::Corporations => "Corporations",
            CompanyType::NonProfit => "NonProfit",
            CompanyType::Cooperative => "Cooperative",
            CompanyType::SoleProprietorship => "Sole Proprietorship",
        }
    }
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanyType {
    type Err = CompanyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompanyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CompanyError::validation(format!("unknown company type '{s}'")))
    }
}

/// Input for creating a company: every field except the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub employee_count: u32,
    pub is_registered: bool,
    #[serde(rename = "type")]
    pub company_type: CompanyType,
}

impl NewCompany {
    /// Check field constraints and normalise the name
    ///
    /// # Errors
    ///
    /// Returns `CompanyError::Validation` if the name is blank or too long,
    /// or if the description is too long
    pub fn validate(mut self) -> Result<Self, CompanyError> {
        self.name = validate_name(&self.name)?;
        validate_description(self.description.as_deref())?;
        Ok(self)
    }
}

/// A company as stored and as carried in domain events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    id: CompanyId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    employee_count: u32,
    is_registered: bool,
    #[serde(rename = "type")]
    company_type: CompanyType,
}

impl Company {
    /// Attach an assigned id to validated creation input
    pub fn from_new(id: CompanyId, new: NewCompany) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            employee_count: new.employee_count,
            is_registered: new.is_registered,
            company_type: new.company_type,
        }
    }

    /// Create a Company with explicit values (used for reconstruction from storage)
    pub fn from_parts(
        id: CompanyId,
        name: String,
        description: Option<String>,
        employee_count: u32,
        is_registered: bool,
        company_type: CompanyType,
    ) -> Self {
        Self {
            id,
            name,
            description,
            employee_count,
            is_registered,
            company_type,
        }
    }

    /// Identifier assigned at creation, never changed afterwards
    pub fn id(&self) -> &CompanyId {
        &self.id
    }

    /// Trimmed company name, unique among live companies
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description, `None` when not set or cleared
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Number of employees
    pub fn employee_count(&self) -> u32 {
        self.employee_count
    }

    /// Whether the company is officially registered
    pub fn is_registered(&self) -> bool {
        self.is_registered
    }

    /// Legal form of the company
    pub fn company_type(&self) -> CompanyType {
        self.company_type
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub(crate) fn set_employee_count(&mut self, count: u32) {
        self.employee_count = count;
    }

    pub(crate) fn set_registered(&mut self, registered: bool) {
        self.is_registered = registered;
    }

    pub(crate) fn set_company_type(&mut self, company_type: CompanyType) {
        self.company_type = company_type;
    }
}

/// Trim and bound-check a company name
pub(crate) fn validate_name(name: &str) -> Result<String, CompanyError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CompanyError::validation("name must not be empty"));
    }
    let len = trimmed.chars().count();
    if len > NAME_MAX_LEN {
        return Err(CompanyError::validation(format!(
            "name is {len} characters long, maximum is {NAME_MAX_LEN}"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_description(description: Option<&str>) -> Result<(), CompanyError> {
    if let Some(text) = description {
        let len = text.chars().count();
        if len > DESCRIPTION_MAX_LEN {
            return Err(CompanyError::validation(format!(
                "description is {len} characters long, maximum is {DESCRIPTION_MAX_LEN}"
            )));
        }
    }
    Ok(())
}
