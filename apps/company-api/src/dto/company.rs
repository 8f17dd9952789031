//! DTOs for company endpoints

use company_domain::company::{Company, CompanyId, CompanyType, NewCompany};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating a company
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCompanyRequest {
    /// Unique company name, at most 128 characters
    #[schema(example = "Acme")]
    pub name: String,
    /// Free-text description, at most 3000 characters
    #[serde(default)]
    #[schema(example = "Makes everything")]
    pub description: Option<String>,
    #[schema(example = 10)]
    pub employee_count: u32,
    #[schema(example = true)]
    pub is_registered: bool,
    /// One of "Corporations", "NonProfit", "Cooperative", "Sole Proprietorship"
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "NonProfit")]
    pub company_type: CompanyType,
}

impl From<CreateCompanyRequest> for NewCompany {
    fn from(request: CreateCompanyRequest) -> Self {
        NewCompany {
            name: request.name,
            description: request.description,
            employee_count: request.employee_count,
            is_registered: request.is_registered,
            company_type: request.company_type,
        }
    }
}

/// Request body for a partial update, as documented in the OpenAPI schema
///
/// Absent fields are left unchanged. `description: null` clears the
/// description; `null` on any other field is rejected. The handler reads the
/// body as a JSON object and parses it with `CompanyPatch::from_json`, so this
/// type only describes the accepted shape.
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyRequest {
    #[schema(example = "Acme Holdings")]
    pub name: Option<String>,
    #[schema(nullable)]
    pub description: Option<String>,
    #[schema(example = 20)]
    pub employee_count: Option<u32>,
    pub is_registered: Option<bool>,
    #[serde(rename = "type")]
    #[schema(value_type = Option<String>, example = "Cooperative")]
    pub company_type: Option<CompanyType>,
}

/// A stored company
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    #[schema(value_type = String, format = Uuid, example = "01928c4e-7b3a-7cc0-9f1e-2d4b5a6c7e8f")]
    pub id: CompanyId,
    #[schema(example = "Acme")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[schema(example = 10)]
    pub employee_count: u32,
    pub is_registered: bool,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "NonProfit")]
    pub company_type: CompanyType,
}

impl From<&Company> for CompanyResponse {
    fn from(company: &Company) -> Self {
        Self {
            id: *company.id(),
            name: company.name().to_string(),
            description: company.description().map(str::to_string),
            employee_count: company.employee_count(),
            is_registered: company.is_registered(),
            company_type: company.company_type(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error description
    #[schema(example = "Company name 'Acme' is already taken")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_uses_wire_names() {
        let request: CreateCompanyRequest = serde_json::from_value(json!({
            "name": "Acme",
            "employeeCount": 10,
            "isRegistered": true,
            "type": "Sole Proprietorship"
        }))
        .unwrap();

        let new = NewCompany::from(request);
        assert_eq!(new.name, "Acme");
        assert_eq!(new.description, None);
        assert_eq!(new.company_type, CompanyType::SoleProprietorship);
    }

    #[test]
    fn test_create_request_rejects_client_id() {
        let result = serde_json::from_value::<CreateCompanyRequest>(json!({
            "id": "01928c4e-7b3a-7cc0-9f1e-2d4b5a6c7e8f",
            "name": "Acme",
            "employeeCount": 10,
            "isRegistered": true,
            "type": "NonProfit"
        }));
        assert!(result.is_err());
    }
}
