#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{schema::Schema, PathItemType, RefOr};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components are generated");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            other => panic!("{} should be an object schema, got {:?}", name, other),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        for name in ["ErrorResponse", "HealthResponse", "BudgetResponse", "DashboardResponse"] {
            assert!(components.schemas.contains_key(name), "missing schema {}", name);
        }
        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["error", "code", "success"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let properties = object_properties("HealthResponse");
        for field in ["status", "version", "database", "currency"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_transaction_type_uses_wire_name() {
        let properties = object_properties("TransactionResponse");
        assert!(properties.iter().any(|p| p == "type"));
        assert!(!properties.iter().any(|p| p == "kind"));
    }

    #[test]
    fn test_every_route_is_documented() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", PathItemType::Get),
            ("/api/v1/users", PathItemType::Post),
            ("/api/v1/users/{user_id}", PathItemType::Get),
            ("/api/v1/users/{user_id}/categories", PathItemType::Post),
            ("/api/v1/users/{user_id}/categories/{category_id}", PathItemType::Delete),
            ("/api/v1/users/{user_id}/transactions", PathItemType::Get),
            ("/api/v1/users/{user_id}/transactions/{transaction_id}", PathItemType::Put),
            ("/api/v1/users/{user_id}/budgets", PathItemType::Post),
            ("/api/v1/users/{user_id}/budgets/{budget_id}", PathItemType::Get),
            ("/api/v1/users/{user_id}/notifications", PathItemType::Get),
            ("/api/v1/users/{user_id}/notifications/read-all", PathItemType::Put),
            ("/api/v1/users/{user_id}/notifications/{notification_id}/read", PathItemType::Put),
            ("/api/v1/users/{user_id}/notifications/{notification_id}", PathItemType::Delete),
            ("/api/v1/users/{user_id}/dashboard", PathItemType::Get),
            ("/api/v1/users/{user_id}/reports/totals", PathItemType::Get),
            ("/api/v1/users/{user_id}/reports/category-breakdown", PathItemType::Get),
            ("/api/v1/users/{user_id}/reports/monthly", PathItemType::Get),
            ("/api/v1/users/{user_id}/reports/daily", PathItemType::Get),
        ];

        for (path, method) in expected {
            let item = paths
                .get(path)
                .unwrap_or_else(|| panic!("path {} is not documented", path));
            assert!(
                item.operations.contains_key(&method),
                "{:?} {} is not documented",
                method,
                path
            );
        }
    }

    #[test]
    fn test_error_responses_reference_correct_schema() {
        let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
