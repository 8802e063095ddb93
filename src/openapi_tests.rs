#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::OpenApi;
    use utoipa::openapi::{PathItemType, RefOr, schema::Schema, security::SecurityScheme};

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

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();
        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("HealthResponse"));
        assert!(components.schemas.contains_key("RegisterUserRequest"));
        assert!(components.schemas.contains_key("InstallmentResponse"));

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["detail", "code", "success"] {
            assert!(properties.contains(&field.to_string()), "missing {}", field);
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let properties = object_properties("HealthResponse");
        for field in ["status", "version", "database"] {
            assert!(properties.contains(&field.to_string()), "missing {}", field);
        }
    }

    #[test]
    fn test_openapi_paths_contain_health_endpoint() {
        let openapi = ApiDoc::openapi();

        let health_path = openapi.paths.paths.get("/health").expect("/health documented");
        let health_get = health_path
            .operations
            .get(&PathItemType::Get)
            .expect("GET /health documented");

        assert!(health_get.responses.responses.contains_key("200"));
        assert!(health_get.responses.responses.contains_key("500"));
        assert!(health_get.security.is_none());
    }

    #[test]
    fn test_bearer_scheme_is_registered() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        match components.security_schemes.get("bearer_auth") {
            Some(SecurityScheme::Http(_)) => {}
            other => panic!("bearer_auth should be an http scheme, got {:?}", other),
        }
    }

    #[test]
    fn test_protected_routes_are_documented() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/api/v1/users", PathItemType::Post),
            ("/api/v1/users", PathItemType::Get),
            ("/api/v1/users/{user_id}", PathItemType::Delete),
            ("/api/v1/users/{user_id}/details", PathItemType::Patch),
            ("/api/v1/orientations/search", PathItemType::Post),
            ("/api/v1/subjects/{subject_id}", PathItemType::Put),
            ("/api/v1/enrollments", PathItemType::Delete),
            ("/api/v1/installments/{installment_id}", PathItemType::Get),
            ("/api/v1/payments", PathItemType::Post),
            ("/api/v1/payments/{payment_id}", PathItemType::Patch),
            ("/api/v1/notifications/reminders", PathItemType::Post),
        ];
        for (path, method) in expected {
            let item = paths.get(path).unwrap_or_else(|| panic!("{} not documented", path));
            let operation = item
                .operations
                .get(&method)
                .unwrap_or_else(|| panic!("{:?} {} not documented", method, path));
            assert!(operation.security.is_some(), "{} should require a token", path);
            assert!(operation.responses.responses.contains_key("401"));
        }
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
