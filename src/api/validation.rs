use super::ApiError;

pub fn validate_entity_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid id: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_category_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation("Category name cannot be empty"));
    }

    if trimmed.len() > 60 {
        return Err(ApiError::validation(
            "Category name must be 60 characters or less",
        ));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entity_id() {
        assert!(validate_entity_id(1).is_ok());
        assert!(validate_entity_id(12345).is_ok());
        assert!(validate_entity_id(0).is_err());
        assert!(validate_entity_id(-1).is_err());
    }

    #[test]
    fn test_validate_category_name() {
        assert!(validate_category_name("Bobs").is_ok());
        assert_eq!(validate_category_name("  Lace Fronts  ").unwrap(), "Lace Fronts");
        assert!(validate_category_name("").is_err());
        assert!(validate_category_name("   ").is_err());
        assert!(validate_category_name(&"a".repeat(61)).is_err());
    }
}
