//! Validation Utilities

use validator::{Validate, ValidationErrors};

use super::error::{AppError, FieldError};

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();

    // HashMap iteration order is unstable
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));
    // Several rules on one field may share a message
    field_errors.dedup();

    AppError::InvalidFields(field_errors)
}

/// Run `validator` checks on a request body.
pub fn validate<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(validation_error)
}

/// Reject empty or whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(range(min = 5, message = "Too short"))]
        minutes: i32,
    }

    #[test]
    fn test_validation_error_collects_fields_sorted() {
        let form = Form {
            name: String::new(),
            minutes: 1,
        };

        let err = validate(&form).unwrap_err();
        match err {
            AppError::InvalidFields(fields) => {
                assert_eq!(
                    fields,
                    vec![
                        FieldError {
                            field: "minutes".into(),
                            message: "Too short".into()
                        },
                        FieldError {
                            field: "name".into(),
                            message: "Name is required".into()
                        },
                    ]
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Hair").is_ok());
        assert!(not_blank("   ").is_err());
    }
}
