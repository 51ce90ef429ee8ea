//! Submission validation before anything touches the disk.

use super::record::SubmissionRecord;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Contributor {0} is required")]
    MissingField(&'static str),

    #[error("Consent to use the data for open-source AI research is required")]
    MissingConsent,

    #[error("Image is empty (no bytes)")]
    EmptyImage,

    #[error("Image too large: {0} bytes exceeds maximum {1} bytes")]
    ImageTooLarge(usize, usize),

    #[error("Invalid {0}: {1} (must be between -{2} and {2})")]
    CoordinateOutOfRange(&'static str, f64, f64),
}

/// Validate a submission and its image.
///
/// Checks for:
/// - Empty contributor name, email or location
/// - Missing consent
/// - Empty or oversized image
/// - Coordinates that are not finite or out of range
pub fn validate_submission(
    record: &SubmissionRecord,
    image: &[u8],
    max_image_bytes: usize,
) -> Result<(), ValidationError> {
    let contributor = &record.contributor;
    for (field, value) in [
        ("name", &contributor.name),
        ("email", &contributor.email),
        ("location", &contributor.location),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }

    if !record.consent {
        return Err(ValidationError::MissingConsent);
    }

    if image.is_empty() {
        return Err(ValidationError::EmptyImage);
    }

    if image.len() > max_image_bytes {
        return Err(ValidationError::ImageTooLarge(image.len(), max_image_bytes));
    }

    check_coordinate("latitude", record.latitude, 90.0)?;
    check_coordinate("longitude", record.longitude, 180.0)?;

    Ok(())
}

fn check_coordinate(name: &'static str, value: f64, limit: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value.abs() > limit {
        return Err(ValidationError::CoordinateOutOfRange(name, value, limit));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::record::Contributor;

    fn valid_record() -> SubmissionRecord {
        SubmissionRecord {
            contributor: Contributor {
                name: "A".into(),
                email: "a@x.com".into(),
                location: "City".into(),
            },
            consent: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_submission() {
        assert!(validate_submission(&valid_record(), &[1, 2, 3], 1024).is_ok());
    }

    #[test]
    fn test_missing_contributor_fields() {
        let mut record = valid_record();
        record.contributor.name = "  ".into();
        assert_eq!(
            validate_submission(&record, &[1], 1024),
            Err(ValidationError::MissingField("name"))
        );

        let mut record = valid_record();
        record.contributor.email.clear();
        assert_eq!(
            validate_submission(&record, &[1], 1024),
            Err(ValidationError::MissingField("email"))
        );

        let mut record = valid_record();
        record.contributor.location.clear();
        let err = validate_submission(&record, &[1], 1024).unwrap_err();
        assert!(err.to_string().contains("location"));
    }

    #[test]
    fn test_consent_required() {
        let mut record = valid_record();
        record.consent = false;
        assert_eq!(
            validate_submission(&record, &[1], 1024),
            Err(ValidationError::MissingConsent)
        );
    }

    #[test]
    fn test_image_checks() {
        assert_eq!(
            validate_submission(&valid_record(), &[], 1024),
            Err(ValidationError::EmptyImage)
        );
        assert_eq!(
            validate_submission(&valid_record(), &[0; 11], 10),
            Err(ValidationError::ImageTooLarge(11, 10))
        );
    }

    #[test]
    fn test_coordinates() {
        let mut record = valid_record();
        record.latitude = 91.0;
        assert!(matches!(
            validate_submission(&record, &[1], 1024),
            Err(ValidationError::CoordinateOutOfRange("latitude", _, _))
        ));

        let mut record = valid_record();
        record.longitude = f64::NAN;
        assert!(matches!(
            validate_submission(&record, &[1], 1024),
            Err(ValidationError::CoordinateOutOfRange("longitude", _, _))
        ));

        let mut record = valid_record();
        record.latitude = -90.0;
        record.longitude = 180.0;
        assert!(validate_submission(&record, &[1], 1024).is_ok());
    }
}
