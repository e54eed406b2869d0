use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::{AppError, AppResult};

/// Decodes an optional base64 image field. Blank strings count as absent.
pub fn decode_image(field: &str, raw: Option<&str>) -> AppResult<Option<Vec<u8>>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(encoded) => STANDARD
            .decode(encoded)
            .map(Some)
            .map_err(|_| AppError::validation(format!("Invalid base64 data for {field}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_blank_is_none() {
        assert_eq!(decode_image("logo", None).unwrap(), None);
        assert_eq!(decode_image("logo", Some("  ")).unwrap(), None);
    }

    #[test]
    fn valid_base64_is_decoded() {
        assert_eq!(decode_image("logo", Some("aGk=")).unwrap(), Some(b"hi".to_vec()));
    }

    #[test]
    fn garbage_names_the_field() {
        let err = decode_image("prof_pic", Some("not base64!")).unwrap_err();
        assert!(err.to_string().contains("prof_pic"));
    }
}
