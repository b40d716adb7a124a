//! Validation matrix for generation requests

use artforge::request::{validate, GenerationRequest, ValidationError};
use artforge::ImageFormat;

fn request(prompt: &str, model: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt.to_string(),
        model: model.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_unknown_models_rejected() {
    for model in ["0", "4999", "10000", "flux", "8000x", "sd3.5"] {
        let result = validate(&request("a cat", model));
        assert!(
            matches!(result, Err(ValidationError::UnknownModel(_))),
            "model {model} should be rejected"
        );
    }
}

#[test]
fn test_known_models_accepted() {
    for model in ["5000", "6000", "7000", "8000", "9000"] {
        assert!(validate(&request("a cat", model)).is_ok());
    }
}

#[test]
fn test_vector_format_only_for_vector_model() {
    for model in ["5000", "6000", "7000", "9000"] {
        let mut req = request("a landscape", model);
        req.format = Some("vector".to_string());
        assert!(
            matches!(
                validate(&req),
                Err(ValidationError::IncompatibleFormat { .. })
            ),
            "vector format should be rejected for model {model}"
        );
    }
}

#[test]
fn test_vector_model_defaults_to_svg() {
    let validated = validate(&request("A minimalist tech logo", "8000")).unwrap();
    assert_eq!(validated.format, ImageFormat::Svg);
}

#[test]
fn test_raster_model_defaults_to_png() {
    let validated = validate(&request("A landscape", "5000")).unwrap();
    assert_eq!(validated.format, ImageFormat::Png);
}

#[test]
fn test_count_bounds() {
    for count in [0_u32, 11, 255] {
        let mut req = request("a cat", "5000");
        req.count = count;
        assert!(validate(&req).is_err(), "count {count} should be rejected");
    }
    for count in 1..=10 {
        let mut req = request("a cat", "5000");
        req.count = count;
        assert!(validate(&req).is_ok(), "count {count} should be accepted");
    }
}

#[test]
fn test_labeled_model_id_truncated() {
    let validated = validate(&request("a logo", "8000:Recraft-Vector")).unwrap();
    assert_eq!(validated.model.id, "8000");
    assert_eq!(validated.model.display_name, "Recraft-Vector");
}

#[test]
fn test_labeled_unknown_id_still_rejected() {
    let result = validate(&request("a logo", "1234:SomeLabel"));
    assert!(matches!(result, Err(ValidationError::UnknownModel(_))));
}

#[test]
fn test_explicit_formats_parsed() {
    for (raw, expected) in [
        ("png", ImageFormat::Png),
        ("jpg", ImageFormat::Jpeg),
        ("jpeg", ImageFormat::Jpeg),
        ("webp", ImageFormat::Webp),
    ] {
        let mut req = request("a cat", "5000");
        req.format = Some(raw.to_string());
        assert_eq!(validate(&req).unwrap().format, expected);
    }
}
