//! Image description: explicit comments first, otherwise a sentence built
//! from camera settings.

/// Everything an image can contribute to its description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescriptionInputs {
    /// JPEG COM segment.
    pub comment: Option<String>,
    /// EXIF `UserComment`, character-code prefix already removed.
    pub user_comment: Option<String>,
    pub camera_model: Option<String>,
    pub flash: Option<String>,
    pub focal_length: Option<String>,
    pub focal_length_35mm: Option<String>,
}

/// Pick the description for an image, or `None` when nothing applies.
pub fn resolve_description(inputs: &DescriptionInputs) -> Option<String> {
    present(&inputs.comment)
        .or_else(|| present(&inputs.user_comment))
        .map(str::to_string)
        .or_else(|| compose_description(inputs))
}

/// Join the camera clauses that are present.
pub fn compose_description(inputs: &DescriptionInputs) -> Option<String> {
    let mut out = String::new();

    if let Some(model) = present(&inputs.camera_model) {
        out.push_str("Taken with ");
        out.push_str(model);
    }

    if let Some(flash) = present(&inputs.flash) {
        if out.is_empty() {
            out.push_str("Flash setting: ");
        } else {
            out.push_str(", Flash setting:");
        }
        out.push_str(flash);
    }

    if let Some(focal) = present(&inputs.focal_length) {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str("Focal length: ");
        out.push_str(focal);
        if let Some(eq) = present(&inputs.focal_length_35mm) {
            out.push_str(" (35 mm equivalent: ");
            out.push_str(eq);
            out.push(')');
        }
    }

    if out.is_empty() { None } else { Some(out) }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(text: &str) -> Option<String> {
        Some(text.to_string())
    }

    #[test]
    fn camera_model_alone() {
        let inputs = DescriptionInputs {
            camera_model: some("X100"),
            ..Default::default()
        };
        assert_eq!(compose_description(&inputs).as_deref(), Some("Taken with X100"));
    }

    #[test]
    fn all_clauses_joined() {
        let inputs = DescriptionInputs {
            camera_model: some("X100"),
            flash: some("fired"),
            focal_length: some("23 mm"),
            focal_length_35mm: some("35 mm"),
            ..Default::default()
        };
        let expected = concat!(
            "Taken with X100, Flash setting:fired, ",
            "Focal length: 23 mm (35 mm equivalent: 35 mm)"
        );
        assert_eq!(compose_description(&inputs).as_deref(), Some(expected));
    }

    #[test]
    fn leading_clauses_have_no_separator() {
        let flash_only = DescriptionInputs {
            flash: some("not fired"),
            ..Default::default()
        };
        assert_eq!(
            compose_description(&flash_only).as_deref(),
            Some("Flash setting: not fired")
        );

        let focal_only = DescriptionInputs {
            focal_length: some("50 mm"),
            ..Default::default()
        };
        assert_eq!(
            compose_description(&focal_only).as_deref(),
            Some("Focal length: 50 mm")
        );
    }

    #[test]
    fn equivalent_focal_length_alone_is_ignored() {
        let inputs = DescriptionInputs {
            focal_length_35mm: some("35 mm"),
            ..Default::default()
        };
        assert_eq!(compose_description(&inputs), None);
        assert_eq!(resolve_description(&DescriptionInputs::default()), None);
    }

    #[test]
    fn comments_outrank_composition() {
        let mut inputs = DescriptionInputs {
            comment: some("Harbour at dusk"),
            user_comment: some("from exif"),
            camera_model: some("X100"),
            ..Default::default()
        };
        assert_eq!(resolve_description(&inputs).as_deref(), Some("Harbour at dusk"));

        inputs.comment = some("   ");
        assert_eq!(resolve_description(&inputs).as_deref(), Some("from exif"));

        inputs.user_comment = None;
        assert_eq!(resolve_description(&inputs).as_deref(), Some("Taken with X100"));
    }
}
