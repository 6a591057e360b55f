//! US state jurisdictions (postal code and name)

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// All 50 US states in alphabetical order of name
pub const US_STATES: [(&str, &str); 50] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

static BY_CODE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| US_STATES.iter().copied().collect());

/// Normalize user input to an upper-case postal code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Full state name for a postal code (case-insensitive)
pub fn state_name(code: &str) -> Option<&'static str> {
    BY_CODE.get(normalize_code(code).as_str()).copied()
}

pub fn is_known_state(code: &str) -> bool {
    state_name(code).is_some()
}

/// State name, falling back to the code itself for unknown jurisdictions
pub fn display_name(code: &str) -> String {
    state_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| normalize_code(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(state_name("tx"), Some("Texas"));
        assert_eq!(state_name(" NM "), Some("New Mexico"));
        assert_eq!(state_name("DC"), None);
    }

    #[test]
    fn test_codes_are_unique() {
        assert_eq!(BY_CODE.len(), US_STATES.len());
    }

    #[test]
    fn test_display_name_falls_back_to_code() {
        assert_eq!(display_name("az"), "Arizona");
        assert_eq!(display_name("pr"), "PR");
    }
}
