//! Phone number validation and normalization.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ItemError;

/// Ten ASCII digits grouped 3-3-4, with an optional balanced pair of
/// parentheses around the area code and `-`, `.` or space between groups.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\((?P<paren_area>[0-9]{3})\)|(?P<area>[0-9]{3}))[-. ]?(?P<exchange>[0-9]{3})[-. ]?(?P<line>[0-9]{4})$",
    )
    .expect("phone pattern is valid")
});

/// Normalize `raw` to `(NNN) NNN-NNNN`.
pub fn normalize_phone_number(raw: &str) -> Result<String, ItemError> {
    let trimmed = raw.trim();
    let caps = PHONE_PATTERN.captures(trimmed).ok_or_else(|| {
        ItemError::validation(
            "phone number",
            format!("{raw} is not a 10 digit phone number"),
        )
    })?;
    let area = caps
        .name("paren_area")
        .or_else(|| caps.name("area"))
        .map_or("", |m| m.as_str());
    Ok(format!("({area}) {}-{}", &caps["exchange"], &caps["line"]))
}
