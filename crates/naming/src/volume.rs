use crate::consts::VOLUME_NUMBER_REGEX;

/// Normalize a free-form volume marker to the canonical `vol_NN[.N]` shape.
///
/// The first run of digits is taken as the volume number: leading zeros are
/// stripped, the result is zero-padded to two digits and a fractional part is
/// kept verbatim. Text without any digits is returned trimmed and otherwise
/// untouched, so this never fails.
///
/// ```rust
/// use hardbound_naming::normalize_volume;
/// assert_eq!(normalize_volume("vol.13"), "vol_13");
/// assert_eq!(normalize_volume("5"), "vol_05");
/// assert_eq!(normalize_volume("vol_13.5"), "vol_13.5");
/// assert_eq!(normalize_volume("special"), "special");
/// ```
pub fn normalize_volume(text: impl AsRef<str>) -> String {
    let text = text.as_ref().trim();
    let Some(captures) = VOLUME_NUMBER_REGEX.captures(text) else {
        return text.to_string();
    };
    let integer = captures[1].trim_start_matches('0');
    let integer = match integer.is_empty() {
        true => "0",
        false => integer,
    };
    match captures.get(2) {
        Some(fraction) => format!("vol_{integer:0>2}.{}", fraction.as_str()),
        None => format!("vol_{integer:0>2}"),
    }
}
