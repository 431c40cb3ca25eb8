//! Normalization of the `gauge_name` attribute into `"Place Name, ST"` form.

/// Title-cases `text` the way Python's `str.title` does: a letter is
/// upper-cased when the previous character is not a letter, lower-cased
/// otherwise.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}

/// Rewrites a raw USGS gauge name such as `"blacksburg va"` into
/// `"Blacksburg, VA"`.
///
/// The trailing token (after the last space) is treated as the state: its
/// periods are removed and it is upper-cased when exactly two characters
/// long. The remainder gets a trailing comma unless it already has one.
///
/// ```
/// use camels_convert::readers::gauge_name::normalize_gauge_name;
///
/// assert_eq!(normalize_gauge_name("st. johns fl"), "St. Johns, FL");
/// assert_eq!(normalize_gauge_name("mill creek at n.y."), "Mill Creek At, NY");
/// ```
pub fn normalize_gauge_name(raw: &str) -> String {
    let titled = title_case(raw);
    let Some((head, tail)) = titled.rsplit_once(' ') else {
        return titled;
    };

    let state: String = tail.chars().filter(|&c| c != '.').collect();
    let state = if state.chars().count() == 2 {
        state.to_uppercase()
    } else {
        title_case(&state)
    };
    let separator = if head.ends_with(',') { "" } else { "," };
    format!("{head}{separator} {state}")
}
