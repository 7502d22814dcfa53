//! Loose parsing of the distance and duration hints shown on result cards
//!
//! The service localizes these ("10,5 km", "3h 20min", "1:30"), so both
//! decimal separators and a handful of unit spellings are accepted.

const KM_PER_MILE: f64 = 1.609_344;

/// Parse a distance label into kilometers
///
/// Accepts `km`, `m` and `mi` units; a bare number is taken as km.
pub fn parse_distance_km(label: &str) -> Option<f64> {
    let normalized = normalize(label);
    let start = normalized.find(|c: char| c.is_ascii_digit())?;
    let rest = &normalized[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(rest.len());
    let value: f64 = decimal_number(&rest[..end])?.parse().ok()?;
    let unit = rest[end..].trim_start();

    let km = if unit.starts_with("km") {
        value
    } else if unit.starts_with("mi") {
        value * KM_PER_MILE
    } else if unit.starts_with('m') {
        value / 1000.0
    } else {
        value
    };
    km.is_finite().then_some(km)
}

/// Parse a duration label into whole minutes
///
/// Understands `H:MM`, and sequences of number + unit where the unit
/// starts with `d` (days), `h` (hours) or `m` (minutes). A bare number is
/// taken as minutes.
pub fn parse_duration_min(label: &str) -> Option<u32> {
    let normalized = normalize(label);

    if let Some((hours, minutes)) = normalized.split_once(':') {
        if let (Ok(hours), Ok(minutes)) = (hours.trim().parse::<u32>(), minutes.trim().parse::<u32>()) {
            return hours.checked_mul(60)?.checked_add(minutes);
        }
    }

    let mut total: u32 = 0;
    let mut seen = false;
    let mut chars = normalized.chars().peekable();

    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            chars.next();
            continue;
        }

        let mut value: u32 = 0;
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            value = value.checked_mul(10)?.checked_add(d)?;
            chars.next();
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let factor = match chars.peek() {
            Some('d') => 24 * 60,
            Some('h') => 60,
            _ => 1,
        };
        total = total.checked_add(value.checked_mul(factor)?)?;
        seen = true;
    }

    seen.then_some(total)
}

/// Rewrite a localized number into `f64::from_str` form
///
/// With a `,` present, `,` is the decimal separator and `.` groups
/// thousands ("1.234,5"). Without one, several dots, or a single dot
/// followed by exactly three digits, are grouping ("1.234"); otherwise the
/// dot is decimal ("10.5").
fn decimal_number(token: &str) -> Option<String> {
    let token = token.trim_end_matches(['.', ',']);
    if token.contains(',') {
        if token.matches(',').count() > 1 {
            return None;
        }
        return Some(token.replace('.', "").replace(',', "."));
    }

    let dots = token.matches('.').count();
    let grouped = dots > 1
        || token
            .split_once('.')
            .is_some_and(|(_, frac)| frac.len() == 3);
    if grouped {
        Some(token.replace('.', ""))
    } else {
        Some(token.to_string())
    }
}

fn normalize(label: &str) -> String {
    label.replace('\u{a0}', " ").trim().to_lowercase()
}
