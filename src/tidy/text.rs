/// Upper-case the first letter of every word and lower-case the rest.
///
/// A word starts after any non-alphabetic character, so "o'higgins" becomes
/// "O'Higgins" and "LA LIBERTAD" becomes "La Libertad".
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Year from the trailing four characters of a census label ("Censo 2007").
///
/// Whatever precedes the year is not inspected.
pub fn census_year(label: &str) -> Option<u16> {
    let label = label.trim();
    let chars: Vec<char> = label.chars().collect();
    if chars.len() < 4 {
        return None;
    }
    let tail = &chars[chars.len() - 4..];
    if !tail.iter().all(|c| c.is_ascii_digit()) {
        return None;
    }
    tail.iter().collect::<String>().parse().ok()
}

/// Parse a percentage cell, accepting a decimal comma.
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', ".");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_normalizes_mixed_input() {
        assert_eq!(title_case("lima"), "Lima");
        assert_eq!(title_case("LIMA"), "Lima");
        assert_eq!(title_case("san martín"), "San Martín");
        assert_eq!(title_case("LA LIBERTAD"), "La Libertad");
        assert_eq!(title_case("madre de dios"), "Madre De Dios");
        assert_eq!(title_case("lima-callao"), "Lima-Callao");
        assert_eq!(title_case("ÁNCASH"), "Áncash");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn census_year_takes_last_four() {
        assert_eq!(census_year("Censo 2007"), Some(2007));
        assert_eq!(census_year("CPV2017"), Some(2017));
        assert_eq!(census_year("1993"), Some(1993));
        assert_eq!(census_year(" Censo 2007 "), Some(2007));
        assert_eq!(census_year("207"), None);
        assert_eq!(census_year("Censo 20O7"), None);
        assert_eq!(census_year(""), None);
    }

    #[test]
    fn percentages() {
        assert_eq!(parse_percentage("45.3"), Some(45.3));
        assert_eq!(parse_percentage(" 12,5 "), Some(12.5));
        assert_eq!(parse_percentage("n/a"), None);
        assert_eq!(parse_percentage("NaN"), None);
    }
}
