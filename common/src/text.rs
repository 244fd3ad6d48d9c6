/// Converts a CamelCase name into UPPER_SNAKE_CASE.
///
/// An underscore is inserted between a lowercase letter or digit and a
/// following uppercase letter, and between two consecutive uppercase letters,
/// so acronyms are spelled out letter by letter.
pub fn to_upper_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;

    for ch in name.chars() {
        if let Some(p) = prev {
            let boundary = ch.is_uppercase()
                && (p.is_lowercase() || p.is_ascii_digit() || p.is_uppercase());
            if boundary {
                out.push('_');
            }
        }
        out.extend(ch.to_uppercase());
        prev = Some(ch);
    }

    out
}
