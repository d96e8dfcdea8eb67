//! Human-shareable join codes for groups.
//!
//! A join code looks like `GRT-4821`: an uppercase prefix, a dash, and a
//! four digit number in `1000..=9999`.

use rand::Rng;

/// Smallest numeric part of a join code.
pub const CODE_NUMBER_MIN: u16 = 1000;

/// Largest numeric part of a join code.
pub const CODE_NUMBER_MAX: u16 = 9999;

/// Number of distinct codes available per prefix.
pub const CODE_SPACE: usize = (CODE_NUMBER_MAX - CODE_NUMBER_MIN + 1) as usize;

lazy_static::lazy_static! {
    static ref JOIN_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z]{2,8}-[1-9][0-9]{3}$").unwrap();
    static ref CODE_PREFIX_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z]{2,8}$").unwrap();
}

/// Generate a random join code with the given prefix.
pub fn generate_join_code(prefix: &str) -> String {
    join_code(prefix, rand::thread_rng().gen_range(CODE_NUMBER_MIN..=CODE_NUMBER_MAX))
}

/// Builds the code with the given number.
pub fn join_code(prefix: &str, number: u16) -> String {
    format!("{}-{}", prefix, number)
}

/// Every code of a prefix exactly once, starting at a random number and
/// wrapping around.
pub fn all_join_codes(prefix: &str) -> impl Iterator<Item = String> + '_ {
    let offset = rand::thread_rng().gen_range(0..CODE_SPACE);
    (0..CODE_SPACE).map(move |i| {
        let number = CODE_NUMBER_MIN + ((offset + i) % CODE_SPACE) as u16;
        join_code(prefix, number)
    })
}

/// Returns true if `code` has the `PREFIX-NNNN` shape.
pub fn is_join_code(code: &str) -> bool {
    JOIN_CODE_REGEX.is_match(code)
}

/// Returns true if `prefix` can be used to build join codes.
pub fn is_code_prefix(prefix: &str) -> bool {
    CODE_PREFIX_REGEX.is_match(prefix)
}

/// Normalizes user-typed codes, so ` grt-1234 ` becomes `GRT-1234`.
pub fn normalize_join_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
