//! Human-readable employee identifiers.
//!
//! Layout: `[company][name][year][serial]`, e.g. `ACJODO20240001` for
//! John Doe joining Acme Corp in 2024. The initial password of a new
//! employee is the identifier itself.

fn upper_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).flat_map(char::to_uppercase).collect()
}

/// First two letters of the first and second name parts, or the first four
/// letters of a single-part name padded with `X`.
pub fn name_code(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();

    match parts.as_slice() {
        [first, second, ..] => format!("{}{}", upper_prefix(first, 2), upper_prefix(second, 2)),
        [only] => {
            let mut code = upper_prefix(only, 4);
            while code.chars().count() < 4 {
                code.push('X');
            }
            code
        }
        [] => String::from("XXXX"),
    }
}

pub fn id_prefix(company_name: &str, full_name: &str, year: i32) -> String {
    format!(
        "{}{}{}",
        upper_prefix(company_name.trim(), 2),
        name_code(full_name),
        year
    )
}

/// Next free serial for `prefix` given the ids already issued under it.
///
/// Uses the highest issued serial rather than a row count so that deleted
/// employees never cause an id to be handed out twice.
pub fn next_serial<S: AsRef<str>>(prefix: &str, existing: &[S]) -> u32 {
    existing
        .iter()
        .filter_map(|id| id.as_ref().strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|rest| rest.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

pub fn employee_id(prefix: &str, serial: u32) -> String {
    format!("{prefix}{serial:04}")
}

/// Escapes `%`, `_` and `\` for use in a `LIKE 'prefix%'` pattern.
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
