//! `$(name)` variable expansion in command words.

/// Replace every `$(name)` in `input` with `mapping(name)`.
///
/// An unterminated `$(` or an empty `$()` is kept verbatim.
pub fn expand<F>(input: &str, mapping: F) -> String
where
    F: Fn(&str) -> String,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("$(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find(')') {
            Some(end) if end > 0 => {
                out.push_str(&mapping(&after[..end]));
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str("$(");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
