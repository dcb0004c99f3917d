//! Small helpers shared by journey definitions.

use std::{collections::HashMap, fmt::Display};

/// Replace every `{key}` placeholder in `template` whose key is present in `params`.
///
/// Keys consist of ASCII alphanumerics and underscores. Placeholders without a matching
/// parameter are left untouched.
///
/// ```
/// use std::collections::HashMap;
///
/// let params = HashMap::from([("user", "alice")]);
/// assert_eq!(
///     aic_core::utils::string_builder("Hello {user}, {greeting}", &params),
///     "Hello alice, {greeting}"
/// );
/// ```
pub fn string_builder<V: Display>(template: &str, params: &HashMap<&str, V>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (before, after_open) = rest.split_at(open);
        out.push_str(before);

        let candidate = &after_open[1..];
        let key_len = candidate
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(candidate.len());
        let key = &candidate[..key_len];

        if key_len > 0 && candidate[key_len..].starts_with('}') {
            match params.get(key) {
                Some(value) => out.push_str(&value.to_string()),
                None => {
                    out.push('{');
                    out.push_str(key);
                    out.push('}');
                }
            }
            rest = &candidate[key_len + 1..];
        } else {
            out.push('{');
            rest = candidate;
        }
    }

    out.push_str(rest);
    out
}
