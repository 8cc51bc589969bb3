//! Branch name → filesystem-safe key.
//!
//! Every place a branch name touches the disk or the metadata map goes through
//! [`sanitize`]. `feature/login` becomes `feature-login`.

/// Characters that may not appear in a branch key. Whitespace is handled separately.
const UNSAFE_CHARS: &[char] = &[
    '/', '\\', ':', '*', '?', '"', '<', '>', '|', '~', '^', '@', '[', ']',
];

/// Replace every unsafe character and every whitespace character with `-`.
///
/// Not injective: `a/b` and `a:b` share the key `a-b`. Idempotent, since `-`
/// is never itself replaced.
pub fn sanitize(branch: &str) -> String {
    branch
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c.is_whitespace() {
                '-'
            } else {
                c
            }
        })
        .collect()
}
