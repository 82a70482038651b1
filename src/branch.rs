use std::sync::LazyLock;

use regex::Regex;

/// Longest branch name we derive from a title.
pub const MAX_BRANCH_NAME_LENGTH: usize = 40;

static NON_ALNUM_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

static REF_SHAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9/-]{1,40}$").unwrap());

/// Turn free text (usually a PR title) into a git branch name.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, trims hyphens at both ends and truncates to
/// [`MAX_BRANCH_NAME_LENGTH`]. Returns an empty string when the input has no
/// ASCII alphanumerics.
pub fn encode_branch_name(input: &str) -> String {
    let lowered = input.to_lowercase();
    let hyphenated = NON_ALNUM_RUN.replace_all(&lowered, "-");
    let trimmed = hyphenated.trim_matches('-');
    // Only ASCII survives the substitution, so byte truncation is safe.
    let truncated = &trimmed[..MAX_BRANCH_NAME_LENGTH.min(trimmed.len())];
    truncated.trim_end_matches('-').to_string()
}

/// Whether a positional argument has the shape of a branch name rather than a
/// title: lowercase alphanumerics, hyphens and slashes, at most 40 chars.
pub fn looks_like_branch_name(arg: &str) -> bool {
    REF_SHAPE.is_match(arg)
}
