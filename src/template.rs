//! PR body rendering.
//!
//! The body starts from the repository's pull request template. If the
//! repository also carries a "lyrics" side-file, its content replaces every
//! [`LYRICS_MARKER`] in the template.

use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use tracing::debug;

use crate::Config;

/// Placeholder in the PR template that is replaced by the lyrics side-file.
pub const LYRICS_MARKER: &str = "🎵 LYRICS 🎵";

/// Substitute the lyrics into a template.
///
/// Without lyrics the template comes back unchanged. The replacement is
/// literal, so characters such as `/`, `\`, `&` or `$` in the lyrics are kept
/// as they are and the inserted text is never searched for the marker again.
pub fn render_body(template: &str, lyrics: Option<&str>) -> String {
    match lyrics {
        Some(lyrics) => template.replace(LYRICS_MARKER, lyrics),
        None => template.to_string(),
    }
}

/// Read the PR template, or an empty body when templates are disabled or the
/// repository has none.
pub async fn load_template(root: &Path, config: &Config) -> Result<String> {
    if !config.template {
        return Ok(String::new());
    }
    read_optional(&root.join(&config.template_file))
        .await
        .map(Option::unwrap_or_default)
}

/// Read the lyrics side-file, without its trailing newline.
pub async fn load_lyrics(root: &Path, config: &Config) -> Result<Option<String>> {
    let lyrics = read_optional(&root.join(&config.lyrics_file)).await?;
    Ok(lyrics.map(|s| s.trim_end_matches(['\n', '\r']).to_string()))
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not found", path.display());
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}
