use anyhow::{Context, Result};
use reqwest::Url;

/// Open a share link in the user's default browser
///
/// # Errors
/// Returns error if the URL isn't http(s) or no browser can be opened
pub fn open_url(url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Refusing to open non-web URL: {}", url);
    }
    webbrowser::open(url.as_str())
        .with_context(|| format!("Failed to open browser for URL: {}", url))?;
    tracing::debug!(%url, "opened browser");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_web_scheme() {
        let url = Url::parse("file:///etc/passwd").unwrap();
        assert!(open_url(&url).is_err());
    }
}
