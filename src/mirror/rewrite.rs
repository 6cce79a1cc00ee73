//! In-place rewriting of rendered markup
//!
//! Every captured resource's original URL is replaced with a path relative
//! to the page's own local HTML file. Substitution is literal and textual,
//! not DOM-attribute-aware: a deliberate simplification kept as the
//! baseline behavior. It can touch a URL that also appears in plain text or
//! inline scripts, and that is accepted.

use std::path::{Component, Path, PathBuf};

/// Rewrites page markup so captured resource references point at the mirror
///
/// Rules are applied longest-URL-first so a URL that is a prefix of another
/// (e.g. `main.css` vs `main.css.map`) is never clobbered by a shorter
/// substitution.
///
/// # Arguments
///
/// * `html` - The rendered markup
/// * `page_path` - The local path the page will be saved at
/// * `rules` - (original URL, resource local path) pairs from the store
pub fn rewrite_page(html: &str, page_path: &Path, rules: &[(String, PathBuf)]) -> String {
    let page_dir = page_path.parent().unwrap_or_else(|| Path::new(""));

    let mut ordered: Vec<&(String, PathBuf)> = rules.iter().collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    let mut content = html.to_string();
    for (original_url, local_path) in ordered {
        let relative = relative_path(page_dir, local_path);
        // Markup always uses forward slashes, whatever the platform
        let replacement = relative.to_string_lossy().replace('\\', "/");
        content = content.replace(original_url.as_str(), &replacement);
    }

    content
}

/// Computes the relative path from a directory to a target file
///
/// Both paths must be either absolute or rooted at the same base (the
/// mapper produces both from the same output root, so this holds).
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from_dir.components().collect();
    let to: Vec<Component> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &to[common..] {
        rel.push(component.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_sibling_subdir() {
        let rel = relative_path(
            Path::new("out/kinsu.mx/faq"),
            Path::new("out/kinsu.mx/static/css/main.css"),
        );
        assert_eq!(rel, PathBuf::from("../static/css/main.css"));
    }

    #[test]
    fn test_relative_path_same_dir() {
        let rel = relative_path(
            Path::new("out/kinsu.mx"),
            Path::new("out/kinsu.mx/static/js/app.js"),
        );
        assert_eq!(rel, PathBuf::from("static/js/app.js"));
    }

    #[test]
    fn test_relative_path_identical() {
        let rel = relative_path(Path::new("out/kinsu.mx"), Path::new("out/kinsu.mx"));
        assert_eq!(rel, PathBuf::from("."));
    }

    #[test]
    fn test_rewrite_replaces_all_occurrences() {
        let rules = vec![(
            "https://kinsu.mx/static/css/main.css".to_string(),
            PathBuf::from("out/kinsu.mx/static/css/main.css"),
        )];
        let html = r#"<link href="https://kinsu.mx/static/css/main.css">
            <a href="https://kinsu.mx/static/css/main.css">estilos</a>"#;

        let rewritten = rewrite_page(html, Path::new("out/kinsu.mx/faq/index.html"), &rules);
        assert!(!rewritten.contains("https://kinsu.mx/static/css/main.css"));
        assert_eq!(rewritten.matches("../static/css/main.css").count(), 2);
    }

    #[test]
    fn test_rewrite_is_relative_to_each_page() {
        let rules = vec![(
            "https://cdn.example.com/font.woff2".to_string(),
            PathBuf::from("out/kinsu.mx/static/media/font.woff2"),
        )];
        let html = r#"src: url(https://cdn.example.com/font.woff2);"#;

        let from_root = rewrite_page(html, Path::new("out/kinsu.mx/index.html"), &rules);
        assert!(from_root.contains("url(static/media/font.woff2)"));

        let from_faq = rewrite_page(html, Path::new("out/kinsu.mx/faq/index.html"), &rules);
        assert!(from_faq.contains("url(../static/media/font.woff2)"));
    }

    #[test]
    fn test_longer_url_substituted_first() {
        let rules = vec![
            (
                "https://kinsu.mx/static/css/main.css".to_string(),
                PathBuf::from("out/kinsu.mx/static/css/main.css"),
            ),
            (
                "https://kinsu.mx/static/css/main.css.map".to_string(),
                PathBuf::from("out/kinsu.mx/static/other/main.css.map"),
            ),
        ];
        let html = "https://kinsu.mx/static/css/main.css.map";

        let rewritten = rewrite_page(html, Path::new("out/kinsu.mx/index.html"), &rules);
        assert_eq!(rewritten, "static/other/main.css.map");
    }

    #[test]
    fn test_no_rules_leaves_markup_untouched() {
        let html = "<html><body>hola</body></html>";
        let rewritten = rewrite_page(html, Path::new("out/kinsu.mx/index.html"), &[]);
        assert_eq!(rewritten, html);
    }
}
