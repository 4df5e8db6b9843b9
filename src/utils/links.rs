use url::Url;

use crate::config::QUERY_PLACEHOLDER;

pub fn build_search_url(base_url: &str, search_path: &str, keyword: &str) -> String {
    let encoded = urlencoding::encode(keyword);
    let path = search_path.replace(QUERY_PLACEHOLDER, &encoded);
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = if let Some(rest) = href.strip_prefix("//") {
        Url::parse(&format!("https://{}", rest)).ok()?
    } else {
        base.join(href).ok()?
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
