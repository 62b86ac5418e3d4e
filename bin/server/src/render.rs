//! Profile rendering for `/userinfo`.
//!
//! JSON for API clients, an HTML fragment for everything else (the landing
//! page swaps it in with HTMX).

use axum::{
    Json,
    http::{HeaderMap, header::ACCEPT},
    response::{Html, IntoResponse, Response},
};
use porthole_relying_party::UserProfile;

/// Response format negotiated from the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    Json,
    Html,
}

impl ProfileFormat {
    /// Picks JSON only when the client asks for it explicitly.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let wants_json = headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(|media| media.split(';').next().unwrap_or_default().trim())
            .any(|media| media.eq_ignore_ascii_case("application/json"));

        if wants_json { Self::Json } else { Self::Html }
    }
}

/// Renders `profile` in the requested format.
pub fn profile(profile: UserProfile, format: ProfileFormat) -> Response {
    match format {
        ProfileFormat::Json => Json(profile).into_response(),
        ProfileFormat::Html => Html(profile_fragment(&profile)).into_response(),
    }
}

fn profile_fragment(profile: &UserProfile) -> String {
    let mut fragment = format!("<p>Subject: {}</p>\n", escape_html(&profile.subject));
    if let Some(name) = &profile.display_name {
        fragment.push_str(&format!("<p>Name: {}</p>\n", escape_html(name)));
    }
    fragment.push_str(&format!(
        "<p>Email: {}</p>\n",
        escape_html(profile.email.as_deref().unwrap_or_default())
    ));
    fragment
}

/// Escapes the five HTML-special characters.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(ch),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(accept: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_str(accept).expect("valid header"));
        headers
    }

    #[test]
    fn negotiates_format_from_accept() {
        assert_eq!(
            ProfileFormat::from_headers(&headers("application/json")),
            ProfileFormat::Json
        );
        assert_eq!(
            ProfileFormat::from_headers(&headers("text/html, application/json;q=0.9")),
            ProfileFormat::Json
        );
        assert_eq!(
            ProfileFormat::from_headers(&headers("text/html")),
            ProfileFormat::Html
        );
        assert_eq!(
            ProfileFormat::from_headers(&HeaderMap::new()),
            ProfileFormat::Html
        );
    }

    #[test]
    fn fragment_escapes_profile_values() {
        let fragment = profile_fragment(&UserProfile {
            subject: "u1".to_string(),
            email: Some("<script>alert('x')</script>@example.com".to_string()),
            display_name: Some("A & B".to_string()),
            email_verified: None,
        });

        assert!(fragment.contains("<p>Subject: u1</p>"));
        assert!(fragment.contains("<p>Name: A &amp; B</p>"));
        assert!(fragment.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;@example.com"));
        assert!(!fragment.contains("<script>"));
    }

    #[test]
    fn escape_html_leaves_plain_text_alone() {
        assert_eq!(escape_html("u1@example.com"), "u1@example.com");
        assert_eq!(escape_html("\"quoted\""), "&quot;quoted&quot;");
    }
}
