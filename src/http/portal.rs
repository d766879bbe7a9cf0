//! Landing page served on `/` in forward mode.

use axum::{extract::State, response::Html};

use crate::http::forward::ForwardState;

pub async fn portal_handler(State(state): State<ForwardState>) -> Html<String> {
    Html(landing_page(state.path_prefix()))
}

/// Static page linking to the relayed root.
pub fn landing_page(path_prefix: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Proxy Portal</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 40rem; margin: 4rem auto; padding: 0 1rem; }}
    a.button {{ display: inline-block; padding: 0.6rem 1.2rem; background: #1f6feb; color: #fff; border-radius: 6px; text-decoration: none; }}
  </style>
</head>
<body>
  <h1>Proxy Portal</h1>
  <p>Open the relayed site through this server.</p>
  <p><a class="button" href="{prefix}/">Enter</a></p>
</body>
</html>
"#,
        prefix = path_prefix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_to_prefix_root() {
        let page = landing_page("/proxy");
        assert!(page.contains("Proxy Portal"));
        assert!(page.contains(r#"href="/proxy/""#));
    }
}
