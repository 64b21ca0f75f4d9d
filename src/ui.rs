use crate::models::Form;
use std::collections::HashMap;

pub fn render_index(forms: &[Form], response_counts: &HashMap<&str, usize>) -> String {
    let rows = if forms.is_empty() {
        r#"<p class="empty">No forms yet. Create one with <code>POST /api/forms</code>.</p>"#
            .to_string()
    } else {
        forms
            .iter()
            .map(|form| {
                render_card(form, response_counts.get(form.id.as_str()).copied().unwrap_or(0))
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    INDEX_HTML
        .replace("{{COUNT}}", &forms.len().to_string())
        .replace("{{FORMS}}", &rows)
}

fn render_card(form: &Form, responses: usize) -> String {
    let title = if form.title.trim().is_empty() {
        "Untitled form".to_string()
    } else {
        escape_html(&form.title)
    };
    let description = form
        .description
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .map(|text| format!(r#"<p class="description">{}</p>"#, escape_html(text)))
        .unwrap_or_default();
    let accent = form
        .theme
        .as_deref()
        .filter(|color| is_css_color(color))
        .unwrap_or("#673ab7");
    let id = escape_html(&form.id);

    format!(
        r#"<article class="card" style="--form-accent: {accent}">
  <h2>{title}</h2>
  {description}
  <dl>
    <div><dt>Questions</dt><dd>{questions}</dd></div>
    <div><dt>Responses</dt><dd>{responses}</dd></div>
    <div><dt>Updated</dt><dd>{updated}</dd></div>
  </dl>
  <nav>
    <a href="/api/forms/{id}">Definition</a>
    <a href="/api/responses/{id}">Responses</a>
    <a href="/api/stats/{id}">Stats</a>
  </nav>
</article>"#,
        questions = form.questions.len(),
        updated = form.updated_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// Only `#rgb` / `#rrggbb` reach the inline style attribute.
fn is_css_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Forms</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f3f0fa;
      --ink: #2b2a28;
      --muted: #6b645d;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 18px 40px rgba(47, 44, 88, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ece6f7 60%, #f8f6fc 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    main {
      width: min(960px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    .subtitle,
    .empty,
    .description {
      color: var(--muted);
      margin: 0;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(260px, 1fr));
      gap: 18px;
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      border-top: 6px solid var(--form-accent);
      box-shadow: var(--shadow);
      padding: 20px;
      display: grid;
      gap: 12px;
    }

    .card h2 {
      margin: 0;
      font-size: 1.25rem;
    }

    dl {
      display: grid;
      grid-template-columns: repeat(3, 1fr);
      gap: 8px;
      margin: 0;
    }

    dt {
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8b857d;
    }

    dd {
      margin: 0;
      font-weight: 600;
    }

    nav {
      display: flex;
      gap: 12px;
      flex-wrap: wrap;
    }

    nav a {
      color: var(--form-accent);
      font-weight: 600;
      text-decoration: none;
    }
  </style>
</head>
<body>
  <main>
    <header>
      <h1>Forms</h1>
      <p class="subtitle">{{COUNT}} form(s) on this server.</p>
    </header>
    <section class="grid">
{{FORMS}}
    </section>
  </main>
</body>
</html>
"#;
