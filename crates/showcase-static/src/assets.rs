//! Fixed stylesheet and script shipped with every landing page.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// The landing page stylesheet.
    pub fn generate_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// The theme toggle script.
    pub fn generate_js() -> String {
        DEFAULT_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

// Dark palette by default, `body.light` switches to the light one
const DEFAULT_CSS: &str = r#":root {
  --bg: #0b0c10;
  --card: #11131a;
  --text: #e8eaf0;
  --muted: #b6bccb;
  --primary: #7ee081;
  --border: #242838;
}

body.light {
  --bg: #f6f7fb;
  --card: #ffffff;
  --text: #121318;
  --muted: #4b5563;
  --primary: #1f7a3a;
  --border: #e5e7eb;
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, Arial, sans-serif;
  background: var(--bg);
  color: var(--text);
}

.container {
  max-width: 1100px;
  margin: 0 auto;
  padding: 24px;
}

/* Navigation */
.nav {
  display: flex;
  gap: 12px;
  align-items: center;
  justify-content: space-between;
  padding: 16px 24px;
  border-bottom: 1px solid var(--border);
  position: sticky;
  top: 0;
  background: var(--bg);
}

.brand {
  font-weight: 700;
}

.pill {
  padding: 6px 10px;
  border: 1px solid var(--border);
  border-radius: 999px;
  color: var(--muted);
}

.btn {
  border: 1px solid var(--border);
  background: transparent;
  color: var(--text);
  padding: 10px 14px;
  border-radius: 10px;
  cursor: pointer;
  text-decoration: none;
  display: inline-block;
}

.btn.primary {
  background: var(--primary);
  border-color: var(--primary);
  color: #0b0c10;
  font-weight: 700;
}

/* Hero */
.hero {
  display: grid;
  grid-template-columns: 1.1fr 0.9fr;
  gap: 18px;
  align-items: center;
  margin-top: 18px;
}

.heroMedia img {
  width: 100%;
  border-radius: 18px;
  border: 1px solid var(--border);
}

.actions {
  display: flex;
  gap: 10px;
  flex-wrap: wrap;
  margin-top: 12px;
}

/* Sections */
.section {
  margin: 34px 0;
  padding: 18px;
  border: 1px solid var(--border);
  border-radius: 18px;
  background: var(--card);
}

.sectionBody {
  display: grid;
  grid-template-columns: 0.9fr 1.1fr;
  gap: 16px;
  align-items: start;
}

.sectionMedia img {
  width: 100%;
  border-radius: 14px;
  border: 1px solid var(--border);
}

.grid {
  display: grid;
  grid-template-columns: repeat(2, minmax(0, 1fr));
  gap: 12px;
}

.card {
  padding: 14px;
  border: 1px solid var(--border);
  border-radius: 14px;
  background: transparent;
}

h1 {
  font-size: 38px;
  line-height: 1.05;
  margin: 0;
}

h2 {
  margin: 0 0 12px;
}

h3 {
  margin: 0 0 6px;
}

p {
  color: var(--muted);
  margin: 10px 0;
}

ul {
  margin: 0;
  padding-left: 18px;
  color: var(--muted);
}

li {
  margin: 8px 0;
}

@media (max-width: 900px) {
  .hero,
  .sectionBody {
    grid-template-columns: 1fr;
  }

  .grid {
    grid-template-columns: 1fr;
  }

  h1 {
    font-size: 30px;
  }
}
"#;

const DEFAULT_JS: &str = r#"// Light/dark theme toggle, remembered in localStorage
(function() {
  'use strict';

  const btn = document.getElementById('themeBtn');
  const key = 'theme_light';

  function apply() {
    const isLight = localStorage.getItem(key) === '1';
    document.body.classList.toggle('light', isLight);
    if (btn) {
      btn.textContent = isLight
        ? (btn.dataset.dark || 'Dark mode')
        : (btn.dataset.light || 'Light mode');
    }
  }

  btn?.addEventListener('click', () => {
    const isLight = localStorage.getItem(key) === '1';
    localStorage.setItem(key, isLight ? '0' : '1');
    apply();
  });

  apply();
})();
"#;
