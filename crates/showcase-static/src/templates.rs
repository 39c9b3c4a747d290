//! Template engine for rendering the landing page.

use minijinja::{context, AutoEscape, Environment};
use serde::{Deserialize, Serialize};

use crate::page::PageView;

/// Fixed button and link texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Main call-to-action link
    pub primary_action: String,
    /// Secondary call-to-action link
    pub secondary_action: String,
    /// Toggle text while the light theme is active
    pub dark_mode: String,
    /// Toggle text while the dark theme is active
    pub light_mode: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            primary_action: "Adopt".to_string(),
            secondary_action: "Donate".to_string(),
            dark_mode: "Dark mode".to_string(),
            light_mode: "Light mode".to_string(),
        }
    }
}

/// Context for rendering the page template.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    /// `lang` attribute of the document
    pub lang: String,
    /// Button and link texts
    pub labels: Labels,
    /// Content extracted from the descriptor
    pub page: PageView,
}

/// Template engine using minijinja.
///
/// Descriptor text is operator-authored and inserted verbatim, so
/// auto-escaping is disabled.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the landing page template.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_template_owned("index.html".to_string(), INDEX_TEMPLATE.to_string())
            .expect("Failed to add index template");

        Self { env }
    }

    /// Render the landing page.
    pub fn render_page(&self, context: &Context) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("index.html")?;

        tmpl.render(context! {
            lang => &context.lang,
            labels => &context.labels,
            page => &context.page,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const INDEX_TEMPLATE: &str = r##"<!doctype html>
<html lang="{{ lang }}">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>{{ page.title }}</title>
  <link rel="stylesheet" href="assets/style.css" />
</head>
<body>
  <header class="nav">
    <div class="brand">{{ page.title }}</div>
    <div class="pill">{{ page.category }}</div>
    <button id="themeBtn" class="btn" data-dark="{{ labels.dark_mode }}" data-light="{{ labels.light_mode }}">{{ labels.light_mode }}</button>
  </header>

  <main class="container">
    <section class="hero">
      <div class="heroText">
        <h1>{{ page.hero.value_proposition }}</h1>
        <p>{{ page.hero.subtitle }}</p>
        <div class="actions">
          <a class="btn primary" href="#cta">{{ labels.primary_action }}</a>
          <a class="btn" href="#cta">{{ labels.secondary_action }}</a>
        </div>
      </div>
      <div class="heroMedia">
        <img src="{{ page.hero.image }}" alt="hero" />
      </div>
    </section>
{% for section in page.sections %}
    <section class="section"{% if section.anchor %} id="{{ section.anchor }}"{% endif %}>
      <div class="sectionHead">
        <h2>{{ section.title }}</h2>
      </div>
      <div class="sectionBody">
        {% if section.image %}<div class="sectionMedia"><img src="{{ section.image }}" alt="{{ section.name }}" /></div>{% endif %}
        <div class="sectionContent">
        {%- if section.body.kind == "list" %}
          <ul>{% for item in section.body.items %}<li>{{ item }}</li>{% endfor %}</ul>
        {%- elif section.body.kind == "overview" %}
          <p>{{ section.body.overview }}</p>
          <ul>{% for change in section.body.changes %}<li>{{ change }}</li>{% endfor %}</ul>
        {%- elif section.body.kind == "cards" %}
          <div class="grid">{% for card in section.body.cards %}<div class="card"><h3>{{ card.name }}</h3><p>{{ card.benefit }}</p></div>{% endfor %}</div>
        {%- elif section.body.kind == "call_to_action" %}
          <p>{{ section.body.description }}</p>
          <div class="actions"><a class="btn primary" href="#">{{ labels.primary_action }}</a><a class="btn" href="#">{{ labels.secondary_action }}</a></div>
        {%- endif %}
        </div>
      </div>
    </section>
{% endfor %}
  </main>

  <script src="assets/app.js"></script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{FeatureCard, HeroView, SectionBody, SectionView};

    fn page(sections: Vec<SectionView>) -> PageView {
        PageView {
            title: "Shelter".to_string(),
            category: "Nonprofit".to_string(),
            hero: HeroView {
                value_proposition: "Homes for <em>every</em> pet".to_string(),
                subtitle: "Adopt today".to_string(),
                image: "images/hero.png".to_string(),
            },
            sections,
        }
    }

    fn render(sections: Vec<SectionView>) -> String {
        TemplateEngine::new()
            .render_page(&Context {
                lang: "en".to_string(),
                labels: Labels::default(),
                page: page(sections),
            })
            .unwrap()
    }

    #[test]
    fn renders_hero_unescaped() {
        let html = render(vec![]);

        assert!(html.contains("<title>Shelter</title>"));
        assert!(html.contains("<h1>Homes for <em>every</em> pet</h1>"));
        assert!(html.contains(r#"<img src="images/hero.png" alt="hero" />"#));
        assert!(html.contains(r#"<html lang="en">"#));
        assert!(!html.contains("class=\"section\""));
    }

    #[test]
    fn renders_list_sections() {
        let html = render(vec![SectionView {
            name: "problem",
            anchor: None,
            title: "The problem".to_string(),
            image: Some("images/problem.png".to_string()),
            body: SectionBody::List {
                items: vec!["Overcrowding".to_string(), "Costs".to_string()],
            },
        }]);

        assert!(html.contains("<h2>The problem</h2>"));
        assert!(html.contains("<li>Overcrowding</li><li>Costs</li>"));
        assert!(html.contains(r#"<img src="images/problem.png" alt="problem" />"#));
    }

    #[test]
    fn renders_feature_cards_and_cta_anchor() {
        let html = render(vec![
            SectionView {
                name: "features",
                anchor: None,
                title: "Features".to_string(),
                image: None,
                body: SectionBody::Cards {
                    cards: vec![FeatureCard {
                        name: "Matching".to_string(),
                        benefit: "Right pet".to_string(),
                    }],
                },
            },
            SectionView {
                name: "cta",
                anchor: Some("cta"),
                title: "Join us".to_string(),
                image: None,
                body: SectionBody::CallToAction {
                    description: "Visit this weekend.".to_string(),
                },
            },
        ]);

        assert!(html.contains(r#"<div class="card"><h3>Matching</h3><p>Right pet</p></div>"#));
        assert!(html.contains(r#"<section class="section" id="cta">"#));
        assert!(html.contains("<p>Visit this weekend.</p>"));
        assert!(html.contains(r##"<a class="btn primary" href="#">Adopt</a>"##));
        assert!(!html.contains("sectionMedia"));
    }
}
