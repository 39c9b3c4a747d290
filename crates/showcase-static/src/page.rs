//! Page model extracted from the updated descriptor.

use serde::Serialize;
use showcase_descriptor::{Descriptor, Element};

/// Optional landing page sections, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Problem,
    Solution,
    Features,
    Benefits,
    Cta,
}

impl SectionKind {
    /// Every section, in render order.
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Problem,
        SectionKind::Solution,
        SectionKind::Features,
        SectionKind::Benefits,
        SectionKind::Cta,
    ];

    /// Descriptor tag holding the section.
    pub fn tag(self) -> &'static str {
        match self {
            SectionKind::Problem => "problem",
            SectionKind::Solution => "solution",
            SectionKind::Features => "keyFeatures",
            SectionKind::Benefits => "benefits",
            SectionKind::Cta => "finalCTA",
        }
    }

    /// Short name, used as the image alt text.
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Problem => "problem",
            SectionKind::Solution => "solution",
            SectionKind::Features => "features",
            SectionKind::Benefits => "benefits",
            SectionKind::Cta => "cta",
        }
    }

    /// Element id the hero buttons link to.
    pub fn anchor(self) -> Option<&'static str> {
        match self {
            SectionKind::Cta => Some("cta"),
            _ => None,
        }
    }

    fn body(self, section: &Element) -> SectionBody {
        match self {
            SectionKind::Problem | SectionKind::Benefits => SectionBody::List {
                items: texts(section, "items/item"),
            },
            SectionKind::Solution => SectionBody::Overview {
                overview: section.find_text("overview"),
                changes: texts(section, "whatChanges/change"),
            },
            SectionKind::Features => SectionBody::Cards {
                cards: section
                    .find_all("feature")
                    .into_iter()
                    .map(|feature| FeatureCard {
                        name: feature.find_text("name"),
                        benefit: feature.find_text("benefit"),
                    })
                    .collect(),
            },
            SectionKind::Cta => SectionBody::CallToAction {
                description: section.find_text("description"),
            },
        }
    }
}

/// Section-specific content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    List { items: Vec<String> },
    Overview { overview: String, changes: Vec<String> },
    Cards { cards: Vec<FeatureCard> },
    CallToAction { description: String },
}

/// One card of the features grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCard {
    pub name: String,
    pub benefit: String,
}

/// A rendered section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub name: &'static str,
    pub anchor: Option<&'static str>,
    pub title: String,
    pub image: Option<String>,
    pub body: SectionBody,
}

/// The always-present hero block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroView {
    pub value_proposition: String,
    pub subtitle: String,
    pub image: String,
}

/// Everything the page template needs from the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub title: String,
    pub category: String,
    pub hero: HeroView,
    pub sections: Vec<SectionView>,
}

impl PageView {
    /// Extract the page from a descriptor.
    ///
    /// Image paths under `generated_dir` are rewritten to the site's `images/`
    /// directory. Missing sections are left out.
    pub fn from_descriptor(descriptor: &Descriptor, generated_dir: &str) -> Self {
        let mut title = descriptor.text("meta/title");
        if title.is_empty() {
            title = descriptor.text("hero/title");
        }

        let hero = HeroView {
            value_proposition: descriptor.text("hero/valueProposition"),
            subtitle: descriptor.text("hero/subtitle"),
            image: descriptor
                .find("hero/media/image")
                .and_then(|img| img.attr("src"))
                .map(|src| site_image_path(src, generated_dir))
                .unwrap_or_default(),
        };

        let sections = SectionKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let section = descriptor.find(kind.tag())?;
                Some(SectionView {
                    name: kind.name(),
                    anchor: kind.anchor(),
                    title: section.find_text("title"),
                    image: section
                        .find("media/image")
                        .and_then(|img| img.attr("src"))
                        .filter(|src| !src.trim().is_empty())
                        .map(|src| site_image_path(src, generated_dir)),
                    body: kind.body(section),
                })
            })
            .collect();

        Self {
            title,
            category: descriptor.text("meta/category"),
            hero,
            sections,
        }
    }
}

/// Rewrite a generated image path to the site's `images/` directory.
pub fn site_image_path(src: &str, generated_dir: &str) -> String {
    let dir = generated_dir.trim_end_matches('/');
    if dir.is_empty() {
        return src.trim().to_string();
    }
    src.trim().replace(&format!("{}/", dir), "images/")
}

fn texts(element: &Element, path: &str) -> Vec<String> {
    element.find_all(path).into_iter().map(Element::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PRODUCT: &str = r#"<product>
  <meta><title>Shelter</title><category>Nonprofit</category></meta>
  <hero>
    <valueProposition>Homes for every pet</valueProposition>
    <subtitle>Adopt today</subtitle>
    <media><image src="generated_images/hero-dog.png" alt="Dog"/></media>
  </hero>
  <solution>
    <title>Our answer</title>
    <overview>A network of foster homes.</overview>
    <whatChanges><change>Less waiting</change><change>More adoptions</change></whatChanges>
  </solution>
  <keyFeatures>
    <title>Features</title>
    <feature><name>Matching</name><benefit>Right pet, right home</benefit></feature>
    <feature><name>Follow-up</name><benefit>Support after adoption</benefit></feature>
    <media><image src="generated_images/features-cards.png" alt="Cards"/></media>
  </keyFeatures>
  <finalCTA><title>Join us</title><description>Visit this weekend.</description></finalCTA>
</product>"#;

    #[test]
    fn extracts_present_sections_in_order() {
        let descriptor = Descriptor::parse(PRODUCT).unwrap();
        let page = PageView::from_descriptor(&descriptor, "generated_images");

        let names: Vec<&str> = page.sections.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["solution", "features", "cta"]);

        assert_eq!(page.title, "Shelter");
        assert_eq!(page.hero.image, "images/hero-dog.png");
    }

    #[test]
    fn builds_section_bodies() {
        let descriptor = Descriptor::parse(PRODUCT).unwrap();
        let page = PageView::from_descriptor(&descriptor, "generated_images");

        assert_eq!(
            page.sections[0].body,
            SectionBody::Overview {
                overview: "A network of foster homes.".to_string(),
                changes: vec!["Less waiting".to_string(), "More adoptions".to_string()],
            }
        );

        let SectionBody::Cards { cards } = &page.sections[1].body else {
            panic!("features should render as cards");
        };
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].benefit, "Support after adoption");
        assert_eq!(
            page.sections[1].image.as_deref(),
            Some("images/features-cards.png")
        );

        assert_eq!(page.sections[2].anchor, Some("cta"));
        assert_eq!(page.sections[2].image, None);
    }

    #[test]
    fn hero_without_image_or_meta_title() {
        let descriptor =
            Descriptor::parse("<product><hero><title>Shelter</title></hero></product>").unwrap();
        let page = PageView::from_descriptor(&descriptor, "generated_images");

        assert_eq!(page.title, "Shelter");
        assert_eq!(page.hero.image, "");
        assert!(page.sections.is_empty());
    }

    #[test]
    fn rewrites_only_generated_paths() {
        assert_eq!(
            site_image_path("generated_images/a.png", "generated_images/"),
            "images/a.png"
        );
        assert_eq!(
            site_image_path("/work/out/gen/a.png", "/work/out/gen"),
            "images/a.png"
        );
        assert_eq!(site_image_path("images/hero.png", "generated_images"), "images/hero.png");
        assert_eq!(site_image_path("hero", ""), "hero");
    }
}
