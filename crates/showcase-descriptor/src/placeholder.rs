//! Image placeholder discovery.

use crate::tree::{Element, NodePath};

/// Section keys and the descriptor paths they are collected from, in
/// generation order.
pub const SECTION_PATHS: &[(&str, &str)] = &[
    ("hero", "hero"),
    ("problem", "problem"),
    ("solution", "solution"),
    ("features", "keyFeatures"),
    ("benefits", "benefits"),
    ("cta", "finalCTA"),
];

/// Section key used when no known section holds any image.
pub const MISC_SECTION: &str = "misc";

/// An `image` element awaiting a generated file.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    /// Section key (`hero`, `features`, `misc`, ...)
    pub section: String,
    /// Current `src` attribute, trimmed
    pub src: String,
    /// `alt` attribute, trimmed
    pub alt: String,
    /// Location of the element in the descriptor tree
    pub location: NodePath,
}

pub(crate) fn collect_placeholders(root: &Element) -> Vec<Placeholder> {
    let mut placeholders = Vec::new();

    for (section, path) in SECTION_PATHS {
        let Some(section_path) = root.locate(path) else {
            continue;
        };
        let Some(section_el) = root.at(&section_path) else {
            continue;
        };

        for relative in section_el.descendant_paths("image") {
            let mut location = section_path.clone();
            for &index in relative.indices() {
                location = location.child(index);
            }
            if let Some(image) = root.at(&location) {
                placeholders.push(placeholder(section, image, location));
            }
        }
    }

    if placeholders.is_empty() {
        for location in root.descendant_paths("image") {
            if let Some(image) = root.at(&location) {
                placeholders.push(placeholder(MISC_SECTION, image, location));
            }
        }
    }

    placeholders
}

fn placeholder(section: &str, image: &Element, location: NodePath) -> Placeholder {
    Placeholder {
        section: section.to_string(),
        src: image.attr("src").unwrap_or_default().trim().to_string(),
        alt: image.attr("alt").unwrap_or_default().trim().to_string(),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Descriptor;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_in_section_order() {
        let descriptor = Descriptor::parse(
            r#"<product>
  <finalCTA><media><image src="cta" alt="Family"/></media></finalCTA>
  <keyFeatures>
    <feature><name>Fast</name><image src="f1" alt="Speed"/></feature>
    <feature><name>Safe</name><image src="f2" alt=" Lock "/></feature>
  </keyFeatures>
  <hero><media><image src="hero" alt="Dog"/></media></hero>
</product>"#,
        )
        .unwrap();

        let found: Vec<(String, String)> = descriptor
            .placeholders()
            .into_iter()
            .map(|p| (p.section, p.alt))
            .collect();

        assert_eq!(
            found,
            vec![
                ("hero".to_string(), "Dog".to_string()),
                ("features".to_string(), "Speed".to_string()),
                ("features".to_string(), "Lock".to_string()),
                ("cta".to_string(), "Family".to_string()),
            ]
        );
    }

    #[test]
    fn falls_back_to_misc() {
        let descriptor = Descriptor::parse(
            r#"<product><gallery><image src="a" alt="One"/><image alt="Two"/></gallery></product>"#,
        )
        .unwrap();

        let placeholders = descriptor.placeholders();

        assert_eq!(placeholders.len(), 2);
        assert!(placeholders.iter().all(|p| p.section == MISC_SECTION));
        assert_eq!(placeholders[1].src, "");
    }

    #[test]
    fn locations_resolve_to_the_image() {
        let descriptor = Descriptor::parse(
            r#"<product><problem><title>T</title><media><image src="p" alt="Pain"/></media></problem></product>"#,
        )
        .unwrap();

        let placeholder = &descriptor.placeholders()[0];
        let image = descriptor.root().at(&placeholder.location).unwrap();

        assert_eq!(image.attr("alt"), Some("Pain"));
    }
}
