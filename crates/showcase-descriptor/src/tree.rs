//! Owned XML element tree.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::descriptor::DescriptorError;

/// A child node of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data, whitespace included
    Text(String),
    /// `<![CDATA[...]]>` section
    CData(String),
    /// `<!-- ... -->` comment
    Comment(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<Node>,
}

/// Location of an element as child indices from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path pointing at the root element.
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend the path by one child index.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Child indices from the root.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Iterate over direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Direct text content (text and CDATA children), trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out.trim().to_string()
    }

    /// Resolve a slash-separated child path such as `media/image`.
    ///
    /// Each segment picks the first matching child.
    pub fn find(&self, path: &str) -> Option<&Element> {
        segments(path).try_fold(self, |current, name| current.child(name))
    }

    /// All elements matching a slash-separated path, in document order.
    ///
    /// Unlike [`Element::find`], every matching child is followed at each step,
    /// so `items/item` returns the items of every `items` block.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for name in segments(path) {
            current = current
                .into_iter()
                .flat_map(|e| e.elements().filter(move |c| c.name == name))
                .collect();
        }
        current
    }

    /// Trimmed text of the element at `path`, or an empty string.
    pub fn find_text(&self, path: &str) -> String {
        self.find(path).map(Element::text).unwrap_or_default()
    }

    /// Paths (relative to `self`) of every descendant element named `name`,
    /// in document order. `self` is never included.
    pub fn descendant_paths(&self, name: &str) -> Vec<NodePath> {
        let mut found = Vec::new();
        collect_descendants(self, name, &NodePath::root(), &mut found);
        found
    }

    /// Index path (relative to `self`) of the first child element per segment.
    pub fn locate(&self, path: &str) -> Option<NodePath> {
        let mut current = self;
        let mut location = NodePath::root();
        for name in segments(path) {
            let (index, next) = current
                .children
                .iter()
                .enumerate()
                .find_map(|(i, node)| match node {
                    Node::Element(e) if e.name == name => Some((i, e)),
                    _ => None,
                })?;
            location = location.child(index);
            current = next;
        }
        Some(location)
    }

    /// Element at an index path.
    pub fn at(&self, path: &NodePath) -> Option<&Element> {
        path.indices()
            .iter()
            .try_fold(self, |current, &index| match current.children.get(index) {
                Some(Node::Element(e)) => Some(e),
                _ => None,
            })
    }

    /// Mutable element at an index path.
    pub fn at_mut(&mut self, path: &NodePath) -> Option<&mut Element> {
        let mut current = self;
        for &index in path.indices() {
            current = match current.children.get_mut(index) {
                Some(Node::Element(e)) => e,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

fn collect_descendants(element: &Element, name: &str, at: &NodePath, found: &mut Vec<NodePath>) {
    for (index, node) in element.children.iter().enumerate() {
        if let Node::Element(child) = node {
            let path = at.child(index);
            if child.name == name {
                found.push(path.clone());
            }
            collect_descendants(child, name, &path, found);
        }
    }
}

/// Parse an XML document into its root element.
pub(crate) fn parse_document(xml: &str) -> Result<Element, DescriptorError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            DescriptorError::Parse(format!("at byte {}: {}", reader.error_position(), e))
        })?;

        match event {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DescriptorError::Parse("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                // Whitespace outside the root element is dropped
                if let Some(parent) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| DescriptorError::Parse(e.to_string()))?;
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let data = String::from_utf8_lossy(&data).into_owned();
                    parent.children.push(Node::CData(data));
                }
            }
            Event::Comment(comment) => {
                if let Some(parent) = stack.last_mut() {
                    let comment = String::from_utf8_lossy(&comment).into_owned();
                    parent.children.push(Node::Comment(comment));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DescriptorError::Parse(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| DescriptorError::Parse("document has no root element".to_string()))
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, DescriptorError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));

    for attr in start.attributes() {
        let attr = attr.map_err(|e| DescriptorError::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| DescriptorError::Parse(e.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DescriptorError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        return Ok(());
    }

    if root.is_some() {
        return Err(DescriptorError::Parse(format!(
            "multiple root elements (found <{}>)",
            element.name
        )));
    }

    *root = Some(element);
    Ok(())
}

/// Serialize a root element with a UTF-8 XML declaration.
pub(crate) fn write_document(root: &Element) -> Result<String, DescriptorError> {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped("\n")))
        .map_err(write_error)?;

    write_element(&mut writer, root)?;

    String::from_utf8(writer.into_inner()).map_err(write_error)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), DescriptorError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;

    for node in &element.children {
        match node {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
                .map_err(write_error)?,
            Node::CData(data) => writer
                .write_event(Event::CData(BytesCData::new(data.as_str())))
                .map_err(write_error)?,
            Node::Comment(comment) => writer
                .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))
                .map_err(write_error)?,
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)
}

fn write_error(e: impl std::fmt::Display) -> DescriptorError {
    DescriptorError::Write(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<product>
  <meta><title>Shelter &amp; Co</title></meta>
  <problem>
    <items><item>One</item><item>Two</item></items>
    <items><item>Three</item></items>
    <media><image src="problem" alt="Crowded kennels"/></media>
  </problem>
</product>"#;

    #[test]
    fn parses_text_and_attributes() {
        let root = parse_document(SAMPLE).unwrap();

        assert_eq!(root.name, "product");
        assert_eq!(root.find_text("meta/title"), "Shelter & Co");

        let image = root.find("problem/media/image").unwrap();
        assert_eq!(image.attr("src"), Some("problem"));
        assert_eq!(image.attr("alt"), Some("Crowded kennels"));
    }

    #[test]
    fn find_all_follows_every_branch() {
        let root = parse_document(SAMPLE).unwrap();

        let items: Vec<String> = root
            .find_all("problem/items/item")
            .into_iter()
            .map(Element::text)
            .collect();

        assert_eq!(items, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn missing_paths_resolve_to_empty() {
        let root = parse_document(SAMPLE).unwrap();

        assert!(root.find("hero/subtitle").is_none());
        assert_eq!(root.find_text("hero/subtitle"), "");
        assert!(root.find_all("benefits/items/item").is_empty());
    }

    #[test]
    fn descendant_paths_point_back_at_elements() {
        let mut root = parse_document(SAMPLE).unwrap();
        let paths = root.descendant_paths("image");
        assert_eq!(paths.len(), 1);

        root.at_mut(&paths[0]).unwrap().set_attr("src", "generated/x.png");

        assert_eq!(
            root.find("problem/media/image").unwrap().attr("src"),
            Some("generated/x.png")
        );
    }

    #[test]
    fn locate_matches_find() {
        let root = parse_document(SAMPLE).unwrap();
        let path = root.locate("problem/media").unwrap();

        assert_eq!(root.at(&path), root.find("problem/media"));
        assert!(root.locate("problem/nothing").is_none());
    }

    #[test]
    fn set_attr_keeps_order() {
        let mut element = Element::new("image");
        element.set_attr("src", "a");
        element.set_attr("alt", "b");
        element.set_attr("src", "c");

        assert_eq!(
            element.attributes,
            vec![
                ("src".to_string(), "c".to_string()),
                ("alt".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn writes_back_same_structure() {
        let root = parse_document(SAMPLE).unwrap();
        let written = write_document(&root).unwrap();

        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<product>"));
        assert!(written.contains("<title>Shelter &amp; Co</title>"));
        assert!(written.contains(r#"<image src="problem" alt="Crowded kennels"/>"#));

        let reparsed = parse_document(&written).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn keeps_comments_and_cdata() {
        let xml = "<root><!-- note --><body><![CDATA[<b>raw</b>]]></body></root>";
        let root = parse_document(xml).unwrap();

        assert_eq!(root.children[0], Node::Comment(" note ".to_string()));
        assert_eq!(root.find_text("body"), "<b>raw</b>");

        let written = write_document(&root).unwrap();
        assert!(written.contains("<!-- note -->"));
        assert!(written.contains("<![CDATA[<b>raw</b>]]>"));
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            parse_document("<root><open></root>"),
            Err(DescriptorError::Parse(_))
        ));
        assert!(matches!(
            parse_document("<root>"),
            Err(DescriptorError::Parse(_))
        ));
        assert!(matches!(
            parse_document("   "),
            Err(DescriptorError::Parse(_))
        ));
        assert!(matches!(
            parse_document("<a/><b/>"),
            Err(DescriptorError::Parse(_))
        ));
    }
}
