use serde::Serialize;

/// Minimal XML tree for the TEI output; attribute order is kept as inserted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TeiNode {
    Element(TeiElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeiElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<TeiNode>,
}

impl TeiElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, element: TeiElement) -> Self {
        self.children.push(TeiNode::Element(element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(TeiNode::Text(text.into()));
        self
    }

    pub fn push(&mut self, element: TeiElement) {
        self.children.push(TeiNode::Element(element));
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements, skipping text nodes
    pub fn elements(&self) -> impl Iterator<Item = &TeiElement> {
        self.children.iter().filter_map(|node| match node {
            TeiNode::Element(element) => Some(element),
            TeiNode::Text(_) => None,
        })
    }

    /// First child element named `name`
    pub fn find(&self, name: &str) -> Option<&TeiElement> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated text of this subtree, `<lb/>` read as a space
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                TeiNode::Text(text) => out.push_str(text),
                TeiNode::Element(element) if element.name == "lb" => out.push(' '),
                TeiNode::Element(element) => out.push_str(&element.text_content()),
            }
        }
        out
    }
}
