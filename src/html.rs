use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{parse_document, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::io;

/// Attribute carrying the asset URL, per mirrorable tag.
pub const URL_ATTRS: [(&str, &str); 3] = [("img", "src"), ("link", "href"), ("script", "src")];

/// Tags whose assets are mirrored, in processing order.
pub const MIRRORABLE_TAGS: [&str; 3] = ["img", "link", "script"];

/// Returns the URL attribute name for a mirrorable tag.
pub fn url_attr_for(tag: &str) -> Option<&'static str> {
    URL_ATTRS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag))
        .map(|(_, attr)| *attr)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Stylesheet,
    Script,
}

impl AssetKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "img" => Some(AssetKind::Image),
            "link" => Some(AssetKind::Stylesheet),
            "script" => Some(AssetKind::Script),
            _ => None,
        }
    }
}

/// A parsed HTML document. Elements handed out by [`HtmlDocument::query`]
/// are views into this tree; only their attributes are ever changed.
pub struct HtmlDocument {
    dom: RcDom,
}

impl HtmlDocument {
    pub fn parse(bytes: &[u8]) -> io::Result<Self> {
        let mut reader = bytes;
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut reader)?;

        Ok(Self { dom })
    }

    /// All elements named `tag`, in document order.
    pub fn query(&self, tag: &str) -> Vec<Element> {
        let mut found = Vec::new();
        collect_elements(&self.dom.document, tag, &mut found);
        found
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let document: SerializableHandle = self.dom.document.clone().into();
        serialize(&mut out, &document, SerializeOpts::default())?;
        Ok(out)
    }
}

fn collect_elements(node: &Handle, tag: &str, found: &mut Vec<Element>) {
    if let NodeData::Element { name, .. } = &node.data {
        if name.local.as_ref().eq_ignore_ascii_case(tag) {
            found.push(Element(node.clone()));
        }
    }

    for child in node.children.borrow().iter() {
        collect_elements(child, tag, found);
    }
}

/// Handle onto one element of an [`HtmlDocument`].
#[derive(Clone)]
pub struct Element(Handle);

impl Element {
    pub fn tag_name(&self) -> String {
        match &self.0.data {
            NodeData::Element { name, .. } => name.local.to_string(),
            _ => String::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        match &self.0.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| attr.name.local.as_ref() == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &self.0.data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|attr| attr.name.local.as_ref() == name) {
                Some(attr) => attr.value = StrTendril::from_slice(value),
                None => attrs.push(Attribute {
                    name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value: StrTendril::from_slice(value),
                }),
            }
        }
    }
}
