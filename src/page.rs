//! A minimal document model over an HTML template.
//!
//! The template is parsed once with `scraper` into an owned element tree.
//! Elements are addressed by their `id` attribute, and `to_html` serializes the
//! tree with every mutation applied. Markup handed to `set_inner_html` goes
//! through the same parser, so inserted elements are addressable afterwards.
//! A mutation against an id that does not exist is a no-op and returns `false`.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attr(&mut self, name: &str, value: Option<String>) {
        match (self.attrs.iter().position(|(key, _)| key == name), value) {
            (Some(idx), Some(value)) => self.attrs[idx].1 = value,
            (Some(idx), None) => {
                self.attrs.remove(idx);
            }
            (None, Some(value)) => self.attrs.push((name.to_string(), value)),
            (None, None) => {}
        }
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }

    fn has_id(&self, id: &str) -> bool {
        self.attr("id") == Some(id)
    }

    fn dataset(&self) -> BTreeMap<String, String> {
        self.attrs
            .iter()
            .filter_map(|(key, value)| Some((key.strip_prefix("data-")?.to_string(), value.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    doctype: Option<String>,
    root: Element,
    body_overflow: Option<String>,
}

impl Page {
    pub fn parse(template: impl AsRef<str>) -> Self {
        let document = Html::parse_document(template.as_ref());
        let doctype = document.tree.root().children().find_map(|node| match node.value() {
            scraper::Node::Doctype(doctype) => Some(doctype.name().to_string()),
            _ => None,
        });
        let root = convert_element(document.root_element());
        let body_overflow = find_body(&root)
            .and_then(|body| body.attr("style"))
            .and_then(|style| style_property(style, "overflow"));
        Self {
            doctype,
            root,
            body_overflow,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str(&format!("<!DOCTYPE {doctype}>"));
        }
        write_element(&mut out, &self.root);
        out
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Every element id in document order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        collect_ids(&self.root, &mut ids);
        ids
    }

    pub fn inner_html(&self, id: &str) -> Option<String> {
        let element = self.find(id)?;
        let mut out = String::new();
        write_children(&mut out, element);
        Some(out)
    }

    pub fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.find(id)?.attr(name).map(str::to_string)
    }

    pub fn set_inner_html(&mut self, id: &str, html: &str) -> bool {
        let Some(element) = self.find_mut(id) else {
            return false;
        };
        if element.is_void() {
            return false;
        }
        element.children = parse_fragment(html);
        true
    }

    pub fn clear(&mut self, id: &str) -> bool {
        self.set_inner_html(id, "")
    }

    pub fn hide(&mut self, id: &str) -> bool {
        self.update_attr(id, "style", |style| {
            Some(set_style_property(style.unwrap_or_default(), "display", Some("none")))
        })
    }

    pub fn show(&mut self, id: &str) -> bool {
        self.update_attr(id, "style", |style| {
            let style = set_style_property(style.unwrap_or_default(), "display", None);
            (!style.is_empty()).then_some(style)
        })
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.attribute(id, "style")
            .and_then(|style| style_property(&style, "display"))
            .is_some_and(|display| display == "none")
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: &str, class: &str) -> bool {
        self.update_attr(id, "class", |classes| {
            let mut list: Vec<&str> = classes.unwrap_or_default().split_whitespace().collect();
            if !list.contains(&class) {
                list.push(class);
            }
            Some(list.join(" "))
        })
    }

    pub fn remove_class(&mut self, id: &str, class: &str) -> bool {
        self.update_attr(id, "class", |classes| {
            let list: Vec<&str> = classes
                .unwrap_or_default()
                .split_whitespace()
                .filter(|c| *c != class)
                .collect();
            (!list.is_empty()).then(|| list.join(" "))
        })
    }

    /// `data-*` attributes of the nearest element carrying `data-{key}`,
    /// starting at `id` itself and walking outwards. Keys drop the `data-` prefix.
    pub fn closest_dataset(&self, id: &str, key: &str) -> Option<BTreeMap<String, String>> {
        self.closest_dataset_any(id, &[key])
    }

    /// Like [`Page::closest_dataset`], stopping at the first element carrying any of `keys`.
    pub fn closest_dataset_any(&self, id: &str, keys: &[&str]) -> Option<BTreeMap<String, String>> {
        let wanted: Vec<String> = keys.iter().map(|key| format!("data-{key}")).collect();
        path_to(&self.root, id)?
            .into_iter()
            .find(|element| wanted.iter().any(|attr| element.attr(attr).is_some()))
            .map(Element::dataset)
    }

    pub fn body_overflow(&self) -> Option<&str> {
        self.body_overflow.as_deref()
    }

    /// Sets (or with `None`, restores) the `overflow` style of `<body>`.
    pub fn set_body_overflow(&mut self, value: Option<&str>) {
        self.body_overflow = value.map(str::to_string);
        let Some(body) = find_body_mut(&mut self.root) else {
            return;
        };
        let style = set_style_property(body.attr("style").unwrap_or_default(), "overflow", value);
        body.set_attr("style", (!style.is_empty()).then_some(style));
    }

    fn find(&self, id: &str) -> Option<&Element> {
        find_element(&self.root, id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        find_element_mut(&mut self.root, id)
    }

    fn update_attr<F>(&mut self, id: &str, name: &str, update: F) -> bool
    where
        F: FnOnce(Option<&str>) -> Option<String>,
    {
        let Some(element) = self.find_mut(id) else {
            return false;
        };
        let value = update(element.attr(name));
        element.set_attr(name, value);
        true
    }
}

fn convert_element(element: ElementRef<'_>) -> Element {
    let value = element.value();
    Element {
        name: value.name().to_string(),
        attrs: value
            .attrs()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        children: convert_children(element),
    }
}

fn convert_children(element: ElementRef<'_>) -> Vec<Node> {
    element
        .children()
        .filter_map(|child| match child.value() {
            scraper::Node::Element(_) => {
                ElementRef::wrap(child).map(|el| Node::Element(convert_element(el)))
            }
            scraper::Node::Text(text) => Some(Node::Text(String::from(&**text))),
            scraper::Node::Comment(comment) => Some(Node::Comment(String::from(&**comment))),
            _ => None,
        })
        .collect()
}

/// Parses markup in a body context and returns its top-level nodes.
fn parse_fragment(html: &str) -> Vec<Node> {
    if html.is_empty() {
        return Vec::new();
    }
    convert_children(Html::parse_fragment(html).root_element())
}

fn find_element<'a>(element: &'a Element, id: &str) -> Option<&'a Element> {
    if element.has_id(id) {
        return Some(element);
    }
    element.children.iter().find_map(|node| match node {
        Node::Element(child) => find_element(child, id),
        _ => None,
    })
}

fn find_element_mut<'a>(element: &'a mut Element, id: &str) -> Option<&'a mut Element> {
    if element.has_id(id) {
        return Some(element);
    }
    element.children.iter_mut().find_map(|node| match node {
        Node::Element(child) => find_element_mut(child, id),
        _ => None,
    })
}

/// The element with `id` followed by its ancestors, innermost first.
fn path_to<'a>(element: &'a Element, id: &str) -> Option<Vec<&'a Element>> {
    if element.has_id(id) {
        return Some(vec![element]);
    }
    element.children.iter().find_map(|node| {
        let Node::Element(child) = node else {
            return None;
        };
        let mut path = path_to(child, id)?;
        path.push(element);
        Some(path)
    })
}

fn collect_ids(element: &Element, ids: &mut Vec<String>) {
    if let Some(id) = element.attr("id") {
        ids.push(id.to_string());
    }
    for node in &element.children {
        if let Node::Element(child) = node {
            collect_ids(child, ids);
        }
    }
}

fn find_body(root: &Element) -> Option<&Element> {
    root.children.iter().find_map(|node| match node {
        Node::Element(child) if child.name == "body" => Some(child),
        _ => None,
    })
}

fn find_body_mut(root: &mut Element) -> Option<&mut Element> {
    root.children.iter_mut().find_map(|node| match node {
        Node::Element(child) if child.name == "body" => Some(child),
        _ => None,
    })
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push_str(&format!(r#" {key}="{}""#, escape_attr(value)));
    }
    out.push('>');
    if element.is_void() {
        return;
    }
    write_children(out, element);
    out.push_str(&format!("</{}>", element.name));
}

fn write_children(out: &mut String, element: &Element) {
    let raw = RAW_TEXT_ELEMENTS.contains(&element.name.as_str());
    for node in &element.children {
        match node {
            Node::Element(child) => write_element(out, child),
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Comment(comment) => out.push_str(&format!("<!--{comment}-->")),
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}

fn style_property(style: &str, property: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        (key.trim().eq_ignore_ascii_case(property)).then(|| value.trim().to_string())
    })
}

fn set_style_property(style: &str, property: &str, value: Option<&str>) -> String {
    let mut decls: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            decl.split_once(':')
                .is_none_or(|(key, _)| !key.trim().eq_ignore_ascii_case(property))
        })
        .map(str::to_string)
        .collect();
    if let Some(value) = value {
        decls.push(format!("{property}: {value}"));
    }
    if decls.is_empty() {
        String::new()
    } else {
        format!("{};", decls.join("; "))
    }
}
