use ::scraper::{CaseSensitivity, ElementRef};

/// Heading elements of every level.
pub(crate) const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// A condition an element must satisfy to match a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate<'q> {
    /// Attribute is present with exactly this value.
    AttrEquals(&'q str, &'q str),
    /// Attribute value starts with the given prefix.
    AttrPrefix(&'q str, &'q str),
    /// Attribute value contains the needle, ignoring ASCII case.
    AttrContains(&'q str, &'q str),
    /// Attribute is present and non-blank.
    HasAttr(&'q str),
    /// Element carries the given class.
    HasClass(&'q str),
    /// Element text contains the needle, ignoring case.
    TextContains(&'q str),
}

impl Predicate<'_> {
    fn matches(&self, element: &ElementRef) -> bool {
        let attr = |name: &str| element.value().attr(name);
        match *self {
            Predicate::AttrEquals(name, value) => attr(name) == Some(value),
            Predicate::AttrPrefix(name, prefix) => {
                attr(name).is_some_and(|v| v.starts_with(prefix))
            }
            Predicate::AttrContains(name, needle) => attr(name)
                .is_some_and(|v| v.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())),
            Predicate::HasAttr(name) => attr(name).is_some_and(|v| !v.trim().is_empty()),
            Predicate::HasClass(class) => element
                .value()
                .has_class(class, CaseSensitivity::CaseSensitive),
            Predicate::TextContains(needle) => text_of(element)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

/// Tag names (any tag when empty) plus predicates that must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query<'q> {
    tags: Vec<&'q str>,
    predicates: Vec<Predicate<'q>>,
}

impl<'q> Query<'q> {
    /// Matches every element.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: &'q str) -> Self {
        Self::tags(&[tag])
    }

    pub fn tags(tags: &[&'q str]) -> Self {
        Self {
            tags: tags.to_vec(),
            predicates: vec![],
        }
    }

    pub fn headings() -> Self {
        Self::tags(&HEADINGS)
    }

    pub fn with(mut self, predicate: Predicate<'q>) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn attr_equals(self, name: &'q str, value: &'q str) -> Self {
        self.with(Predicate::AttrEquals(name, value))
    }

    pub fn attr_prefix(self, name: &'q str, prefix: &'q str) -> Self {
        self.with(Predicate::AttrPrefix(name, prefix))
    }

    pub fn attr_contains(self, name: &'q str, needle: &'q str) -> Self {
        self.with(Predicate::AttrContains(name, needle))
    }

    pub fn has_attr(self, name: &'q str) -> Self {
        self.with(Predicate::HasAttr(name))
    }

    pub fn class(self, class: &'q str) -> Self {
        self.with(Predicate::HasClass(class))
    }

    pub fn text_contains(self, needle: &'q str) -> Self {
        self.with(Predicate::TextContains(needle))
    }

    pub fn matches(&self, element: &ElementRef) -> bool {
        let name = element.value().name();
        (self.tags.is_empty() || self.tags.iter().any(|t| t.eq_ignore_ascii_case(name)))
            && self.predicates.iter().all(|p| p.matches(element))
    }
}

/// First descendant of `scope` (excluding `scope` itself) matching `query`.
pub fn find_first<'a>(scope: ElementRef<'a>, query: &Query) -> Option<ElementRef<'a>> {
    scope
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|e| query.matches(e))
}

/// Every descendant of `scope` (excluding `scope` itself) matching `query`, in document order.
pub fn find_all<'a>(scope: ElementRef<'a>, query: &Query) -> Vec<ElementRef<'a>> {
    scope
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|e| query.matches(e))
        .collect()
}

/// `element` itself if it matches, otherwise its first matching descendant.
pub fn find_self_or_first<'a>(element: ElementRef<'a>, query: &Query) -> Option<ElementRef<'a>> {
    if query.matches(&element) {
        Some(element)
    } else {
        find_first(element, query)
    }
}

/// `element` itself if it matches, followed by every matching descendant.
pub fn find_self_and_all<'a>(element: ElementRef<'a>, query: &Query) -> Vec<ElementRef<'a>> {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| query.matches(e))
        .collect()
}

/// Direct child elements of `element` matching `query`.
pub fn children<'a>(element: ElementRef<'a>, query: &Query) -> Vec<ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| query.matches(e))
        .collect()
}

/// Nearest following sibling that is an element, skipping text and comments.
pub fn next_sibling_element(element: ElementRef) -> Option<ElementRef> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Nearest preceding sibling that is an element, skipping text and comments.
pub fn prev_sibling_element(element: ElementRef) -> Option<ElementRef> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

/// Nearest following sibling element matching `query`.
pub fn next_sibling_matching<'a>(element: ElementRef<'a>, query: &Query) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| query.matches(e))
}

pub fn parent_element(element: ElementRef) -> Option<ElementRef> {
    element.parent().and_then(ElementRef::wrap)
}

/// Nearest enclosing element (excluding `element` itself) matching `query`.
pub fn enclosing<'a>(element: ElementRef<'a>, query: &Query) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| query.matches(e))
}

/// Every element matching `query` that starts after `element` in document order, anywhere
/// in the document (including `element`'s own descendants).
pub fn find_all_after<'a>(element: ElementRef<'a>, query: &Query) -> Vec<ElementRef<'a>> {
    let start = element.id();
    let root = element.ancestors().last().unwrap_or(*element);
    root.descendants()
        .skip_while(|node| node.id() != start)
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|e| query.matches(e))
        .collect()
}

/// Concatenated text of `element` with whitespace runs collapsed to single spaces.
pub fn text_of(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub fn attr_of(element: &ElementRef, name: &str) -> Option<String> {
    element.value().attr(name).map(|v| v.trim().to_owned())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
