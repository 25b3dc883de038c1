//! The resolved hierarchy model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use trellis_decode::{ComponentType, ItemMetadata, Prefix, Signals, Suffix, TransformedUrl, classify, decode, url};
use trellis_provider::RawNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    File,
    Folder,
}

/// Why a folder was included without its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminated {
    /// The folder sits at the maximum depth.
    Depth,
    /// The folder's identity already occurs among its ancestors.
    Cycle,
}

/// One node of a resolved hierarchy.
///
/// Trees are built once and never mutated afterwards. `children` is always
/// serialized, even when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyItem {
    pub id: String,
    pub original_name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub node_type: NodeType,
    pub depth: u32,
    pub prefixes: BTreeSet<Prefix>,
    pub suffixes: BTreeSet<Suffix>,
    pub order: Option<u32>,
    pub mime_type: String,
    pub size: Option<u64>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub modified_time: Option<OffsetDateTime>,
    pub thumbnail_link: Option<String>,
    pub component_type: ComponentType,
    pub transformed_url: TransformedUrl,
    pub metadata: ItemMetadata,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub terminated: Option<Terminated>,
    pub children: Vec<HierarchyItem>,
}

impl HierarchyItem {
    /// Decodes a provider node into an item without children.
    pub fn from_node(node: &RawNode, depth: u32) -> Self {
        Self::from_named(node, &node.name, depth)
    }

    /// Like [`from_node()`](Self::from_node), but decodes `name` instead of
    /// the node's own name. Used for section members, whose leading
    /// segments have already been consumed by their buckets.
    pub(crate) fn from_named(node: &RawNode, name: &str, depth: u32) -> Self {
        let decoded = decode(name);
        let metadata = ItemMetadata::from_description(node.description.as_deref());
        let transformed_url = url::transform(&node.id);
        let urls: Vec<&str> = transformed_url.iter().chain(metadata.url.as_deref()).collect();
        let component_type = classify(&Signals {
            raw_name: name,
            decoded: &decoded,
            mime_type: &node.mime_type,
            metadata: &metadata,
            urls: &urls,
        });
        Self {
            id: node.id.clone(),
            original_name: node.name.clone(),
            display_name: decoded.display_name,
            description: node.description.clone(),
            node_type: match node.is_folder() {
                true => NodeType::Folder,
                false => NodeType::File,
            },
            depth,
            prefixes: decoded.prefixes,
            suffixes: decoded.suffixes,
            order: decoded.order,
            mime_type: node.mime_type.clone(),
            size: node.size,
            modified_time: node.modified_time,
            thumbnail_link: node.thumbnail_link.clone(),
            component_type,
            transformed_url,
            metadata,
            terminated: None,
            children: Vec::new(),
        }
    }

    /// A synthetic folder standing in for a shared leading name segment.
    pub(crate) fn bucket(parent_id: &str, segment: &str, depth: u32) -> Self {
        let node = RawNode::folder(format!("{parent_id}/{segment}"), segment).with_parent(parent_id);
        Self::from_node(&node, depth)
    }

    pub fn is_folder(&self) -> bool {
        self.node_type == NodeType::Folder
    }

    /// Numbered items first (ascending), unnumbered after.
    pub(crate) fn sort_key(&self) -> (bool, u32) {
        (self.order.is_none(), self.order.unwrap_or_default())
    }

    /// Descends by display name, case-insensitively. An empty path is `self`.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&HierarchyItem> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        let wanted = first.as_ref().to_lowercase();
        self.children
            .iter()
            .find(|child| child.display_name.to_lowercase() == wanted)
            .and_then(|child| child.find(rest))
    }

    /// Number of items in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(HierarchyItem::count).sum::<usize>()
    }

    /// Depth-first, pre-order iteration over this subtree.
    pub fn flatten(&self) -> Flatten<'_> {
        Flatten { stack: vec![self] }
    }
}

pub struct Flatten<'a> {
    stack: Vec<&'a HierarchyItem>,
}
impl<'a> Iterator for Flatten<'a> {
    type Item = &'a HierarchyItem;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.stack.pop()?;
        self.stack.extend(item.children.iter().rev());
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, name: &str, mime_type: &str) -> HierarchyItem {
        HierarchyItem::from_node(&RawNode::new(id, name, mime_type), 1)
    }

    fn tree() -> HierarchyItem {
        let mut root = HierarchyItem::from_node(&RawNode::folder("root", "Root"), 0);
        let mut tab = HierarchyItem::from_node(&RawNode::folder("tab", "01_Spring Tab"), 1);
        tab.children.push(file("poster", "0005_poster.pdf", "application/pdf"));
        root.children.push(tab);
        root.children.push(file("cta", "button_cta.txt", "text/plain"));
        root
    }

    #[test]
    fn test_from_node_decodes_everything() {
        let node = RawNode::new("abc", "0005_button_Sign up_download.pdf", "application/pdf")
            .with_description("Join!\n\"copy\":\"Sign up today\"")
            .with_size(2048);
        let item = HierarchyItem::from_node(&node, 2);
        assert_eq!(item.order, Some(5));
        assert_eq!(item.display_name, "Sign up.pdf");
        assert_eq!(item.prefixes, BTreeSet::from([Prefix::Button]));
        assert_eq!(item.suffixes, BTreeSet::from([Suffix::Download]));
        assert_eq!(item.component_type, ComponentType::Button);
        assert_eq!(item.node_type, NodeType::File);
        assert_eq!(item.depth, 2);
        assert_eq!(item.metadata.copy.as_deref(), Some("Sign up today"));
        assert_eq!(item.transformed_url.download, "https://drive.google.com/uc?id=abc&export=download");
        assert!(item.children.is_empty());
    }

    #[test]
    fn test_form_url_in_metadata_wins() {
        let node = RawNode::new("f", "image_Survey.png", "image/png")
            .with_description(r#""formUrl":"https://docs.google.com/forms/d/e/x/viewform""#);
        assert_eq!(HierarchyItem::from_node(&node, 0).component_type, ComponentType::GoogleForm);
    }

    #[test]
    fn test_bucket() {
        let bucket = HierarchyItem::bucket("root", "02_modal_Tab B", 1);
        assert_eq!(bucket.id, "root/02_modal_Tab B");
        assert!(bucket.is_folder());
        assert_eq!(bucket.order, Some(2));
        assert_eq!(bucket.display_name, "Tab B");
        assert_eq!(bucket.component_type, ComponentType::Modal);
    }

    #[test]
    fn test_helpers() {
        let root = tree();
        assert_eq!(root.count(), 4);
        let ids: Vec<&str> = root.flatten().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["root", "tab", "poster", "cta"]);
        assert_eq!(root.find(&["SPRING TAB", "poster.pdf"]).map(|i| i.id.as_str()), Some("poster"));
        assert_eq!(root.find::<&str>(&[]).map(|i| i.id.as_str()), Some("root"));
        assert!(root.find(&["nope"]).is_none());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(tree()).unwrap();
        assert_eq!(json["nodeType"], "FOLDER");
        assert_eq!(json["componentType"], "generic");
        assert!(json.get("terminated").is_none());
        let cta = &json["children"][1];
        assert_eq!(cta["nodeType"], "FILE");
        assert_eq!(cta["componentType"], "button");
        assert_eq!(cta["prefixes"], serde_json::json!(["button"]));
        assert_eq!(cta["children"], serde_json::json!([]));
        assert_eq!(cta["transformedUrl"]["preview"], "https://lh3.googleusercontent.com/d/cta");
        let poster = &json["children"][0]["children"][0];
        assert_eq!(poster["order"], 5);
        assert_eq!(poster["componentType"], "pdf");
        assert_eq!(poster["displayName"], "poster.pdf");
    }

    #[test]
    fn test_json_round_trip_through_cache_format() {
        let mut root = tree();
        root.children[0].terminated = Some(Terminated::Cycle);
        root.modified_time = Some(time::macros::datetime!(2024-03-01 12:00 UTC));
        let json = serde_json::to_string(&root).unwrap();
        assert_eq!(serde_json::from_str::<HierarchyItem>(&json).unwrap(), root);
    }
}
