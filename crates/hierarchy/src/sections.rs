//! Section grouping.
//!
//! Editors express tabs and sections inside one folder by putting a delimiter
//! in sibling names: `Tab A/01_poster.pdf`, `Tab A/02_flyer.pdf` and
//! `Tab B/video_Intro` become two synthetic folders, `Tab A` and `Tab B`.
//! The remainder of each name is grouped again inside its bucket, so
//! `Tab A/Week 1/poster.pdf` nests two levels deep.

use trellis_provider::RawNode;

/// A provider node plus the part of its name not yet consumed by buckets.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) node: RawNode,
    pub(crate) name: String,
}
impl From<RawNode> for Entry {
    fn from(node: RawNode) -> Self {
        let name = node.name.clone();
        Self { node, name }
    }
}

#[derive(Debug)]
pub(crate) enum Slot {
    Entry(Entry),
    Bucket { segment: String, members: Vec<Entry> },
}

enum Pending {
    Entry(Entry),
    Bucket,
}

/// Splits `name` into a leading segment and the rest. Both must be non-blank.
fn split<'a>(name: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    let (segment, rest) = name.split_once(delimiter)?;
    let (segment, rest) = (segment.trim(), rest.trim());
    (!segment.is_empty() && !rest.is_empty()).then_some((segment, rest))
}

/// Groups siblings by leading name segment.
///
/// Each bucket takes the position of its first member; everything else keeps
/// its enumeration position. An empty or absent delimiter disables grouping.
pub(crate) fn group(entries: Vec<Entry>, delimiter: Option<&str>) -> Vec<Slot> {
    let Some(delimiter) = delimiter.filter(|d| !d.is_empty()) else {
        return entries.into_iter().map(Slot::Entry).collect();
    };
    let mut pending = Vec::with_capacity(entries.len());
    let mut buckets: Vec<(String, Vec<Entry>)> = Vec::new();
    for mut entry in entries {
        let Some((segment, rest)) = split(&entry.name, delimiter).map(|(s, r)| (s.to_string(), r.to_string())) else {
            pending.push(Pending::Entry(entry));
            continue;
        };
        entry.name = rest;
        match buckets.iter_mut().find(|(existing, _)| *existing == segment) {
            Some((_, members)) => members.push(entry),
            None => {
                pending.push(Pending::Bucket);
                buckets.push((segment, vec![entry]));
            },
        }
    }
    // Buckets were created in the same order their placeholders were pushed.
    let mut buckets = buckets.into_iter();
    pending
        .into_iter()
        .filter_map(|slot| match slot {
            Pending::Entry(entry) => Some(Slot::Entry(entry)),
            Pending::Bucket => buckets.next().map(|(segment, members)| Slot::Bucket { segment, members }),
        })
        .collect()
}
