mod component;
mod decoded;
mod metadata;
mod prefix;
mod suffix;
mod url;

pub use self::component::ComponentType;
pub use self::decoded::DecodedName;
pub use self::metadata::ItemMetadata;
pub use self::prefix::Prefix;
pub use self::suffix::Suffix;
pub use self::url::TransformedUrl;

fn sanitize(s: impl AsRef<str>) -> String {
    s.as_ref().trim().to_lowercase()
}
