//! Directory entities and the macros that define them

pub mod directory;
pub mod macros;

pub use directory::{Category, Location, Shop, Tag, Tool};

/// URL-safe form of a name: lowercase ASCII alphanumerics separated by `-`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Alpha Tool"), "alpha-tool");
        assert_eq!(slugify("  C++ / Rust!  "), "c-rust");
        assert_eq!(slugify("alpha-tool"), "alpha-tool");
        assert_eq!(slugify("---"), "");
    }
}
