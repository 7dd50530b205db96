use indexmap::IndexMap;

/// Property name to value for one selector, in insertion order.
pub type PropertyMap = IndexMap<String, String>;

/// Normalizes a property name to its kebab-case form.
///
/// `backgroundColor` becomes `background-color`, `WebkitTransition` becomes
/// `-webkit-transition`. Custom properties (`--foo`) are kept as written.
pub fn canonical_property_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        return name.to_string();
    }

    if !name.chars().any(|c| c.is_ascii_lowercase()) {
        return name.to_ascii_lowercase();
    }

    let mut out = String::with_capacity(name.len() + 4);
    // Vendor prefixes such as `WebkitTransform`
    if ["Webkit", "Moz", "Ms"].iter().any(|v| name.starts_with(v)) {
        out.push('-');
    }
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Rebuilds a property map with canonical keys. On collisions the later entry wins.
pub fn canonicalize_map(map: PropertyMap) -> PropertyMap {
    let mut out = PropertyMap::with_capacity(map.len());
    for (name, value) in map {
        out.insert(canonical_property_name(&name), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_to_kebab_case() {
        assert_eq!(canonical_property_name("backgroundColor"), "background-color");
        assert_eq!(canonical_property_name("borderTopLeftRadius"), "border-top-left-radius");
        assert_eq!(canonical_property_name("color"), "color");
        assert_eq!(canonical_property_name(" font-size "), "font-size");
        assert_eq!(canonical_property_name("WebkitTransition"), "-webkit-transition");
        assert_eq!(canonical_property_name("-webkit-box-shadow"), "-webkit-box-shadow");
        assert_eq!(canonical_property_name("--MainColor"), "--MainColor");
        assert_eq!(canonical_property_name("COLOR"), "color");
        assert_eq!(canonical_property_name("Color"), "color");
    }

    #[test]
    fn canonicalize_keeps_order() {
        let mut map = PropertyMap::new();
        map.insert("fontSize".into(), "12px".into());
        map.insert("color".into(), "red".into());
        map.insert("font-size".into(), "14px".into());
        let map = canonicalize_map(map);
        assert_eq!(
            map.into_iter().collect::<Vec<_>>(),
            vec![
                ("font-size".to_string(), "14px".to_string()),
                ("color".to_string(), "red".to_string())
            ]
        );
    }
}
