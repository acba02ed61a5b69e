//! Highlighting of a name before the source is parsed.
//!
//! Every occurrence of the name in the `.bib` source is wrapped in markup,
//! so it shows up highlighted in every field it appears in, e.g. the own
//! name in author lists of a publication page.

/// Markup used by [`highlight_default`]
pub fn default_markup(name: &str) -> String {
    format!("<span style='font-weight: bolder; color: #000'>{}</span>", name)
}

/// Replace every occurrence of `name` in `src` by `markup(name)`.
/// The name is matched literally and case-sensitively; an empty name
/// leaves the source unchanged.
pub fn highlight<F>(src: &str, name: &str, markup: F) -> String
where
    F: Fn(&str) -> String,
{
    if name.is_empty() {
        return src.to_string();
    }
    let count = src.matches(name).count();
    log::debug!("highlighting {} occurrences of {:?}", count, name);
    if count == 0 {
        return src.to_string();
    }
    src.replace(name, &markup(name))
}

/// [`highlight`] with [`default_markup`]
pub fn highlight_default(src: &str, name: &str) -> String {
    highlight(src, name, default_markup)
}
