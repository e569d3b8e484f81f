//! Description templates.
//!
//! Placeholders: `{name}`, `{brand}`, `{category}`, `{subcategory}`.
//! Anything else in braces is left untouched.

/// Fills placeholders in one left-to-right pass; substituted values are
/// copied verbatim and never scanned for placeholders themselves.
#[must_use]
pub fn render_template(
    template: &str,
    name: &str,
    brand: &str,
    category: &str,
    subcategory: &str,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let filled = [
            ("{name}", name),
            ("{brand}", brand),
            ("{category}", category),
            ("{subcategory}", subcategory),
        ]
        .into_iter()
        .find(|(placeholder, _)| tail.starts_with(placeholder));
        match filled {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
