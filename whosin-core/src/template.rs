// ABOUTME: Positional `{0}`, `{1}` placeholder substitution for configured message templates
// ABOUTME: Single pass, so substituted values are never re-expanded

/// Render `template`, replacing every `{N}` with `args[N]`.
///
/// Placeholders without a matching argument, and braces that do not form a
/// placeholder, are copied through unchanged.
pub fn render(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            let value = args.get(index)?;
            Some((value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
