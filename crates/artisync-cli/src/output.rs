use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print `(key, value)` pairs as an aligned two-column listing. Multi-line
/// values continue on indented lines.
pub fn print_fields(fields: &[(&str, String)]) {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in fields {
        let mut lines = value.lines();
        let first = lines.next().unwrap_or("-");
        println!("{:width$}  {}", key, first, width = width);
        for line in lines {
            println!("{:width$}  {}", "", line, width = width);
        }
    }
}
