/// Format a float as New Taiwan dollars with thousands separators: NT$1,234
///
/// Statement amounts are whole dollars; anything finer is rounded.
pub fn twd(val: f64) -> String {
    let rounded = val.round();
    let negative = rounded < 0.0;
    let int_part = format!("{:.0}", rounded.abs());

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-NT${with_commas}")
    } else {
        format!("NT${with_commas}")
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
