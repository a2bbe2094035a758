const BYTE_SIZE_UNITS: [&str; 8] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB"];

/// Render a byte count in binary units with four significant digits,
/// e.g. `1.5 KiB`, `812 B`, `4 GiB`.
pub fn size_str(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < BYTE_SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", four_significant(value), BYTE_SIZE_UNITS[unit])
}

fn four_significant(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let int_digits = (value.abs().log10().floor() as i32 + 1).max(1);
    let decimals = (4 - int_digits).max(0) as usize;
    let s = format!("{value:.decimals$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
