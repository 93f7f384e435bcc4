const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size in 1024-based units with two decimals.
///
/// The unit is picked before rounding, so values just under a unit boundary read as
/// `1024.00` of the smaller unit (1048575 bytes is `"1024.00 KB"`).
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    format!("{scaled:.2} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::format_file_size;

    #[test]
    fn zero_is_special_cased() {
        assert_eq!(format_file_size(0), "0 Bytes");
    }

    #[test]
    fn scales_to_largest_unit() {
        assert_eq!(format_file_size(1), "1.00 Bytes");
        assert_eq!(format_file_size(1023), "1023.00 Bytes");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 512 * 1024), "5.50 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn rounds_after_choosing_the_unit() {
        assert_eq!(format_file_size(1_048_575), "1024.00 KB");
        assert_eq!(format_file_size(1_048_576), "1.00 MB");
    }

    #[test]
    fn stays_in_gigabytes_past_the_table() {
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048.00 GB");
    }
}
