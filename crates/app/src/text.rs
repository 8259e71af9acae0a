use unicode_segmentation::UnicodeSegmentation;

/// Shorten a label to at most `max_graphemes` visible characters, replacing
/// the tail with "..." when it does not fit.
pub fn truncate_label(text: &str, max_graphemes: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max_graphemes {
        return text.to_string();
    }
    let keep = max_graphemes.saturating_sub(3);
    let mut truncated: String = graphemes[..keep].concat();
    truncated.push_str("...");
    truncated
}

/// "mm:ss" display of a position or duration.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
