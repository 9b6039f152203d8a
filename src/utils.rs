use std::path::Path;

/// get relative path from current working directory
pub fn get_relative_path(path: &Path) -> String {
    if let Ok(current_dir) = std::env::current_dir() {
        if let Ok(relative) = path.strip_prefix(&current_dir) {
            let relative = relative.display().to_string();
            return if relative.is_empty() { ".".to_string() } else { relative };
        }
    }
    path.display().to_string()
}

/// truncate a string to a maximum length with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

pub fn format_age(days: Option<i64>) -> String {
    match days {
        Some(0) => "Today".to_string(),
        Some(1) => "1 day ago".to_string(),
        Some(days) => format!("{} days ago", days),
        None => "Unknown".to_string(),
    }
}
