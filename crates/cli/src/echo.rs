use owo_colors::OwoColorize;

use harvest_core::PostPatternResult;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Harvest".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Infer forum post patterns from web pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 250.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print the inferred selectors
pub fn print_pattern_details(result: &PostPatternResult) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Post Patterns".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    let rows = [
        ("Posts:", &result.xpath_pattern),
        ("Text:", &result.text_xpath_pattern),
        ("Link:", &result.url_xpath_pattern),
        ("Date:", &result.date_xpath_pattern),
        ("User:", &result.user_xpath_pattern),
    ];
    for (label, selector) in rows {
        match selector {
            Some(selector) => eprintln!("  {} {}", label.dimmed(), selector.to_string().bright_white()),
            None => eprintln!("  {} {}", label.dimmed(), "none".dimmed()),
        }
    }
    if let Some(score) = result.xpath_score {
        eprintln!("  {} {}", "Score:".dimmed(), format!("{:.3}", score).bright_white());
    }
    eprintln!("  {} {}\n", "Count:".dimmed(), result.post_count().to_string().bright_white());
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
