//! Formatting helpers for terminal output.

use chrono::{DateTime, Utc};

use taskdesk_core::models::{Profile, Todo, TodoInfo, User};

/// Format a phone number for display
/// Normalizes Russian numbers (+7, 8 trunk prefix, or bare 10 digits) to
/// +7 (XXX) XXX-XX-XX; anything else is shown as entered
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    let national = match digits.len() {
        10 => &digits[..],
        11 if digits.starts_with('7') || digits.starts_with('8') => &digits[1..],
        _ => return phone.to_string(),
    };
    format!(
        "+7 ({}) {}-{}-{}",
        &national[0..3],
        &national[3..6],
        &national[6..8],
        &national[8..10]
    )
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %d, %Y").to_string()
}

pub fn todo_line(todo: &Todo) -> String {
    let mark = if todo.is_done { "x" } else { " " };
    format!(
        "[{}] {:>5}  {:<50}  {}",
        mark,
        todo.id,
        truncate_string(&todo.title, 50),
        format_date(&todo.created)
    )
}

pub fn todo_summary(info: &TodoInfo) -> String {
    format!(
        "{} total, {} in progress, {} completed",
        info.all, info.in_work, info.completed
    )
}

pub fn user_line(user: &User) -> String {
    format!(
        "{:>5}  {:<20}  {:<30}  {:<16}  {:<7}  {}",
        user.id,
        truncate_string(&user.username, 20),
        truncate_string(&user.email, 30),
        user.phone_number.as_deref().map(format_phone).unwrap_or_else(|| "-".into()),
        if user.is_blocked { "blocked" } else { "active" },
        user.roles_display()
    )
}

pub fn user_details(user: &User) -> String {
    format!(
        "ID:       {}\nUsername: {}\nEmail:    {}\nPhone:    {}\nJoined:   {}\nStatus:   {}\nRoles:    {}",
        user.id,
        user.username,
        user.email,
        user.phone_number.as_deref().map(format_phone).unwrap_or_else(|| "-".into()),
        user.date.as_ref().map(format_date).unwrap_or_else(|| "-".into()),
        if user.is_blocked { "blocked" } else { "active" },
        user.roles_display()
    )
}

pub fn profile_details(profile: &Profile) -> String {
    let roles = if profile.roles.is_empty() {
        "-".to_string()
    } else {
        profile
            .roles
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Username: {}\nEmail:    {}\nPhone:    {}\nRoles:    {}",
        profile.username,
        profile.email,
        profile.phone_number.as_deref().map(format_phone).unwrap_or_else(|| "-".into()),
        roles
    )
}
