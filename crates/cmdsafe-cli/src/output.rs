//! Output formatting helpers for the CLI.

use chrono::{DateTime, Local, Utc};

use cmdsafe_core::CommandRecord;

/// Render a save time in the local timezone.
pub fn format_saved_at(saved_at: &DateTime<Utc>) -> String {
    saved_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Quote `word` for a POSIX shell if it contains anything special.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// The saved command as a single shell-quoted line.
pub fn command_line(record: &CommandRecord) -> String {
    std::iter::once(record.executable.as_str())
        .chain(record.args.iter().map(String::as_str))
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn record_json(record: &CommandRecord) -> serde_json::Value {
    serde_json::json!({
        "name": record.name,
        "executable": record.executable,
        "args": record.args,
    })
}

/// Print a decrypted record in human-readable format.
pub fn print_record(record: &CommandRecord, quiet: bool) {
    if !quiet {
        println!("Handle:     {}", record.name);
        println!("Executable: {}", record.executable);
        println!("Arguments:  {}", record.args.len());
        println!();
    }
    println!("{}", command_line(record));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote_plain_words() {
        assert_eq!(shell_quote("-pS3cret"), "-pS3cret");
        assert_eq!(shell_quote("/usr/bin/env"), "/usr/bin/env");
    }

    #[test]
    fn test_shell_quote_special_words() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("SELECT 1"), "'SELECT 1'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_command_line() {
        let record = CommandRecord::new("q", "psql", ["-c", "select now()"]).unwrap();
        assert_eq!(command_line(&record), "psql -c 'select now()'");
    }

    #[test]
    fn test_record_json_fields() {
        let record = CommandRecord::new("q", "psql", ["-c"]).unwrap();
        let json = record_json(&record);
        assert_eq!(json["name"], "q");
        assert_eq!(json["executable"], "psql");
        assert_eq!(json["args"], serde_json::json!(["-c"]));
    }
}
