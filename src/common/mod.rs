//! Common utilities: configuration, environment, errors, logging

pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Extract the project name from a `--project=<name>` runner argument
pub fn parse_project_flag(arg: &str) -> Option<&str> {
    arg.strip_prefix("--project=")
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Project names selected by runner arguments, in order of appearance
pub fn selected_projects<S: AsRef<str>>(args: &[S]) -> impl Iterator<Item = &str> {
    args.iter().filter_map(|arg| parse_project_flag(arg.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_flag() {
        assert_eq!(parse_project_flag("--project=@calcom/web"), Some("@calcom/web"));
        assert_eq!(parse_project_flag("--project="), None);
        assert_eq!(parse_project_flag("--project"), None);
        assert_eq!(parse_project_flag("--workers=2"), None);
        assert_eq!(parse_project_flag("project=@calcom/web"), None);
    }

    #[test]
    fn test_selected_projects_keeps_order() {
        let args = ["test", "--project=b", "--headed", "--project=a", "--project=b"];
        let selected: Vec<_> = selected_projects(&args).collect();
        assert_eq!(selected, vec!["b", "a", "b"]);
    }
}
