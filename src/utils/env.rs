//! 環境變數展開
//!
//! `%windir%\system32\msiexec.exe` 這種 Windows 寫法用 [`expand_path`]，
//! TOML 設定檔裡的 `${VAR}` 用 [`substitute_env_vars`]。找不到的變數保持原樣。

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%([^%\s]+)%").expect("static regex"))
}

fn dollar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"))
}

/// 展開 `%VAR%`，規則跟 ExpandEnvironmentStrings 一樣：未定義的變數不動
pub fn expand_path(path: &str) -> String {
    expand_path_with(path, |name| std::env::var(name).ok())
}

pub fn expand_path_with<F>(path: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    percent_re()
        .replace_all(path, |caps: &Captures| {
            let name = &caps[1];
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// 替換 `${VAR}`
pub fn substitute_env_vars(content: &str) -> String {
    dollar_re()
        .replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}
