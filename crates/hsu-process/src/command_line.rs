//! Command-line construction and switch parsing.
//!
//! A [`CommandLine`] is a program path plus an ordered argument vector.
//! Switches use the `--name` / `--name=value` syntax; anything after a bare
//! `--` is a plain argument and is never interpreted as a switch.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Prefix that marks an argument as a switch.
pub const SWITCH_PREFIX: &str = "--";

/// Separates a switch name from its value.
pub const SWITCH_VALUE_SEPARATOR: char = '=';

/// A bare `--` ends switch parsing.
pub const SWITCH_TERMINATOR: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn from_parts<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Command line of the running process.
    ///
    /// The program is the resolved path of the current executable rather
    /// than `argv[0]`, so a relaunch does not depend on `PATH` or on the
    /// working directory.
    pub fn from_current_process() -> io::Result<Self> {
        let program = std::env::current_exe()?;
        Ok(Self::from_parts(program, std::env::args_os().skip(1)))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.as_os_str().to_os_string());
        argv.extend(self.args.iter().cloned());
        argv
    }

    pub fn append_arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Adds `--name`. The switch goes ahead of a `--` terminator, if there
    /// is one, so it stays visible to [`switches`](Self::switches).
    pub fn append_switch(&mut self, name: &str) -> &mut Self {
        self.insert_before_terminator(format!("{SWITCH_PREFIX}{name}").into());
        self
    }

    /// Adds `--name=value`, placed like [`append_switch`](Self::append_switch).
    pub fn append_switch_with_value(
        &mut self,
        name: &str,
        value: impl AsRef<OsStr>,
    ) -> &mut Self {
        let mut arg = OsString::from(format!("{SWITCH_PREFIX}{name}{SWITCH_VALUE_SEPARATOR}"));
        arg.push(value.as_ref());
        self.insert_before_terminator(arg);
        self
    }

    fn terminator_position(&self) -> usize {
        self.args
            .iter()
            .position(|arg| arg.as_os_str() == SWITCH_TERMINATOR)
            .unwrap_or(self.args.len())
    }

    fn insert_before_terminator(&mut self, arg: OsString) {
        let index = self.terminator_position();
        self.args.insert(index, arg);
    }

    /// Switches in order of appearance, stopping at the terminator.
    pub fn switches(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.args
            .iter()
            .take_while(|arg| arg.as_os_str() != SWITCH_TERMINATOR)
            .filter_map(|arg| arg.to_str().and_then(parse_switch))
    }

    pub fn has_switch(&self, name: &str) -> bool {
        self.switches().any(|(switch, _)| switch == name)
    }

    /// Value of the last occurrence of `name`. A switch given without a
    /// value yields an empty string.
    pub fn switch_value(&self, name: &str) -> Option<&str> {
        self.switches()
            .filter(|(switch, _)| *switch == name)
            .last()
            .map(|(_, value)| value.unwrap_or(""))
    }

    pub fn switch_count(&self, name: &str) -> usize {
        self.switches().filter(|(switch, _)| *switch == name).count()
    }

    /// Removes every occurrence of `name` ahead of the terminator.
    pub fn remove_switch(&mut self, name: &str) -> &mut Self {
        let terminator = self.terminator_position();

        let mut index = 0;
        self.args.retain(|arg| {
            let keep = index >= terminator
                || !arg
                    .to_str()
                    .and_then(parse_switch)
                    .is_some_and(|(switch, _)| switch == name);
            index += 1;
            keep
        });
        self
    }

    /// Serializes into a single Windows command-line string.
    ///
    /// Each element is quoted following the MSVCRT `CommandLineToArgvW`
    /// rules, so the child parses back exactly the same argument vector.
    pub fn to_command_line_string(&self) -> String {
        self.argv()
            .iter()
            .map(|arg| quote_windows_arg(&arg.to_string_lossy()).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Arguments only, serialized the same way as
    /// [`to_command_line_string`](Self::to_command_line_string).
    ///
    /// Arguments that are not valid Unicode are converted lossily, so this
    /// string is for display and logging. Launching uses
    /// `arguments_wide`.
    pub fn arguments_string(&self) -> String {
        self.args
            .iter()
            .map(|arg| quote_windows_arg(&arg.to_string_lossy()).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Arguments serialized as UTF-16 for `CreateProcessW`, keeping
    /// unpaired surrogates intact.
    #[cfg(windows)]
    pub fn arguments_wide(&self) -> Vec<u16> {
        use std::os::windows::ffi::OsStrExt;

        let mut wide = Vec::new();
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                wide.push(u16::from(b' '));
            }
            let units: Vec<u16> = arg.encode_wide().collect();
            wide.extend(quote_windows_arg_wide(&units));
        }
        wide
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_line_string())
    }
}

/// Splits `--name[=value]` into its parts.
pub fn parse_switch(arg: &str) -> Option<(&str, Option<&str>)> {
    let body = arg.strip_prefix(SWITCH_PREFIX)?;
    if body.is_empty() {
        return None;
    }
    match body.split_once(SWITCH_VALUE_SEPARATOR) {
        Some((name, value)) => Some((name, Some(value))),
        None => Some((body, None)),
    }
}

/// Quotes one argument for a Windows command line.
pub fn quote_windows_arg(arg: &str) -> Cow<'_, str> {
    let units: Vec<u16> = arg.encode_utf16().collect();
    if !needs_windows_quotes(&units) {
        return Cow::Borrowed(arg);
    }
    // Input was valid UTF-16 and quoting only adds ASCII, so nothing is lost.
    Cow::Owned(String::from_utf16_lossy(&quote_windows_arg_wide(&units)))
}

/// [`quote_windows_arg`] over UTF-16 code units. Works on arguments that are
/// not valid Unicode.
pub fn quote_windows_arg_wide(arg: &[u16]) -> Vec<u16> {
    const QUOTE: u16 = b'"' as u16;
    const BACKSLASH: u16 = b'\\' as u16;

    if !needs_windows_quotes(arg) {
        return arg.to_vec();
    }

    let mut quoted = Vec::with_capacity(arg.len() + 2);
    quoted.push(QUOTE);
    let mut backslashes = 0usize;
    for &unit in arg {
        match unit {
            BACKSLASH => backslashes += 1,
            QUOTE => {
                // Backslashes preceding a quote are escapes; double them and
                // escape the quote itself.
                quoted.extend(std::iter::repeat(BACKSLASH).take(backslashes * 2 + 1));
                quoted.push(QUOTE);
                backslashes = 0;
            }
            _ => {
                quoted.extend(std::iter::repeat(BACKSLASH).take(backslashes));
                quoted.push(unit);
                backslashes = 0;
            }
        }
    }
    // Trailing backslashes sit in front of the closing quote.
    quoted.extend(std::iter::repeat(BACKSLASH).take(backslashes * 2));
    quoted.push(QUOTE);
    quoted
}

fn needs_windows_quotes(arg: &[u16]) -> bool {
    arg.is_empty()
        || arg
            .iter()
            .any(|&unit| matches!(unit, 0x20 | 0x09 | 0x0A | 0x0B | 0x22))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CommandLine {
        CommandLine::from_parts("/tmp/test-bin", ["--verbose", "--level=3", "plain"])
    }

    #[test]
    fn test_append_switches() {
        let mut cl = CommandLine::new("/tmp/test-bin");
        cl.append_switch("flag").append_switch_with_value("client", "EchoFunction");

        let args: Vec<_> = cl.args().iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["--flag", "--client=EchoFunction"]);
        assert_eq!(cl.argv()[0], OsString::from("/tmp/test-bin"));
    }

    #[test]
    fn test_switch_lookup() {
        let cl = sample();
        assert!(cl.has_switch("verbose"));
        assert_eq!(cl.switch_value("verbose"), Some(""));
        assert_eq!(cl.switch_value("level"), Some("3"));
        assert_eq!(cl.switch_value("plain"), None);
        assert!(!cl.has_switch("missing"));
    }

    #[test]
    fn test_value_containing_separator_is_kept_whole() {
        let mut cl = CommandLine::new("bin");
        cl.append_switch_with_value("client", "a=b");
        assert_eq!(cl.switch_value("client"), Some("a=b"));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let cl = CommandLine::from_parts("bin", ["--client=first", "--client=second"]);
        assert_eq!(cl.switch_value("client"), Some("second"));
        assert_eq!(cl.switch_count("client"), 2);
    }

    #[test]
    fn test_terminator_stops_switch_parsing() {
        let mut cl = CommandLine::from_parts("bin", ["--a", "--", "--client=child"]);
        assert!(cl.has_switch("a"));
        assert!(!cl.has_switch("client"));

        cl.remove_switch("client");
        assert_eq!(cl.args().len(), 3);
    }

    #[test]
    fn test_switches_are_added_ahead_of_terminator() {
        let mut cl = CommandLine::from_parts("bin", ["--keep", "--", "filter"]);
        cl.append_switch_with_value("client", "EchoFunction")
            .append_switch("debug-on-start");

        let args: Vec<_> = cl.args().iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["--keep", "--client=EchoFunction", "--debug-on-start", "--", "filter"]
        );
        assert_eq!(cl.switch_value("client"), Some("EchoFunction"));
        assert!(cl.has_switch("debug-on-start"));
    }

    #[test]
    fn test_plain_args_still_go_last() {
        let mut cl = CommandLine::from_parts("bin", ["--", "filter"]);
        cl.append_arg("--client=literal");
        assert_eq!(cl.args().last(), Some(&OsString::from("--client=literal")));
        assert!(!cl.has_switch("client"));
    }

    #[test]
    fn test_remove_switch() {
        let mut cl = CommandLine::from_parts(
            "bin",
            ["--client=x", "keep", "--debug-on-start", "--client=y"],
        );
        cl.remove_switch("client");
        assert!(!cl.has_switch("client"));
        assert!(cl.has_switch("debug-on-start"));
        assert_eq!(cl.args().len(), 2);
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("--x"), Some(("x", None)));
        assert_eq!(parse_switch("--x="), Some(("x", Some(""))));
        assert_eq!(parse_switch("--"), None);
        assert_eq!(parse_switch("-x"), None);
        assert_eq!(parse_switch("x"), None);
    }

    #[test]
    fn test_windows_quoting() {
        assert_eq!(quote_windows_arg("simple"), "simple");
        assert_eq!(quote_windows_arg(""), "\"\"");
        assert_eq!(quote_windows_arg("with space"), "\"with space\"");
        assert_eq!(quote_windows_arg("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_windows_arg("C:\\dir with space\\"), "\"C:\\dir with space\\\\\"");
        // Backslashes not followed by a quote stay as they are.
        assert_eq!(quote_windows_arg("C:\\a\\b"), "C:\\a\\b");
    }

    #[test]
    fn test_wide_quoting_keeps_unpaired_surrogates() {
        let wide = |s: &str| s.encode_utf16().collect::<Vec<u16>>();

        let mut arg = wide("--client=a b");
        arg.push(0xD800);
        let mut expected = wide("\"--client=a b");
        expected.push(0xD800);
        expected.extend(wide("\""));
        assert_eq!(quote_windows_arg_wide(&arg), expected);

        assert_eq!(quote_windows_arg_wide(&[0xDC00]), vec![0xDC00]);
        assert_eq!(quote_windows_arg_wide(&wide("say \"hi\"")), wide("\"say \\\"hi\\\"\""));
    }

    #[test]
    #[cfg(windows)]
    fn test_arguments_wide_is_lossless() {
        use std::os::windows::ffi::OsStringExt;

        let odd = OsString::from_wide(&[u16::from(b'x'), 0xD800]);
        let mut cl = CommandLine::from_parts("test.exe", [odd]);
        cl.append_switch_with_value("client", "EchoFunction");

        let mut expected: Vec<u16> = vec![u16::from(b'x'), 0xD800, u16::from(b' ')];
        expected.extend("--client=EchoFunction".encode_utf16());
        assert_eq!(cl.arguments_wide(), expected);
    }

    #[test]
    fn test_command_line_string() {
        let mut cl = CommandLine::new("C:\\Program Files\\test.exe");
        cl.append_switch_with_value("client", "EchoFunction");
        assert_eq!(
            cl.to_command_line_string(),
            "\"C:\\Program Files\\test.exe\" --client=EchoFunction"
        );
        assert_eq!(cl.arguments_string(), "--client=EchoFunction");
        assert_eq!(cl.to_string(), cl.to_command_line_string());
    }

    #[test]
    fn test_from_current_process() {
        let cl = CommandLine::from_current_process().unwrap();
        assert_eq!(cl.program(), std::env::current_exe().unwrap().as_path());
    }
}
