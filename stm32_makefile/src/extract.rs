use crate::format::strip_prefix;
use crate::model::ExtractedMakefileInfo;
use crate::target::TargetFamilyTable;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Keys tried for each field, CubeMX spelling first.
const TARGET_KEYS: &[&str] = &["TARGET"];
const CPU_KEYS: &[&str] = &["CPU"];
const FPU_KEYS: &[&str] = &["FPU"];
const FLOAT_ABI_KEYS: &[&str] = &["FLOAT-ABI"];
const MCU_KEYS: &[&str] = &["MCU"];
const LDSCRIPT_KEYS: &[&str] = &["LDSCRIPT", "LINKER_SCRIPT"];
const TARGET_MCU_KEYS: &[&str] = &["TARGET_MCU"];
const OPTIMIZATION_KEYS: &[&str] = &["OPT", "OPTIMIZATION"];
const PREFIX_KEYS: &[&str] = &["PREFIX"];
const C_SOURCES_KEYS: &[&str] = &["C_SOURCES"];
const CXX_SOURCES_KEYS: &[&str] = &["CPP_SOURCES", "CXX_SOURCES"];
const ASM_SOURCES_KEYS: &[&str] = &["ASM_SOURCES", "AS_SOURCES"];
const C_DEFS_KEYS: &[&str] = &["C_DEFS", "C_DEFINITIONS"];
const CXX_DEFS_KEYS: &[&str] = &["CXX_DEFS", "CXX_DEFINITIONS"];
const AS_DEFS_KEYS: &[&str] = &["AS_DEFS", "AS_DEFINITIONS"];
const C_INCLUDES_KEYS: &[&str] = &["C_INCLUDES"];
const LIBRARY_KEYS: &[&str] = &["LIBS", "LIBRARIES"];
const LIBDIR_KEYS: &[&str] = &["LIBDIR", "LIBRARY_DIRECTORIES"];

/// `NAME = value` with any of `=`, `:=`, `::=`, `+=`, `?=`. Group 1 is the
/// variable name, group 2 the raw value.
static ASSIGNMENT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[ \t]*([^\s:#=+?]+)[ \t]*(?:::|[:+?])?=(.*)$").ok());

/// Value of `line` when it assigns one of `keys` (case-insensitive).
fn assigned_value<'a>(keys: &[&str], line: &'a str) -> Option<&'a str> {
    let caps = ASSIGNMENT.as_ref()?.captures(line)?;
    let name = caps.get(1)?.as_str();
    if !keys.iter().any(|key| key.eq_ignore_ascii_case(name)) {
        return None;
    }
    Some(caps.get(2).map_or("", |m| m.as_str()))
}

/// Offset of the first `#` not escaped by a backslash.
fn comment_start(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '#' if !escaped => return Some(i),
            '\\' => escaped = !escaped,
            _ => escaped = false,
        }
    }
    None
}

/// One physical line of a value: `(value, continues, opens a comment)`.
///
/// A trailing `\` continues the line even inside a comment, as in make.
fn split_continuation(line: &str) -> (&str, bool, bool) {
    let trimmed = line.trim();
    let (body, continued) = match trimmed.strip_suffix('\\') {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };
    match comment_start(body) {
        Some(at) => (body[..at].trim(), continued, true),
        None => (body.trim(), continued, false),
    }
}

/// Value on the first assignment line of `key`.
///
/// `None` when the key never appears, `Some("")` when it is assigned
/// nothing on that line.
pub fn extract_single_line(key: &str, makefile: &str) -> Option<String> {
    makefile
        .lines()
        .find_map(|line| assigned_value(&[key], line))
        .map(|value| split_continuation(value).0.to_string())
}

/// One assignment: inline value and the continuation lines after it.
struct Assignment<'a> {
    head: &'a str,
    continuation: Vec<&'a str>,
}

impl<'a> Assignment<'a> {
    fn entries(self) -> impl Iterator<Item = &'a str> {
        std::iter::once(self.head)
            .chain(self.continuation)
            .filter(|entry| !entry.is_empty())
    }
}

/// Every assignment of `keys` in document order.
fn assignments<'a>(keys: &[&str], makefile: &'a str) -> Vec<Assignment<'a>> {
    let mut found = Vec::new();
    let mut lines = makefile.lines();
    while let Some(line) = lines.next() {
        let Some(value) = assigned_value(keys, line) else {
            continue;
        };
        let (head, mut continued, mut commented) = split_continuation(value);
        let mut continuation = Vec::new();
        // 收集续行，直到某行不以 '\' 结尾；注释之后的续行也属于注释
        while continued {
            let Some(next) = lines.next() else { break };
            let (entry, more, comment) = split_continuation(next);
            if !commented {
                continuation.push(entry);
            }
            commented |= comment;
            continued = more;
        }
        found.push(Assignment { head, continuation });
    }
    found
}

/// Entries of a list variable spread over continuation lines.
///
/// Each trimmed continuation line is one entry; the inline head counts only
/// when the assignment continues. Absent keys yield an empty list.
pub fn extract_multi_line(key: &str, makefile: &str) -> Vec<String> {
    assignments(&[key], makefile)
        .into_iter()
        .filter(|assignment| !assignment.continuation.is_empty())
        .flat_map(Assignment::entries)
        .map(str::to_string)
        .collect()
}

/// `-l` tokens of the `LIBS`/`LIBRARIES` assignments, in link order.
pub fn extract_libraries(makefile: &str) -> Vec<String> {
    assignments(LIBRARY_KEYS, makefile)
        .into_iter()
        .flat_map(Assignment::entries)
        .flat_map(str::split_whitespace)
        .filter(|token| token.starts_with("-l"))
        .map(str::to_string)
        .collect()
}

fn first_single_line(keys: &[&str], makefile: &str) -> String {
    keys.iter()
        .find_map(|key| extract_single_line(key, makefile).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| {
            debug!("no value for {}", keys.join("/"));
            String::new()
        })
}

/// `value` with every `$(...)`/`${...}` reference removed, nested ones
/// included.
fn without_references(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut depth = 0usize;
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && matches!(chars.peek(), Some('(' | '{')) {
            chars.next();
            depth += 1;
        } else if depth > 0 {
            match c {
                '(' | '{' => depth += 1,
                ')' | '}' => depth -= 1,
                _ => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// List field: every assignment of `keys`, inline values and continuation
/// lines alike, split on whitespace. Make variable references are dropped.
fn list_field(keys: &[&str], makefile: &str) -> Vec<String> {
    let found = assignments(keys, makefile);
    if found.is_empty() {
        debug!("no assignment of {}", keys.join("/"));
    }
    let mut tokens = Vec::new();
    for entry in found.into_iter().flat_map(Assignment::entries) {
        tokens.extend(without_references(entry).split_whitespace().map(str::to_string));
    }
    tokens
}

fn stripped_flag(keys: &[&str], prefix: &str, makefile: &str) -> String {
    let value = first_single_line(keys, makefile);
    strip_prefix([value.as_str()], prefix).concat()
}

/// Extracts every known field from Makefile text; never fails.
pub fn extract_makefile_info(makefile: &str) -> ExtractedMakefileInfo {
    extract_makefile_info_with(makefile, &TargetFamilyTable::default())
}

/// As [`extract_makefile_info`], inferring the target MCU with `families`
/// when the Makefile does not name one.
pub fn extract_makefile_info_with(
    makefile: &str,
    families: &TargetFamilyTable,
) -> ExtractedMakefileInfo {
    let c_sources = list_field(C_SOURCES_KEYS, makefile);
    let mut target_mcu = first_single_line(TARGET_MCU_KEYS, makefile);
    if target_mcu.is_empty() {
        target_mcu = families.infer(&c_sources).unwrap_or_else(|| {
            debug!("could not infer target family from C sources");
            String::new()
        });
    }

    ExtractedMakefileInfo {
        target: first_single_line(TARGET_KEYS, makefile),
        cpu: stripped_flag(CPU_KEYS, "-mcpu=", makefile),
        fpu: stripped_flag(FPU_KEYS, "-mfpu=", makefile),
        float_abi: stripped_flag(FLOAT_ABI_KEYS, "-mfloat-abi=", makefile),
        mcu: first_single_line(MCU_KEYS, makefile),
        ldscript: first_single_line(LDSCRIPT_KEYS, makefile),
        target_mcu,
        optimization: first_single_line(OPTIMIZATION_KEYS, makefile),
        prefix: first_single_line(PREFIX_KEYS, makefile),
        cxx_sources: list_field(CXX_SOURCES_KEYS, makefile),
        asm_sources: list_field(ASM_SOURCES_KEYS, makefile),
        c_defs: strip_prefix(list_field(C_DEFS_KEYS, makefile), "-D"),
        cxx_defs: strip_prefix(list_field(CXX_DEFS_KEYS, makefile), "-D"),
        as_defs: strip_prefix(list_field(AS_DEFS_KEYS, makefile), "-D"),
        c_includes: strip_prefix(list_field(C_INCLUDES_KEYS, makefile), "-I"),
        libs: strip_prefix(extract_libraries(makefile), "-l"),
        libdir: strip_prefix(list_field(LIBDIR_KEYS, makefile), "-L"),
        c_sources,
    }
}
