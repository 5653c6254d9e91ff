use regex::Regex;
use std::path::Path;

/// Maps source file names to an OpenOCD target family (`stm32h7x`, ...).
#[derive(Debug, Clone)]
pub struct FamilyRule {
    pattern: Regex,
    target: String,
}

impl FamilyRule {
    /// `target` may reference capture groups of `pattern` (`${1}`).
    pub fn new(pattern: &str, target: &str) -> Result<Self, regex::Error> {
        Ok(FamilyRule {
            pattern: Regex::new(pattern)?,
            target: target.to_string(),
        })
    }

    fn apply(&self, file_name: &str) -> Option<String> {
        let caps = self.pattern.captures(file_name)?;
        let mut target = String::new();
        caps.expand(&self.target, &mut target);
        Some(target)
    }
}

/// Ordered rule list; the first rule that matches any source wins.
#[derive(Debug, Clone)]
pub struct TargetFamilyTable {
    rules: Vec<FamilyRule>,
}

const DEFAULT_RULES: &[(&str, &str)] = &[
    // L0/L1 的 openocd 配置文件名不带 x
    (r"stm32(l0|l1)", "stm32${1}"),
    (r"stm32mp1", "stm32mp15x"),
    (r"stm32([a-z][a-z0-9])", "stm32${1}x"),
];

impl Default for TargetFamilyTable {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|(pattern, target)| FamilyRule::new(pattern, target).ok())
            .collect();
        TargetFamilyTable { rules }
    }
}

impl TargetFamilyTable {
    /// Adds a rule ahead of the existing ones.
    pub fn prepend(&mut self, rule: FamilyRule) {
        self.rules.insert(0, rule);
    }

    /// Best guess for the family of `sources`, `None` when nothing matches.
    ///
    /// Rules are tried in order against every file name, so a specific rule
    /// always beats a generic one regardless of source order.
    pub fn infer<I, S>(&self, sources: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = sources
            .into_iter()
            .filter_map(|s| {
                Path::new(s.as_ref())
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_ascii_lowercase)
            })
            .collect();
        self.rules
            .iter()
            .find_map(|rule| names.iter().find_map(|name| rule.apply(name)))
    }
}

/// [`TargetFamilyTable::infer`] with the built-in rules.
pub fn infer_target_family<I, S>(sources: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TargetFamilyTable::default().infer(sources)
}
