//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                           | Key Methods          |
// |---------------|-------------------------------------------------------|----------------------|
// | Pattern       | Compiled `*` glob over event names                    | parse, matches       |
//--------------------------------------------------------------------------------------------------

use std::fmt;

/// A wildcard pattern compiled from a subscription key such as `user.*`,
/// `*.created`, `*error*` or `order.*.filled`.
///
/// Each `*` stands for any run of characters, including none. The literal
/// fragments between stars must appear in order: the leading fragment at the
/// start of the name, the trailing fragment at the end, and every middle
/// fragment somewhere in between without overlapping its neighbours.
#[derive(Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    prefix: String,
    middles: Vec<String>,
    suffix: String,
}

impl Pattern {
    /// Compiles `source`. A key with no `*` compiles to a pattern that only
    /// matches itself.
    pub fn parse(source: &str) -> Self {
        let mut fragments: Vec<&str> = source.split('*').collect();

        if fragments.len() == 1 {
            return Self {
                source: source.to_string(),
                prefix: source.to_string(),
                middles: Vec::new(),
                suffix: String::new(),
            };
        }

        // split on a string containing '*' yields at least two fragments
        let suffix = fragments.pop().unwrap_or_default().to_string();
        let prefix = fragments.remove(0).to_string();
        let middles = fragments
            .into_iter()
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            source: source.to_string(),
            prefix,
            middles,
            suffix,
        }
    }

    /// The key this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn is_literal(&self) -> bool {
        !self.source.contains('*')
    }

    /// Returns true when `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        if self.is_literal() {
            return name == self.source;
        }

        if name.len() < self.prefix.len() + self.suffix.len() {
            return false;
        }
        if !name.starts_with(self.prefix.as_str()) || !name.ends_with(self.suffix.as_str()) {
            return false;
        }

        // Leftmost-first placement of each middle fragment is optimal for
        // `*`-only globs: it leaves the most room for the fragments after it.
        let mut rest = &name[self.prefix.len()..name.len() - self.suffix.len()];
        for middle in &self.middles {
            match rest.find(middle.as_str()) {
                Some(at) => rest = &rest[at + middle.len()..],
                None => return false,
            }
        }
        true
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
