//! Hierarchical documents: nested key-value trees addressed by dotted paths,
//! carrying per-key leading and inline comments.
//!
//! [`Document`] is the capability the merge engine and the update pipeline
//! need. [`TomlDocument`] implements it on top of `toml_edit`, so comments and
//! formatting of untouched keys survive parse → mutate → persist.
//!
//! # Comment model
//!
//! - **Leading comments** are the lines directly above a key. Each `# text`
//!   line becomes `"text"`; blank lines become `""`.
//! - **Inline comments** are the trailing `# text` on the key's own line.
//!   TOML has a single trailing slot, so several inline lines are joined with
//!   a space when written.
//!
//! Comments live in the key's decor, so unsetting a key drops its comments
//! with it.

use toml_edit::{Decor, DocumentMut, Item, RawString, Table, TableLike};

/// Separator between the segments of a dotted path.
pub const PATH_SEPARATOR: char = '.';

/// A nested key-value document with comment metadata.
pub trait Document: Sized {
    /// A leaf value or a nested subtree.
    type Value: Clone;
    /// Parse failure for the concrete format.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parse a document from its text form.
    fn parse(text: &str) -> Result<Self, Self::Error>;

    /// Value (or subtree) at `path`.
    fn get(&self, path: &str) -> Option<&Self::Value>;

    /// String value at `path`, if the path holds a string.
    fn get_str(&self, path: &str) -> Option<&str>;

    /// Set `path` to `value`, creating intermediate maps as needed.
    fn set(&mut self, path: &str, value: Self::Value);

    /// Set `path` to a string value.
    fn set_str(&mut self, path: &str, value: &str);

    /// Remove the value or subtree at `path` together with its comments.
    /// Returns whether anything was removed.
    fn unset(&mut self, path: &str) -> bool;

    fn has_path(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Whether `path` holds a nested map rather than a leaf value.
    fn is_section(&self, path: &str) -> bool;

    /// Every addressable path in declaration order. With `deep`, nested maps
    /// are descended depth-first and each parent precedes its children;
    /// without it, only top-level keys are returned.
    fn all_paths(&self, deep: bool) -> Vec<String>;

    fn leading_comments(&self, path: &str) -> Vec<String>;

    fn set_leading_comments(&mut self, path: &str, lines: &[String]);

    fn inline_comments(&self, path: &str) -> Vec<String>;

    fn set_inline_comments(&mut self, path: &str, lines: &[String]);

    /// Render the document back to its text form.
    fn persist(&self) -> String;
}

/// A TOML document that keeps comments and formatting through edits.
#[derive(Debug, Clone, Default)]
pub struct TomlDocument {
    doc: DocumentMut,
}

impl TomlDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_mut(&mut self, path: &str) -> Option<&mut Item> {
        let (parent, leaf) = parent_of_mut(self.doc.as_table_mut(), path)?;
        parent.get_mut(leaf)
    }

    /// Whether some ancestor of `path` is an inline table. Comments cannot
    /// be placed inside inline tables without breaking the syntax.
    fn inside_inline_table(&self, path: &str) -> bool {
        path.match_indices(PATH_SEPARATOR)
            .any(|(i, _)| matches!(self.get(&path[..i]), Some(Item::Value(_))))
    }
}

impl std::str::FromStr for TomlDocument {
    type Err = toml_edit::TomlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { doc: s.parse()? })
    }
}

impl Document for TomlDocument {
    type Value = Item;
    type Error = toml_edit::TomlError;

    fn parse(text: &str) -> Result<Self, Self::Error> {
        text.parse()
    }

    fn get(&self, path: &str) -> Option<&Item> {
        let mut segments = path.split(PATH_SEPARATOR);
        let mut current = self.doc.as_table().get(segments.next()?)?;
        for segment in segments {
            current = current.as_table_like()?.get(segment)?;
        }
        Some(current)
    }

    fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    fn is_section(&self, path: &str) -> bool {
        self.get(path).is_some_and(Item::is_table_like)
    }

    fn set(&mut self, path: &str, value: Item) {
        let (parent, leaf) = split_path(path);

        // Navigate to the parent, creating intermediate tables as needed.
        let mut current: &mut dyn TableLike = self.doc.as_table_mut();
        if let Some(parent) = parent {
            for segment in parent.split(PATH_SEPARATOR) {
                if !current.get(segment).is_some_and(Item::is_table_like) {
                    current.insert(segment, Item::Table(intermediate_table()));
                }
                current = match current
                    .get_mut(segment)
                    .and_then(|item| item.as_table_like_mut())
                {
                    Some(table) => table,
                    None => return,
                };
            }
        }

        current.insert(leaf, detach_positions(value));
    }

    fn set_str(&mut self, path: &str, value: &str) {
        let mut item = toml_edit::value(value);
        if let (Some(Item::Value(old)), Some(new)) = (self.get(path), item.as_value_mut()) {
            *new.decor_mut() = old.decor().clone();
        }
        self.set(path, item);
    }

    fn unset(&mut self, path: &str) -> bool {
        match parent_of_mut(self.doc.as_table_mut(), path) {
            Some((parent, leaf)) => parent.remove(leaf).is_some(),
            None => false,
        }
    }

    fn all_paths(&self, deep: bool) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(self.doc.as_table(), "", deep, &mut out);
        out
    }

    fn leading_comments(&self, path: &str) -> Vec<String> {
        let Some((parent, leaf)) = parent_of(self.doc.as_table(), path) else {
            return vec![];
        };
        let Some((key, item)) = parent.get_key_value(leaf) else {
            return vec![];
        };
        let decor = match item {
            Item::Table(table) => table.decor(),
            _ => key.leaf_decor(),
        };
        parse_leading(decor)
    }

    fn set_leading_comments(&mut self, path: &str, lines: &[String]) {
        if self.inside_inline_table(path) {
            return;
        }
        let Some((parent, leaf)) = parent_of_mut(self.doc.as_table_mut(), path) else {
            return;
        };
        let Some((mut key, item)) = parent.get_key_value_mut(leaf) else {
            return;
        };
        let prefix = render_leading(lines);
        match item {
            Item::Table(table) => table.decor_mut().set_prefix(prefix),
            _ => key.leaf_decor_mut().set_prefix(prefix),
        }
    }

    fn inline_comments(&self, path: &str) -> Vec<String> {
        let decor = match self.get(path) {
            Some(Item::Table(table)) => table.decor(),
            Some(Item::Value(value)) => value.decor(),
            _ => return vec![],
        };
        parse_inline(decor)
    }

    fn set_inline_comments(&mut self, path: &str, lines: &[String]) {
        if self.inside_inline_table(path) {
            return;
        }
        let suffix = if lines.is_empty() {
            String::new()
        } else {
            format!(" # {}", lines.join(" "))
        };
        match self.get_mut(path) {
            Some(Item::Table(table)) => table.decor_mut().set_suffix(suffix),
            Some(Item::Value(value)) => value.decor_mut().set_suffix(suffix),
            _ => {}
        }
    }

    fn persist(&self) -> String {
        self.doc.to_string()
    }
}

/// Split `"a.b.c"` into `(Some("a.b"), "c")` and `"a"` into `(None, "a")`.
fn split_path(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once(PATH_SEPARATOR) {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    }
}

fn parent_of<'t, 'p>(root: &'t Table, path: &'p str) -> Option<(&'t dyn TableLike, &'p str)> {
    let (parent, leaf) = split_path(path);
    let mut current: &dyn TableLike = root;
    if let Some(parent) = parent {
        for segment in parent.split(PATH_SEPARATOR) {
            current = current.get(segment)?.as_table_like()?;
        }
    }
    Some((current, leaf))
}

fn parent_of_mut<'t, 'p>(
    root: &'t mut Table,
    path: &'p str,
) -> Option<(&'t mut dyn TableLike, &'p str)> {
    let (parent, leaf) = split_path(path);
    let mut current: &mut dyn TableLike = root;
    if let Some(parent) = parent {
        for segment in parent.split(PATH_SEPARATOR) {
            current = current.get_mut(segment)?.as_table_like_mut()?;
        }
    }
    Some((current, leaf))
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{key}")
    }
}

fn collect_paths(table: &dyn TableLike, prefix: &str, deep: bool, out: &mut Vec<String>) {
    for (key, item) in table.iter() {
        let path = dotted(prefix, key);
        out.push(path.clone());
        if deep && let Some(nested) = item.as_table_like() {
            collect_paths(nested, &path, deep, out);
        }
    }
}

fn intermediate_table() -> Table {
    let mut table = Table::new();
    table.set_implicit(true);
    table.set_position(usize::MAX);
    table
}

/// Move every table in `item` to the end of the rendered document.
///
/// A table carries its position from the document it was parsed from; left
/// alone it would sort in among the target document's own sections.
fn detach_positions(mut item: Item) -> Item {
    match &mut item {
        Item::Table(table) => detach_table(table),
        Item::ArrayOfTables(array) => {
            for table in array.iter_mut() {
                detach_table(table);
            }
        }
        _ => {}
    }
    item
}

fn detach_table(table: &mut Table) {
    table.set_position(usize::MAX);
    for (_, child) in table.iter_mut() {
        match child {
            Item::Table(nested) => detach_table(nested),
            Item::ArrayOfTables(array) => {
                for nested in array.iter_mut() {
                    detach_table(nested);
                }
            }
            _ => {}
        }
    }
}

fn raw(raw: Option<&RawString>) -> &str {
    raw.and_then(RawString::as_str).unwrap_or("")
}

fn parse_leading(decor: &Decor) -> Vec<String> {
    let mut lines: Vec<&str> = raw(decor.prefix()).split('\n').collect();
    // The last segment is the indentation in front of the key itself.
    lines.pop();
    lines
        .into_iter()
        .map(|line| match line.trim().strip_prefix('#') {
            Some(text) => text.strip_prefix(' ').unwrap_or(text).trim_end().to_string(),
            None => String::new(),
        })
        .collect()
}

fn render_leading(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                "\n".to_string()
            } else {
                format!("# {line}\n")
            }
        })
        .collect()
}

fn parse_inline(decor: &Decor) -> Vec<String> {
    match raw(decor.suffix()).split_once('#') {
        Some((_, text)) if !text.trim().is_empty() => vec![text.trim().to_string()],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> TomlDocument {
        TomlDocument::parse(text).unwrap()
    }

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn get_flat_and_nested() {
        let d = doc("port = 8080\n[database]\nurl = \"pg://\"\n");
        assert_eq!(d.get("port").unwrap().as_integer(), Some(8080));
        assert_eq!(d.get_str("database.url"), Some("pg://"));
        assert!(d.get("database").unwrap().is_table());
        assert!(d.is_section("database"));
        assert!(!d.is_section("port"));
        assert!(!d.is_section("missing"));
    }

    #[test]
    fn get_missing_paths() {
        let d = doc("port = 8080\n");
        assert!(d.get("nope").is_none());
        assert!(d.get("port.deeper").is_none());
        assert!(d.get("").is_none());
        assert!(!d.has_path("nope"));
    }

    #[test]
    fn get_through_inline_table() {
        let d = doc("point = { x = 1, y = 2 }\n");
        assert_eq!(d.get("point.y").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn set_overwrites_leaf() {
        let mut d = doc("port = 8080\n");
        d.set("port", toml_edit::value(3000i64));
        assert_eq!(d.get("port").unwrap().as_integer(), Some(3000));
    }

    #[test]
    fn set_creates_intermediate_tables() {
        let mut d = TomlDocument::new();
        d.set("a.b.c", toml_edit::value(true));
        assert_eq!(d.get("a.b.c").unwrap().as_bool(), Some(true));
        assert!(d.has_path("a"));
        assert!(d.has_path("a.b"));

        let reparsed = doc(&d.persist());
        assert_eq!(reparsed.get("a.b.c").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn set_replaces_scalar_in_the_way() {
        let mut d = doc("a = 1\n");
        d.set("a.b", toml_edit::value("x"));
        assert_eq!(d.get_str("a.b"), Some("x"));
    }

    #[test]
    fn set_str_keeps_inline_comment() {
        let mut d = doc("config-version = \"1.0\" # do not edit\n");
        d.set_str("config-version", "2.0");
        assert_eq!(d.get_str("config-version"), Some("2.0"));
        assert!(d.persist().contains("# do not edit"));
    }

    #[test]
    fn unset_removes_subtree() {
        let mut d = doc("keep = 1\n[old]\nx = 1\ny = 2\n");
        assert!(d.unset("old"));
        assert!(!d.has_path("old"));
        assert!(!d.has_path("old.x"));
        assert!(!d.persist().contains("[old]"));
        assert!(!d.unset("old.x"));
    }

    #[test]
    fn unset_removes_leading_comment() {
        let mut d = doc("# about gone\ngone = 1\nkept = 2\n");
        assert!(d.unset("gone"));
        let out = d.persist();
        assert!(!out.contains("about gone"));
        assert!(out.contains("kept = 2"));
    }

    #[test]
    fn all_paths_shallow() {
        let d = doc("a = 1\nb = 2\n[c]\nd = 3\n");
        assert_eq!(d.all_paths(false), strings(&["a", "b", "c"]));
    }

    #[test]
    fn all_paths_deep_is_depth_first() {
        let d = doc("a = 1\n[c]\nd = 3\n[c.e]\nf = 4\n[g]\nh = 5\n");
        assert_eq!(
            d.all_paths(true),
            strings(&["a", "c", "c.d", "c.e", "c.e.f", "g", "g.h"])
        );
    }

    #[test]
    fn all_paths_does_not_descend_arrays() {
        let d = doc("list = [1, 2, 3]\n[[servers]]\nname = \"a\"\n");
        assert_eq!(d.all_paths(true), strings(&["list", "servers"]));
    }

    #[test]
    fn leading_comments_on_key() {
        let d = doc("# The host\n# to bind\nhost = \"x\"\n");
        assert_eq!(
            d.leading_comments("host"),
            strings(&["The host", "to bind"])
        );
    }

    #[test]
    fn leading_comments_keep_blank_lines() {
        let d = doc("a = 1\n\n# Section b\nb = 2\n");
        assert_eq!(d.leading_comments("b"), strings(&["", "Section b"]));
    }

    #[test]
    fn leading_comments_on_table_header() {
        let d = doc("a = 1\n\n# Server settings\n[server]\nport = 1\n");
        let comments = d.leading_comments("server");
        assert!(comments.contains(&"Server settings".to_string()));
    }

    #[test]
    fn leading_comments_missing_path_is_empty() {
        let d = doc("a = 1\n");
        assert!(d.leading_comments("b").is_empty());
        assert!(d.inline_comments("b").is_empty());
    }

    #[test]
    fn inline_comments_on_value() {
        let d = doc("[server]\n# Port to bind\nport = 8080 # default\n");
        assert_eq!(
            d.leading_comments("server.port"),
            strings(&["Port to bind"])
        );
        assert_eq!(d.inline_comments("server.port"), strings(&["default"]));
    }

    #[test]
    fn set_comments_round_trip() {
        let mut d = doc("a = 1\nb = 2\n");
        d.set_leading_comments("b", &strings(&["explains b"]));
        d.set_inline_comments("b", &strings(&["note"]));

        let out = d.persist();
        assert!(out.contains("# explains b\nb = 2 # note"));

        let reparsed = doc(&out);
        assert_eq!(reparsed.leading_comments("b"), strings(&["explains b"]));
        assert_eq!(reparsed.inline_comments("b"), strings(&["note"]));
    }

    #[test]
    fn clearing_inline_comment() {
        let mut d = doc("a = 1 # stale\n");
        d.set_inline_comments("a", &[]);
        assert!(!d.persist().contains("stale"));
    }

    #[test]
    fn comments_inside_inline_tables_are_ignored() {
        let mut d = doc("point = { x = 1 }\n");
        d.set_inline_comments("point.x", &strings(&["would break"]));
        d.set_leading_comments("point.x", &strings(&["would break"]));
        let out = d.persist();
        assert!(!out.contains("would break"));
        assert!(TomlDocument::parse(&out).is_ok());
    }

    #[test]
    fn untouched_comments_survive_edits() {
        let mut d = doc("# header\nport = 8080 # why\n\n[database]\n# pool\npool_size = 5\n");
        d.set("debug", toml_edit::value(true));
        let out = d.persist();
        assert!(out.contains("# header"));
        assert!(out.contains("# why"));
        assert!(out.contains("# pool"));
    }

    #[test]
    fn copied_table_renders_after_existing_sections() {
        let mut disk = doc("[a]\nx = 1\n\n[z]\ny = 2\n");
        let reference = doc("[b]\nk = 1\n");
        disk.set("b", reference.get("b").unwrap().clone());

        let out = disk.persist();
        let z = out.find("[z]").unwrap();
        let b = out.find("[b]").unwrap();
        assert!(b > z, "new section should come last:\n{out}");
        assert_eq!(doc(&out).get("b.k").unwrap().as_integer(), Some(1));
    }

    #[test]
    fn from_str_parses() {
        let d: TomlDocument = "a = 1\n".parse().unwrap();
        assert!(d.has_path("a"));
        assert!("a = ".parse::<TomlDocument>().is_err());
    }
}
