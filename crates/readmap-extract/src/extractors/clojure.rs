//! Clojure / ClojureScript / EDN top-level definitions.
//!
//! A small reader turns the source into nested forms (lists, vectors,
//! strings, symbols...) and top-level `ns` and `def*` forms are mapped to
//! symbols. Reader conditionals (`#?(:clj .. :cljs ..)`) contribute the
//! definitions of every branch, tagged with their platform.

use std::ops::Range;

use readmap_core::{FileSymbol, MapError, SymbolKind};

use crate::source::{ContentParser, Extracted, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    List,
    Vector,
    Map,
    Set,
    Symbol,
    Keyword,
    Str,
    ReaderCond,
    Other,
}

#[derive(Debug, Clone)]
struct Form {
    kind: FormKind,
    span: Range<usize>,
    children: Vec<Form>,
    /// `^:private` style metadata attached to this form.
    meta: Vec<Form>,
}

impl Form {
    fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.clone()]
    }

    fn is(&self, kind: FormKind) -> bool {
        self.kind == kind
    }
}

/// Byte-level reader over Clojure source.
///
/// Unbalanced closing delimiters are skipped and unterminated forms end at
/// the end of input, so malformed files still yield their readable prefix.
struct Reader<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

const DELIMITERS: &[u8] = b"()[]{}\";";

impl<'s> Reader<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn read_all(mut self) -> Vec<Form> {
        let mut forms = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => break,
                Some(b')' | b']' | b'}') => self.pos += 1,
                Some(_) => {
                    if let Some(form) = self.read_form() {
                        forms.push(form);
                    }
                }
            }
        }
        forms
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b';' => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                b',' => self.pos += 1,
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'#' if self.peek_at(1) == Some(b'_') => {
                    self.pos += 2;
                    self.skip_trivia();
                    let _ = self.read_form();
                }
                _ => break,
            }
        }
    }

    /// Read one form starting at the current position; `None` at a closing
    /// delimiter or end of input.
    fn read_form(&mut self) -> Option<Form> {
        self.skip_trivia();
        let start = self.pos;
        let b = self.peek()?;
        match b {
            b')' | b']' | b'}' => None,
            b'(' => Some(self.read_coll(start, 1, b')', FormKind::List)),
            b'[' => Some(self.read_coll(start, 1, b']', FormKind::Vector)),
            b'{' => Some(self.read_coll(start, 1, b'}', FormKind::Map)),
            b'"' => Some(self.read_string(start, 1, FormKind::Str)),
            b'\\' => {
                self.pos = (self.pos + 2).min(self.bytes.len());
                self.read_atom_tail();
                Some(self.leaf(FormKind::Other, start))
            }
            b'^' => {
                self.pos += 1;
                let meta = self.read_form();
                let mut target = self.read_form()?;
                target.meta.extend(meta);
                Some(target)
            }
            b'\'' | b'`' | b'@' => {
                self.pos += 1;
                self.prefixed(start)
            }
            b'~' => {
                self.pos += if self.peek_at(1) == Some(b'@') { 2 } else { 1 };
                self.prefixed(start)
            }
            b'#' => self.read_dispatch(start),
            _ => {
                self.read_atom_tail();
                let text = &self.src[start..self.pos];
                let kind = if text.starts_with(':') {
                    FormKind::Keyword
                } else if text.starts_with(|c: char| c.is_ascii_digit()) {
                    FormKind::Other
                } else {
                    FormKind::Symbol
                };
                Some(self.leaf(kind, start))
            }
        }
    }

    fn read_dispatch(&mut self, start: usize) -> Option<Form> {
        match self.peek_at(1) {
            Some(b'{') => Some(self.read_coll(start, 2, b'}', FormKind::Set)),
            Some(b'(') => Some(self.read_coll(start, 2, b')', FormKind::Other)),
            Some(b'"') => Some(self.read_string(start, 2, FormKind::Other)),
            Some(b'?') => {
                let (skip, open) = if self.peek_at(2) == Some(b'@') {
                    (3, self.peek_at(3))
                } else {
                    (2, self.peek_at(2))
                };
                if open == Some(b'(') {
                    Some(self.read_coll(start, skip + 1, b')', FormKind::ReaderCond))
                } else {
                    self.pos += skip;
                    self.prefixed(start)
                }
            }
            Some(b'\'') => {
                self.pos += 2;
                self.prefixed(start)
            }
            _ => {
                // Tagged literal (`#inst "..."`) or namespaced map (`#:a{..}`).
                self.pos += 1;
                self.read_atom_tail();
                self.prefixed(start)
            }
        }
    }

    fn prefixed(&mut self, start: usize) -> Option<Form> {
        let inner = self.read_form();
        let mut form = self.leaf(FormKind::Other, start);
        form.children.extend(inner);
        Some(form)
    }

    fn read_coll(&mut self, start: usize, open_len: usize, close: u8, kind: FormKind) -> Form {
        self.pos += open_len;
        let mut children = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => break,
                Some(b) if b == close => {
                    self.pos += 1;
                    break;
                }
                Some(b')' | b']' | b'}') => self.pos += 1,
                Some(_) => {
                    if let Some(child) = self.read_form() {
                        children.push(child);
                    }
                }
            }
        }
        Form {
            kind,
            span: start..self.pos,
            children,
            meta: Vec::new(),
        }
    }

    fn read_string(&mut self, start: usize, open_len: usize, kind: FormKind) -> Form {
        self.pos += open_len;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos = (self.pos + 1).min(self.bytes.len()),
                b'"' => break,
                _ => {}
            }
        }
        self.leaf(kind, start)
    }

    fn read_atom_tail(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b',' || DELIMITERS.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        // Never split a UTF-8 sequence.
        while self.pos < self.bytes.len() && !self.src.is_char_boundary(self.pos) {
            self.pos += 1;
        }
    }

    fn leaf(&self, kind: FormKind, start: usize) -> Form {
        Form {
            kind,
            span: start..self.pos.min(self.bytes.len()),
            children: Vec::new(),
            meta: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DefForm {
    kind: SymbolKind,
    private: bool,
}

fn def_form(head: &str) -> Option<DefForm> {
    let (kind, private) = match head {
        "defn" | "defmacro" | "defmulti" => (SymbolKind::Function, false),
        "defn-" => (SymbolKind::Function, true),
        "def" | "defonce" => (SymbolKind::Variable, false),
        "defmethod" => (SymbolKind::Method, false),
        "defprotocol" => (SymbolKind::Interface, false),
        "defrecord" | "deftype" => (SymbolKind::Class, false),
        _ => return None,
    };
    Some(DefForm { kind, private })
}

/// Line index for byte offsets.
struct Lines {
    starts: Vec<usize>,
}

impl Lines {
    fn new(src: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn line(&self, offset: usize) -> u32 {
        self.starts.partition_point(|s| *s <= offset) as u32
    }

    fn range(&self, form: &Form) -> (u32, u32) {
        let start = self.line(form.span.start);
        let end = self.line(form.span.end.saturating_sub(1).max(form.span.start));
        (start, end.max(start))
    }
}

/// Top-level `ns` and `def*` forms, including those inside reader
/// conditionals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClojureParser;

impl ContentParser for ClojureParser {
    fn name(&self) -> &'static str {
        "clojure"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let src = source.content.as_str();
        let lines = Lines::new(src);
        let cx = Cx { src, lines: &lines };

        let mut symbols = Vec::new();
        let mut imports = Vec::new();
        for form in Reader::new(src).read_all() {
            match form.kind {
                FormKind::ReaderCond => symbols.extend(cx.reader_cond_defs(&form)),
                FormKind::List => {
                    if let Some((ns, ns_imports)) = cx.namespace(&form) {
                        symbols.push(ns);
                        imports.extend(ns_imports);
                    } else if let Some(def) = cx.definition(&form) {
                        symbols.push(def);
                    }
                }
                _ => {}
            }
        }
        if symbols.is_empty() {
            return Ok(None);
        }
        Ok(Some(Extracted::new(symbols).with_imports(imports)))
    }
}

struct Cx<'a> {
    src: &'a str,
    lines: &'a Lines,
}

impl<'a> Cx<'a> {
    fn text(&self, form: &Form) -> String {
        form.text(self.src).to_string()
    }

    fn string_value(&self, form: &Form) -> String {
        let text = form.text(self.src);
        let inner = text
            .strip_prefix('"')
            .map(|t| t.strip_suffix('"').unwrap_or(t))
            .unwrap_or(text);
        inner.lines().next().unwrap_or("").trim().to_string()
    }

    /// Head symbol of a list, without any namespace qualifier
    /// (`clojure.core/defn` reads as `defn`), plus the remaining forms.
    fn head<'f>(&self, form: &'f Form) -> Option<(&'a str, &'f [Form])> {
        let (first, rest) = form.children.split_first()?;
        if !first.is(FormKind::Symbol) {
            return None;
        }
        let text = first.text(self.src);
        Some((text.rsplit('/').next().unwrap_or(text), rest))
    }

    fn namespace(&self, form: &Form) -> Option<(FileSymbol, Vec<String>)> {
        let (head, rest) = self.head(form)?;
        if head != "ns" {
            return None;
        }
        let name_form = rest.first().filter(|f| f.is(FormKind::Symbol))?;
        let name = self.text(name_form);
        let (start, end) = self.lines.range(form);

        let mut imports = Vec::new();
        for clause in rest.iter().filter(|f| f.is(FormKind::List)) {
            let Some((kw, specs)) = clause.children.split_first() else {
                continue;
            };
            if !matches!(kw.text(self.src), ":require" | ":import") {
                continue;
            }
            for spec in specs {
                if spec.is(FormKind::ReaderCond) {
                    for (platform, branch) in self.branches(spec) {
                        imports.push(format!("{} {platform}", self.text(branch)));
                    }
                } else {
                    imports.push(self.text(spec));
                }
            }
        }

        let mut symbol = FileSymbol::new(name.clone(), SymbolKind::Namespace, start, end)
            .with_signature(format!("(ns {name})"))
            .with_exported(true);
        if let Some(doc) = rest.get(1).filter(|f| f.is(FormKind::Str)) {
            symbol = symbol.with_docstring(self.string_value(doc));
        }
        Some((symbol, imports))
    }

    /// `(keyword, form)` pairs of a reader conditional.
    fn branches<'f>(&self, form: &'f Form) -> Vec<(&'a str, &'f Form)> {
        let mut pairs = Vec::new();
        let mut platform = None;
        for child in &form.children {
            if child.is(FormKind::Keyword) {
                platform = Some(child.text(self.src));
            } else if let Some(p) = platform.take() {
                pairs.push((p, child));
            }
        }
        pairs
    }

    fn reader_cond_defs(&self, form: &Form) -> Vec<FileSymbol> {
        self.branches(form)
            .into_iter()
            .filter(|(_, branch)| branch.is(FormKind::List))
            .filter_map(|(platform, branch)| {
                let mut def = self.definition(branch)?;
                def.modifiers.push(format!("platform:{platform}"));
                Some(def)
            })
            .collect()
    }

    fn definition(&self, form: &Form) -> Option<FileSymbol> {
        let (head, rest) = self.head(form)?;
        let info = def_form(head)?;
        let (start, end) = self.lines.range(form);

        if head == "defmethod" {
            let multi = rest.first().filter(|f| f.is(FormKind::Symbol))?;
            let multi = self.text(multi);
            let dispatch = rest
                .get(1)
                .map_or_else(|| "unknown".to_string(), |f| self.text(f));
            let params = rest
                .iter()
                .find(|f| f.is(FormKind::Vector))
                .map(|f| self.text(f))
                .unwrap_or_default();
            return Some(
                FileSymbol::new(format!("{multi} {dispatch}"), info.kind, start, end)
                    .with_signature(format!("(defmethod {multi} {dispatch} {params})"))
                    .with_exported(true),
            );
        }

        let name_form = rest.first().filter(|f| f.is(FormKind::Symbol))?;
        let name = self.text(name_form);
        let body = &rest[1..];
        let private = info.private || self.has_private_meta(name_form);

        let mut modifiers = Vec::new();
        if private {
            modifiers.push("private".to_string());
        }
        if head == "defmacro" {
            modifiers.push("macro".to_string());
        }

        let signature = match head {
            "defn" | "defn-" | "defmacro" => self.fn_signature(head, &name, body),
            "defmulti" => match body.iter().find(|f| !f.is(FormKind::Str)) {
                Some(dispatch) => format!("(defmulti {name} {})", self.text(dispatch)),
                None => format!("(defmulti {name})"),
            },
            "defrecord" | "deftype" => match body.iter().find(|f| f.is(FormKind::Vector)) {
                Some(fields) => format!("({head} {name} {})", self.text(fields)),
                None => format!("({head} {name})"),
            },
            _ => format!("({head} {name})"),
        };

        let mut symbol = FileSymbol::new(name, info.kind, start, end)
            .with_signature(signature)
            .with_modifiers(modifiers)
            .with_exported(!private);
        if let Some(doc) = self.docstring(body, matches!(head, "def" | "defonce")) {
            symbol = symbol.with_docstring(doc);
        }
        if head == "defprotocol" {
            symbol = symbol.with_children(self.protocol_methods(body));
        }
        Some(symbol)
    }

    fn has_private_meta(&self, form: &Form) -> bool {
        form.meta.iter().any(|meta| {
            meta.text(self.src) == ":private"
                || (meta.is(FormKind::Map)
                    && meta
                        .children
                        .windows(2)
                        .any(|kv| kv[0].text(self.src) == ":private" && kv[1].text(self.src) == "true"))
        })
    }

    /// A string before the first vector or list; for value forms it must
    /// also be followed by the value.
    fn docstring(&self, body: &[Form], value_form: bool) -> Option<String> {
        let idx = body
            .iter()
            .position(|f| f.is(FormKind::Str) || f.is(FormKind::Vector) || f.is(FormKind::List))?;
        if !body[idx].is(FormKind::Str) {
            return None;
        }
        if value_form && idx + 1 >= body.len() {
            return None;
        }
        Some(self.string_value(&body[idx])).filter(|doc| !doc.is_empty())
    }

    fn fn_signature(&self, head: &str, name: &str, body: &[Form]) -> String {
        if let Some(params) = body.iter().find(|f| f.is(FormKind::Vector)) {
            return format!("({head} {name} {})", self.text(params));
        }
        let arities: Vec<String> = body
            .iter()
            .filter(|f| f.is(FormKind::List))
            .filter_map(|arity| arity.children.iter().find(|c| c.is(FormKind::Vector)))
            .map(|params| self.text(params))
            .collect();
        if arities.is_empty() {
            format!("({head} {name})")
        } else {
            format!("({head} {name} {})", arities.join(" "))
        }
    }

    fn protocol_methods(&self, body: &[Form]) -> Vec<FileSymbol> {
        body.iter()
            .filter(|f| f.is(FormKind::List))
            .filter_map(|method| {
                let (first, rest) = method.children.split_first()?;
                if !first.is(FormKind::Symbol) {
                    return None;
                }
                let name = self.text(first);
                let params = rest.iter().position(|f| f.is(FormKind::Vector));
                let signature = match params {
                    Some(i) => format!("({name} {})", self.text(&rest[i])),
                    None => format!("({name})"),
                };
                let (start, end) = self.lines.range(method);
                let mut symbol =
                    FileSymbol::new(name, SymbolKind::Method, start, end).with_signature(signature);
                let doc = rest
                    .iter()
                    .skip(params.map_or(0, |i| i + 1))
                    .find(|f| f.is(FormKind::Str));
                if let Some(doc) = doc {
                    symbol = symbol.with_docstring(self.string_value(doc));
                }
                Some(symbol)
            })
            .collect()
    }
}
