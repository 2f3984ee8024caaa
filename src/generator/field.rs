use std::fmt;

use indexmap::IndexMap;

/// Ordered field keyword arguments; later inserts of an existing key keep its position.
pub type Params = IndexMap<String, ParamValue>;

/// Python literal passed as a field keyword argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `True` / `False`.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// String literal.
    Str(String),
    /// Python `None`, for values the catalog did not report.
    Null,
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<Option<u32>> for ParamValue {
    fn from(value: Option<u32>) -> Self {
        value.map_or(ParamValue::Null, ParamValue::from)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(true) => f.write_str("True"),
            ParamValue::Bool(false) => f.write_str("False"),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Str(value) => f.write_str(&python_string_literal(value)),
            ParamValue::Null => f.write_str("None"),
        }
    }
}

/// Quote `value` the way Python's `repr` does for plain strings.
///
/// Control characters, separators other than the ASCII space, common format
/// characters and private-use code points are escaped as `\xhh`, `\uhhhh` or
/// `\Uhhhhhhhh`. Unassigned code points are written as-is.
pub fn python_string_literal(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut literal = String::with_capacity(value.len() + 2);
    literal.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if c == quote => {
                literal.push('\\');
                literal.push(c);
            }
            c if needs_escape(c) => literal.push_str(&escape_code_point(c)),
            c => literal.push(c),
        }
    }
    literal.push(quote);
    literal
}

fn needs_escape(c: char) -> bool {
    c.is_control()
        || matches!(
            u32::from(c),
            0x00A0
                | 0x00AD
                | 0x1680
                | 0x2000..=0x200F
                | 0x2028..=0x202F
                | 0x205F..=0x2064
                | 0x3000
                | 0xE000..=0xF8FF
                | 0xFEFF
                | 0xF0000..=0x10FFFF
        )
}

fn escape_code_point(c: char) -> String {
    match u32::from(c) {
        code @ 0..=0xFF => format!("\\x{code:02x}"),
        code @ 0x100..=0xFFFF => format!("\\u{code:04x}"),
        code => format!("\\U{code:08x}"),
    }
}

/// Class of a generated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Scalar field such as `IntegerField`.
    Plain(String),
    /// Relation to another generated class.
    ForeignKey(RelationTarget),
}

/// Class a foreign key points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTarget {
    /// The class being declared.
    SelfReference,
    /// Another generated class, by class name.
    Model(String),
}

impl FieldKind {
    /// Field class name as written after `models.`.
    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::Plain(name) => name,
            FieldKind::ForeignKey(_) => "ForeignKey",
        }
    }

    /// Text fields store emptiness as `''`, so they never need `null=True`.
    pub fn is_text(&self) -> bool {
        matches!(self, FieldKind::Plain(name) if name == "TextField" || name == "CharField")
    }
}

/// One attribute line of a generated model class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    /// Python attribute name.
    pub attname: String,
    /// Field class.
    pub kind: FieldKind,
    /// Keyword arguments in emission order.
    pub params: Params,
    /// Advisory notes rendered as a trailing comment.
    pub notes: Vec<String>,
}

impl FieldDeclaration {
    /// A declaration with no parameters or notes.
    pub fn new(attname: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            attname: attname.into(),
            kind,
            params: Params::new(),
            notes: Vec::new(),
        }
    }

    /// Set a keyword argument, replacing an earlier value for the same key.
    pub fn set_param(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.params.insert(key.to_string(), value.into());
    }

    /// True for `id = models.AutoField(primary_key=True)`, which the ORM adds on its own.
    pub fn is_implicit_primary_key(&self) -> bool {
        self.attname == "id"
            && self.kind == FieldKind::Plain("AutoField".to_string())
            && self.params.len() == 1
            && self.params.get("primary_key") == Some(&ParamValue::Bool(true))
    }

    /// Render the declaration without indentation.
    pub fn render(&self) -> String {
        let mut args: Vec<String> = Vec::with_capacity(self.params.len() + 1);
        if let FieldKind::ForeignKey(target) = &self.kind {
            args.push(match target {
                RelationTarget::SelfReference => python_string_literal("self"),
                RelationTarget::Model(name) => python_string_literal(name),
            });
        }
        args.extend(self.params.iter().map(|(key, value)| format!("{key}={value}")));

        let mut line = format!(
            "{} = models.{}({})",
            self.attname,
            self.kind.type_name(),
            args.join(", ")
        );
        if !self.notes.is_empty() {
            line.push_str(" # ");
            line.push_str(&self.notes.join(" "));
        }
        line
    }
}

/// One generated model class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    /// Python class name.
    pub class_name: String,
    /// Source table name, recorded verbatim in `Meta.db_table`.
    pub table_name: String,
    /// Emitted fields in column order.
    pub fields: Vec<FieldDeclaration>,
}

impl ClassDeclaration {
    /// Render the class as source lines, including its leading blank separators.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.fields.len() + 6);
        lines.push(String::new());
        lines.push(String::new());
        lines.push(format!("class {}(models.Model):", self.class_name));
        for field in &self.fields {
            lines.push(format!("    {}", field.render()));
        }
        lines.push(String::new());
        lines.push("    class Meta:".to_string());
        lines.push(format!(
            "        db_table = {}",
            python_string_literal(&self.table_name)
        ));
        lines
    }
}
