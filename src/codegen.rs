//! Typed accessor generation.
//!
//! [`generate_ns`] and [`generate_dict`] emit Rust source for structs that
//! mirror the flat namespace and the canonical values respectively, so a host
//! can deserialize either view into real types:
//!
//! ```ignore
//! let ns: SettngsNs = serde_json::from_value(serde_json::to_value(&namespace)?)?;
//! ```
//!
//! Field types are a best-effort guess from each setting's action, value
//! type, `nargs` and default. Anything ambiguous becomes
//! `serde_json::Value`. Nothing here feeds back into normalization.

use serde_json::Value;

use crate::definitions::Definitions;
use crate::setting::{Action, Setting, ValueType, sanitize_name};

const VALUE: &str = "Value";
const PATH_BUF: &str = "PathBuf";

const DERIVES: &str = "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]";

/// Rust type of a concrete value, when it has an obvious one.
fn type_of_value(value: &Value) -> String {
    match value {
        Value::Bool(_) => "bool".to_string(),
        Value::Number(n) if n.is_i64() => "i64".to_string(),
        Value::Number(n) if n.is_u64() => "u64".to_string(),
        Value::Number(_) => "f64".to_string(),
        Value::String(_) => "String".to_string(),
        Value::Array(items) => match items.first() {
            Some(first) if !first.is_null() => format!("Vec<{}>", type_of_value(first)),
            _ => format!("Vec<{VALUE}>"),
        },
        Value::Null | Value::Object(_) => VALUE.to_string(),
    }
}

fn type_of_value_type(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::String => "String",
        ValueType::Integer => "i64",
        ValueType::Float => "f64",
        ValueType::Boolean => "bool",
        ValueType::Path => PATH_BUF,
        ValueType::Json => VALUE,
    }
}

/// Best guess at the Rust type holding `setting`'s value. `None` for
/// settings that never hold a value.
pub fn guess_type(setting: &Setting) -> Option<String> {
    let element = || match setting.value_type {
        Some(value_type) => type_of_value_type(value_type).to_string(),
        None => "String".to_string(),
    };

    let guessed = match setting.action {
        Action::Help => return None,
        Action::StoreTrue | Action::StoreFalse => return Some("bool".to_string()),
        Action::BooleanOptional if setting.default.is_null() => "Option<bool>".to_string(),
        Action::BooleanOptional => "bool".to_string(),
        Action::Count if setting.default.is_null() => "Option<i64>".to_string(),
        Action::Count => "i64".to_string(),
        Action::StoreConst if !setting.default.is_null() && setting.const_value.is_null() => {
            type_of_value(&setting.default)
        }
        Action::StoreConst => type_of_value(&setting.const_value),
        Action::AppendConst => format!("Vec<{}>", type_of_value(&setting.const_value)),
        Action::Append if setting.is_list() => format!("Vec<Vec<{}>>", element()),
        Action::Append | Action::Extend => format!("Vec<{}>", element()),
        Action::Store if setting.is_list() => format!("Vec<{}>", element()),
        Action::Store if setting.value_type.is_some() || setting.cmdline => {
            if setting.default.is_null() {
                format!("Option<{}>", element())
            } else {
                element()
            }
        }
        Action::Store => type_of_value(&setting.default),
    };
    Some(guessed)
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

fn field_ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// `Example Group` → `ExampleGroup`. The unnamed group is `Global`.
fn struct_name(group: &str) -> String {
    let name: String = sanitize_name(group)
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Global{name}")
    } else {
        name
    }
}

/// `Example Group` → `example_group`. The unnamed group is `global`.
fn group_field(group: &str) -> String {
    let name = sanitize_name(group).to_lowercase();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("global{name}")
    } else {
        field_ident(&name)
    }
}

/// `use` lines for the types `body` refers to.
fn imports(body: &str) -> String {
    let mut imports = vec!["use serde::{Deserialize, Serialize};".to_string()];
    let uses = |ty: &str| body.contains(&format!(": {ty}")) || body.contains(&format!("<{ty}"));
    if uses(VALUE) {
        imports.push(format!("use serde_json::{VALUE};"));
    }
    if uses(PATH_BUF) {
        imports.push(format!("use std::path::{PATH_BUF};"));
    }
    imports.join("\n") + "\n"
}

fn render_struct(name: &str, attributes: &[&str], fields: &[String]) -> String {
    let mut out = String::new();
    for attribute in attributes {
        out.push_str(attribute);
        out.push('\n');
    }
    if fields.is_empty() {
        out.push_str(&format!("pub struct {name} {{}}\n"));
        return out;
    }
    out.push_str(&format!("pub struct {name} {{\n"));
    for field in fields {
        if field.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("    {field}\n"));
        }
    }
    out.push_str("}\n");
    out
}

/// Source for a struct with one field per setting, named by
/// `internal_name`. Returns `(imports, body)`.
pub fn generate_ns(definitions: &Definitions) -> (String, String) {
    let mut fields: Vec<String> = Vec::new();
    for (_, group) in definitions.iter() {
        let before = fields.len();
        for setting in group.settings() {
            let Some(ty) = guess_type(setting) else {
                continue;
            };
            let field = format!("pub {}: {ty},", field_ident(&setting.internal_name));
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        if fields.len() > before {
            fields.push(String::new());
        }
    }
    // No blank line before the closing brace.
    if fields.last().is_some_and(String::is_empty) {
        fields.pop();
    }

    let body = render_struct(
        "SettngsNs",
        &["#[allow(non_snake_case)]", DERIVES],
        &fields,
    );
    (imports(&body), body)
}

/// Source for one struct per group, with fields named by `dest`, plus a
/// `SettngsDict` struct with one field per group. Returns `(imports, body)`.
pub fn generate_dict(definitions: &Definitions) -> (String, String) {
    let mut body = String::new();
    let mut top_fields = Vec::new();

    for (group_name, group) in definitions.iter() {
        let mut fields: Vec<String> = Vec::new();
        for setting in group.settings() {
            let Some(ty) = guess_type(setting) else {
                continue;
            };
            let field = format!("pub {}: {ty},", field_ident(&setting.dest));
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        let name = struct_name(group_name);
        body.push_str(&render_struct(&name, &[DERIVES], &fields));
        body.push('\n');

        let field = group_field(group_name);
        if field.trim_start_matches("r#") != group_name.as_str() {
            top_fields.push(format!("#[serde(rename = {group_name:?})]"));
        }
        top_fields.push(format!("pub {field}: {name},"));
    }

    body.push_str(&render_struct("SettngsDict", &[DERIVES], &top_fields));
    (imports(&body), body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::definitions_with;
    use crate::setting::Nargs;
    use serde_json::json;

    fn guess(builder: crate::SettingBuilder) -> Option<String> {
        guess_type(&builder.build("g", false).unwrap())
    }

    #[test]
    fn guesses_from_action() {
        use crate::Setting;
        assert_eq!(guess(Setting::builder(["--a"]).action(Action::StoreTrue)).unwrap(), "bool");
        assert_eq!(
            guess(Setting::builder(["--a"]).action(Action::Count).default(0)).unwrap(),
            "i64"
        );
        assert_eq!(
            guess(Setting::builder(["--a"]).action(Action::Append)).unwrap(),
            "Vec<String>"
        );
        assert_eq!(
            guess(Setting::builder(["--a"]).action(Action::StoreConst).const_value(3)).unwrap(),
            "i64"
        );
        assert_eq!(guess(Setting::builder(["--a"]).action(Action::Help)), None);
    }

    #[test]
    fn guesses_from_value_type_and_nargs() {
        use crate::Setting;
        assert_eq!(
            guess(Setting::builder(["--a"]).value_type(ValueType::Integer).default(1)).unwrap(),
            "i64"
        );
        assert_eq!(
            guess(Setting::builder(["--a"]).value_type(ValueType::Path)).unwrap(),
            "Option<PathBuf>"
        );
        assert_eq!(
            guess(Setting::builder(["--a"]).nargs(Nargs::OneOrMore)).unwrap(),
            "Vec<String>"
        );
        assert_eq!(
            guess(Setting::builder(["--a"]).default("x")).unwrap(),
            "String"
        );
    }

    #[test]
    fn file_only_settings_use_their_default() {
        use crate::Setting;
        let file_only = |default: Value| {
            guess(Setting::builder(["--a"]).cmdline(false).default(default)).unwrap()
        };
        assert_eq!(file_only(json!(1.5)), "f64");
        assert_eq!(file_only(json!(["a", "b"])), "Vec<String>");
        assert_eq!(file_only(json!([])), "Vec<Value>");
        assert_eq!(file_only(json!({"k": 1})), "Value");
        assert_eq!(file_only(Value::Null), "Value");
    }

    #[test]
    fn namespace_struct() {
        use crate::Setting;
        let defs = definitions_with(&[
            ("Example Group", Setting::builder(["--hello"]).default("world")),
            (
                "Example Group",
                Setting::builder(["--verbose", "-v"]).action(Action::BooleanOptional).default(false),
            ),
            ("persistent", Setting::builder(["--type"]).cmdline(false).default(json!({}))),
        ]);
        let (imports, body) = generate_ns(&defs);
        assert_eq!(
            imports,
            "use serde::{Deserialize, Serialize};\nuse serde_json::Value;\n"
        );
        assert_eq!(
            body,
            "#[allow(non_snake_case)]\n\
             #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n\
             pub struct SettngsNs {\n    \
             pub Example_Group__hello: String,\n    \
             pub Example_Group__verbose: bool,\n\
             \n    \
             pub persistent__type: Value,\n\
             }\n"
        );
    }

    #[test]
    fn empty_namespace_struct() {
        let (imports, body) = generate_ns(&Definitions::new());
        assert_eq!(imports, "use serde::{Deserialize, Serialize};\n");
        assert!(body.ends_with("pub struct SettngsNs {}\n"));
    }

    #[test]
    fn dict_structs() {
        use crate::Setting;
        let defs = definitions_with(&[
            ("Example Group", Setting::builder(["--hello"]).default("world")),
            ("", Setting::builder(["--type"]).value_type(ValueType::Path).default("/tmp")),
        ]);
        let (imports, body) = generate_dict(&defs);
        assert_eq!(
            imports,
            "use serde::{Deserialize, Serialize};\nuse std::path::PathBuf;\n"
        );
        assert!(body.contains("pub struct ExampleGroup {\n    pub hello: String,\n}\n"));
        assert!(body.contains("pub struct Global {\n    pub r#type: PathBuf,\n}\n"));
        assert!(body.contains(
            "pub struct SettngsDict {\n    \
             #[serde(rename = \"Example Group\")]\n    \
             pub example_group: ExampleGroup,\n    \
             #[serde(rename = \"\")]\n    \
             pub global: Global,\n}\n"
        ));
    }

    #[test]
    fn generated_field_names_match_namespace_keys() {
        use crate::Setting;
        let defs = definitions_with(&[("tst", Setting::builder(["--test"]).default("x"))]);
        let (_, body) = generate_ns(&defs);
        let ns = crate::get_namespace(&crate::defaults(&defs).unwrap(), crate::Scope::all())
            .unwrap()
            .values;
        for key in ns.keys() {
            assert!(body.contains(&format!("pub {key}:")));
        }
    }
}
