//! Purpose: Render decoded tokens and fields as pretty JSON with optional ANSI color.
//! Exports: colorize_json.
//! Role: Display layer for terminal output; pure string formatting.
//! Invariants: When color is disabled, output equals serde_json::to_string_pretty.
//! Invariants: ANSI escapes appear only when explicitly enabled.
use serde_json::{Map, Value};

const INDENT: &str = "  ";

#[derive(Clone, Copy)]
enum Role {
    Key,
    Text,
    Number,
    Bool,
    Null,
    Punct,
}

impl Role {
    // 8/16-color codes; bright variants wash out on light themes.
    fn code(self) -> &'static str {
        match self {
            Role::Key => "36",
            Role::Text => "32",
            Role::Number => "33",
            Role::Bool => "35",
            Role::Null | Role::Punct => "39",
        }
    }
}

struct Painter {
    out: String,
    color: bool,
}

pub fn colorize_json(value: &Value, use_color: bool) -> String {
    let mut painter = Painter {
        out: String::new(),
        color: use_color,
    };
    painter.value(value, 0);
    painter.out
}

impl Painter {
    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.paint("null", Role::Null),
            Value::Bool(flag) => self.paint(if *flag { "true" } else { "false" }, Role::Bool),
            Value::Number(num) => self.paint(&num.to_string(), Role::Number),
            Value::String(text) => self.quoted(text, Role::Text),
            Value::Array(items) => self.array(items, depth),
            Value::Object(map) => self.object(map, depth),
        }
    }

    fn array(&mut self, items: &[Value], depth: usize) {
        if items.is_empty() {
            return self.paint("[]", Role::Punct);
        }
        self.paint("[", Role::Punct);
        for (idx, item) in items.iter().enumerate() {
            self.entry_start(idx, depth + 1);
            self.value(item, depth + 1);
        }
        self.close("]", depth);
    }

    fn object(&mut self, map: &Map<String, Value>, depth: usize) {
        if map.is_empty() {
            return self.paint("{}", Role::Punct);
        }
        self.paint("{", Role::Punct);
        for (idx, (key, item)) in map.iter().enumerate() {
            self.entry_start(idx, depth + 1);
            self.quoted(key, Role::Key);
            self.paint(":", Role::Punct);
            self.out.push(' ');
            self.value(item, depth + 1);
        }
        self.close("}", depth);
    }

    // Separator for every entry after the first, then newline and indent.
    fn entry_start(&mut self, idx: usize, depth: usize) {
        if idx > 0 {
            self.paint(",", Role::Punct);
        }
        self.out.push('\n');
        self.indent(depth);
    }

    fn close(&mut self, bracket: &str, depth: usize) {
        self.out.push('\n');
        self.indent(depth);
        self.paint(bracket, Role::Punct);
    }

    fn indent(&mut self, depth: usize) {
        self.out.push_str(&INDENT.repeat(depth));
    }

    fn quoted(&mut self, text: &str, role: Role) {
        let encoded = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
        self.paint(&encoded, role);
    }

    fn paint(&mut self, text: &str, role: Role) {
        if self.color {
            self.out.push_str("\u{1b}[");
            self.out.push_str(role.code());
            self.out.push('m');
            self.out.push_str(text);
            self.out.push_str("\u{1b}[0m");
        } else {
            self.out.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::colorize_json;
    use serde_json::json;

    #[test]
    fn plain_output_matches_serde_pretty() {
        let value = json!({
            "header": {"alg": "PS256", "kid": "k1"},
            "payload": {"valor": {"original": "10.00"}, "infoAdicionais": [], "devedor": {}},
            "flags": [1, true, null, 2.5],
            "signature": "c2ln"
        });
        let plain = colorize_json(&value, false);
        let pretty = serde_json::to_string_pretty(&value).expect("pretty");
        assert_eq!(plain, pretty);
    }

    #[test]
    fn colored_output_wraps_each_token() {
        let value = json!({"k":"v","n":1,"b":true,"z":null});
        let colored = colorize_json(&value, true);
        assert!(colored.contains("\u{1b}[36m\"k\"\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[32m\"v\"\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[33m1\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[35mtrue\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[39mnull\u{1b}[0m"));
    }

    #[test]
    fn scalars_render_without_newlines() {
        assert_eq!(colorize_json(&json!("x"), false), "\"x\"");
        assert_eq!(colorize_json(&json!([]), false), "[]");
    }
}
