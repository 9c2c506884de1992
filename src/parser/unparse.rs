//! Rendering token sequences back to FHIRPath source text

use indexmap::IndexMap;

use crate::analyzer::program::Program;

use super::tokens::{Binding, FunctionArgument, Token, special_name};

/// Units written without quotes in quantity literals
const CALENDAR_UNITS: [&str; 16] = [
    "year",
    "years",
    "month",
    "months",
    "week",
    "weeks",
    "day",
    "days",
    "hour",
    "hours",
    "minute",
    "minutes",
    "second",
    "seconds",
    "millisecond",
    "milliseconds",
];

/// Options controlling how expressions are rendered
#[derive(Debug, Clone)]
pub struct UnparseOptions<'a> {
    /// Name of the binding holding the resource, used by answer tokens
    pub resource_binding: &'a str,
    /// Position of each binding id in evaluation order
    pub bindings_order: Option<&'a IndexMap<String, usize>>,
    /// Render `$this`/`$index` as ordinary variables resolved by the caller
    pub mock_specials: bool,
}

impl Default for UnparseOptions<'_> {
    fn default() -> Self {
        Self {
            resource_binding: "resource",
            bindings_order: None,
            mock_specials: false,
        }
    }
}

/// Variable name standing in for a lambda special when specials are mocked
pub fn mocked_special_name(name: &str) -> String {
    format!("__{}", name.trim_start_matches('$'))
}

/// Render one expression
pub fn unparse_expression(tokens: &[Token], options: &UnparseOptions<'_>) -> String {
    let mut out = String::new();
    let mut chain_start = true;
    for token in tokens {
        write_token(&mut out, token, chain_start, options);
        chain_start = token.is_operator();
    }
    out
}

/// Render bindings as a `defineVariable` chain, followed by `.select(expression)`
pub fn unparse_bindings(
    bindings: &[Binding],
    expression: &[Token],
    options: &UnparseOptions<'_>,
) -> String {
    let mut ordered: Vec<(usize, &Binding)> = bindings.iter().enumerate().collect();
    if let Some(order) = options.bindings_order {
        let fallback = bindings.len();
        ordered.sort_by_key(|(index, binding)| {
            order.get(&binding.id).copied().unwrap_or(fallback + index)
        });
    }

    let body = unparse_expression(expression, options);
    if ordered.is_empty() {
        return body;
    }

    let chain: Vec<String> = ordered
        .into_iter()
        .map(|(_, binding)| {
            format!(
                "defineVariable({}, {})",
                quote(&binding.name),
                unparse_expression(&binding.expression, options)
            )
        })
        .collect();
    let mut out = chain.join(".");
    if !expression.is_empty() {
        out.push_str(&format!(".select({body})"));
    }
    out
}

/// Render a whole program, bindings in dependency order unless `options` says otherwise
pub fn unparse_program(program: &Program, options: &UnparseOptions<'_>) -> String {
    if options.bindings_order.is_some() {
        return unparse_bindings(&program.bindings, &program.expression, options);
    }
    let order = program.bindings_order();
    let options = UnparseOptions {
        bindings_order: Some(&order),
        ..options.clone()
    };
    unparse_bindings(&program.bindings, &program.expression, &options)
}

fn write_token(out: &mut String, token: &Token, chain_start: bool, options: &UnparseOptions<'_>) {
    match token {
        Token::String { value } => out.push_str(&quote(value)),
        Token::Number { value } if value.trim().is_empty() => out.push('0'),
        Token::Number { value } => out.push_str(value.trim()),
        Token::Boolean { value } => out.push_str(if *value { "true" } else { "false" }),
        Token::Date { value } | Token::DateTime { value } => {
            out.push('@');
            out.push_str(value);
        }
        Token::Time { value } => {
            out.push_str("@T");
            out.push_str(value.trim_start_matches('T'));
        }
        Token::Quantity { value } => {
            let number = if value.value.trim().is_empty() {
                "0"
            } else {
                value.value.trim()
            };
            if CALENDAR_UNITS.contains(&value.unit.as_str()) {
                out.push_str(&format!("{number} {}", value.unit));
            } else {
                out.push_str(&format!("{number} {}", quote(&value.unit)));
            }
        }
        Token::Null => out.push_str("{}"),
        Token::Type { value } => out.push_str(&value.element_name()),
        Token::Field { value } => {
            if !chain_start {
                out.push('.');
            }
            out.push_str(&identifier(value));
        }
        Token::Index { value } => out.push_str(&format!("[{value}]")),
        Token::Variable { value, special } => {
            let special = if *special { special_name(value) } else { None };
            match special {
                Some(name) if options.mock_specials => {
                    out.push('%');
                    out.push_str(&mocked_special_name(name));
                }
                Some(name) => out.push_str(name),
                None => {
                    out.push('%');
                    out.push_str(&identifier(value));
                }
            }
        }
        Token::Answer { value } => {
            let path = format!(
                "%{}.repeat(item).where(linkId = {}).answer.value",
                identifier(options.resource_binding),
                quote(value)
            );
            if chain_start {
                out.push_str(&path);
            } else {
                out.push_str(&format!(".select({path})"));
            }
        }
        Token::Operator { value } => out.push_str(&format!(" {} ", value.symbol())),
        Token::Function { value, args } => {
            if !chain_start {
                out.push('.');
            }
            out.push_str(&identifier(value));
            out.push('(');
            let rendered: Vec<String> = args.iter().map(|arg| argument(arg, options)).collect();
            out.push_str(&rendered.join(", "));
            out.push(')');
        }
    }
}

fn argument(arg: &FunctionArgument, options: &UnparseOptions<'_>) -> String {
    if arg.bindings.is_empty() {
        return unparse_expression(&arg.expression, options);
    }
    let local = UnparseOptions {
        bindings_order: None,
        ..options.clone()
    };
    unparse_bindings(&arg.bindings, &arg.expression, &local)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn identifier(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "\\`"))
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}
