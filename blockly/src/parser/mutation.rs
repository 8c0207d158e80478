use crate::block::mutation::Mutation;
use crate::parser::attributes::Attributes;

/// Decode a `<mutation>` element's attributes.
///
/// Absent attributes take their defaults. Malformed ones also take their
/// defaults and are returned as problem messages for the caller to report.
pub(crate) fn decode_mutation(attrs: &Attributes) -> (Mutation, Vec<String>) {
    let mut problems = Vec::new();
    let mut flag = |name: &str| match attrs.get(name) {
        None => false,
        Some(raw) => parse_flag(raw).unwrap_or_else(|| {
            problems.push(format!(
                "invalid value '{raw}' for mutation attribute '{name}': expected a boolean"
            ));
            false
        }),
    };
    let at = flag("at");
    let at1 = flag("at1");
    let at2 = flag("at2");
    let statement = flag("statement");

    let mut count = |name: &str| match attrs.get(name) {
        None => 0,
        Some(raw) => parse_count(raw).unwrap_or_else(|| {
            problems.push(format!(
                "invalid value '{raw}' for mutation attribute '{name}': expected a non-negative integer"
            ));
            0
        }),
    };
    let elseif_count = count("elseif");
    let else_count = count("else");
    let items = count("items");

    let mutation = Mutation {
        at,
        at1,
        at2,
        elseif_count,
        else_count,
        items,
        mode: attrs.text("mode"),
        statement,
    };
    (mutation, problems)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}
