//! Layout of the generated provider function.

use std::fmt;

/// Two-space indent used throughout generated files.
pub(crate) const INDENT: &str = "  ";

/// Positional name of a provider parameter: `arg0`, `arg1`, ...
///
/// Kept apart from contract member names, which never name parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgName(pub usize);

impl fmt::Display for ArgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arg{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Parameter {
    pub name: ArgName,
    /// Rendered qualifier annotation, if the binding is qualified.
    pub qualifier: Option<String>,
    pub type_text: String,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{} ", qualifier)?;
        }
        write!(f, "{}: {}", self.name, self.type_text)
    }
}

/// A rendered-but-not-laid-out provider function.
#[derive(Debug, Clone)]
pub(crate) struct ProviderFunction {
    pub name: String,
    pub annotations: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: String,
    /// First expression of the body, e.g. `DaggerFoo.builder()`.
    pub head: String,
    /// Chained calls following the head, e.g. `.build()`.
    pub steps: Vec<String>,
}

fn width_of(line: &str) -> usize {
    line.chars().count()
}

impl ProviderFunction {
    /// Appends the function, indented one level, to `out`.
    ///
    /// The signature stays on one line when it fits in `line_width`,
    /// otherwise each parameter gets its own line. The body head follows
    /// `=` when it fits and moves to a continuation line otherwise.
    pub fn write_to(&self, out: &mut String, line_width: usize) {
        for annotation in &self.annotations {
            push_line(out, &format!("{}{}", INDENT, annotation));
        }

        let parameters: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        let single = format!(
            "{}public fun {}({}): {}",
            INDENT,
            self.name,
            parameters.join(", "),
            self.return_type
        );

        let last = if width_of(&single) + 2 <= line_width {
            single
        } else {
            push_line(out, &format!("{}public fun {}(", INDENT, self.name));
            for parameter in &parameters {
                push_line(out, &format!("{}{}{},", INDENT, INDENT, parameter));
            }
            format!("{}): {}", INDENT, self.return_type)
        };

        let joined = format!("{} = {}", last, self.head);
        if width_of(&joined) <= line_width {
            push_line(out, &joined);
        } else {
            push_line(out, &format!("{} =", last));
            push_line(out, &format!("{0}{0}{0}{1}", INDENT, self.head));
        }

        for step in &self.steps {
            push_line(out, &format!("{0}{0}{1}", INDENT, step));
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(parameters: usize, head: &str) -> ProviderFunction {
        ProviderFunction {
            name: "provideThing".to_string(),
            annotations: vec!["@Provides".to_string()],
            parameters: (0..parameters)
                .map(|i| Parameter {
                    name: ArgName(i),
                    qualifier: None,
                    type_text: "Foo".to_string(),
                })
                .collect(),
            return_type: "Thing".to_string(),
            head: head.to_string(),
            steps: vec![".build()".to_string()],
        }
    }

    #[test]
    fn test_arg_name_display() {
        assert_eq!(ArgName(3).to_string(), "arg3");
    }

    #[test]
    fn test_short_function_stays_on_one_line() {
        let mut out = String::new();
        function(1, "DaggerThing.builder()").write_to(&mut out, 100);
        assert_eq!(
            out,
            "  @Provides\n  public fun provideThing(arg0: Foo): Thing = DaggerThing.builder()\n    .build()\n"
        );
    }

    #[test]
    fn test_head_moves_to_continuation_line() {
        let mut out = String::new();
        function(1, "DaggerThing.builder()").write_to(&mut out, 50);
        assert_eq!(
            out,
            "  @Provides\n  public fun provideThing(arg0: Foo): Thing =\n      DaggerThing.builder()\n    .build()\n"
        );
    }

    #[test]
    fn test_long_signature_puts_parameters_on_own_lines() {
        let mut out = String::new();
        function(2, "X.builder()").write_to(&mut out, 40);
        assert_eq!(
            out,
            "  @Provides\n  public fun provideThing(\n    arg0: Foo,\n    arg1: Foo,\n  ): Thing = X.builder()\n    .build()\n"
        );
    }

    #[test]
    fn test_line_exactly_at_width_fits() {
        let mut out = String::new();
        let f = function(0, "H");
        // "  public fun provideThing(): Thing = H" is 38 columns.
        f.write_to(&mut out, 38);
        assert!(out.contains("  public fun provideThing(): Thing = H\n"));
    }
}
