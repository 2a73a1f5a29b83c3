const INDENT: &str = "    ";

/// Line-oriented writer for emitted Python source.
///
/// Tracks the current indentation depth so emitters only deal with the
/// statement text. Blank lines never carry trailing whitespace.
#[derive(Debug, Default, Clone)]
pub struct CodeBuilder {
    buffer: String,
    depth: usize,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts at `depth` levels of indentation, e.g. 1 for class members.
    pub fn at_depth(depth: usize) -> Self {
        Self {
            buffer: String::new(),
            depth,
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            return self.blank();
        }
        for _ in 0..self.depth {
            self.buffer.push_str(INDENT);
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    /// Runs `body` one level deeper than the current depth.
    pub fn nested(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.indent();
        body(self);
        self.dedent()
    }

    /// Appends pre-rendered text, indenting each non-empty line by the
    /// current depth.
    pub fn verbatim(&mut self, text: &str) -> &mut Self {
        for line in text.lines() {
            self.line(line);
        }
        self
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

/// A construct of the emitted module that renders itself into a builder.
pub trait Emit {
    fn emit(&self, out: &mut CodeBuilder);

    fn render(&self) -> String {
        let mut out = CodeBuilder::new();
        self.emit(&mut out);
        out.finish()
    }
}

/// Joins rendered blocks, separating them with exactly one blank line.
pub fn join_blocks<I, S>(blocks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut output = String::new();
    for block in blocks {
        let block = block.as_ref().trim_end_matches('\n');
        if block.is_empty() {
            continue;
        }
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(block);
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lines_are_indented() {
        let mut out = CodeBuilder::new();
        out.line("def f():").nested(|body| {
            body.line("x = 1").blank().line("return x");
        });
        assert_eq!(out.finish(), "def f():\n    x = 1\n\n    return x\n");
    }

    #[test]
    fn verbatim_keeps_relative_indentation() {
        let mut out = CodeBuilder::at_depth(1);
        out.verbatim("def extra(self):\n    return 1\n\ndef more(self):\n    pass");
        assert_eq!(
            out.finish(),
            "    def extra(self):\n        return 1\n\n    def more(self):\n        pass\n"
        );
    }

    #[test]
    fn blocks_are_separated_by_one_blank_line() {
        let joined = join_blocks(["a\n", "", "b\n\n", "c"]);
        assert_eq!(joined, "a\n\nb\n\nc\n");
    }
}
